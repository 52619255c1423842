pub mod description;
pub mod dfa;
pub mod fsm;
pub mod nfa;
pub mod parser;
pub mod state;
pub mod subset;
pub mod utils;

pub use description::{Description, DescriptionError};
pub use dfa::Dfa;
pub use fsm::{AutomatonError, FiniteAutomaton, Symbol};
pub use nfa::Nfa;
pub use parser::{compile, RegexError};
pub use utils::AutomatonFlags;
