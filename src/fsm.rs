use std::{error::Error, fmt::Display};

use colored::Colorize;
use indexmap::IndexSet;

use crate::state::Named;

/// Placeholder used by textual automaton descriptions (and regex source) for ε.
pub const EPSILON: char = 'e';

/// An edge label: an alphabet character or the ε pseudo-symbol.
#[derive(Hash, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Symbol {
    Epsilon,
    Char(char),
}

impl Symbol {
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Symbol::Epsilon)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        if c == EPSILON {
            Symbol::Epsilon
        } else {
            Symbol::Char(c)
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbol::Epsilon => write!(f, "{}", EPSILON),
            Symbol::Char(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AutomatonError {
    UnknownState(String),
    EmptyStateName,
    NoStartState,
    MissingTransition { state: String, symbol: char },
    SubsetLimitExceeded { states: usize, max: usize },
    AmbiguousSubsetName(String),
}

impl Display for AutomatonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownState(name) => write!(
                f,
                "{} state {} is not defined",
                format!("[{:0>3}]", 1).red().bold(),
                name.yellow()
            ),
            Self::EmptyStateName => write!(
                f,
                "{} the empty name is reserved for the dead state",
                format!("[{:0>3}]", 2).red().bold()
            ),
            Self::NoStartState => write!(
                f,
                "{} the automaton has no start state",
                format!("[{:0>3}]", 3).red().bold()
            ),
            Self::MissingTransition { state, symbol } => write!(
                f,
                "{} no transition from {} on {:?}: the transition function is not total",
                format!("[{:0>3}]", 4).red().bold(),
                state.yellow(),
                symbol
            ),
            Self::SubsetLimitExceeded { states, max } => write!(
                f,
                "{} subset construction discovered {} states, over the limit of {}",
                format!("[{:0>3}]", 5).red().bold(),
                states,
                max
            ),
            Self::AmbiguousSubsetName(name) => write!(
                f,
                "{} distinct state subsets share the canonical name {:?}",
                format!("[{:0>3}]", 6).red().bold(),
                name
            ),
        }
    }
}

impl Error for AutomatonError {}

/// The query surface shared by both automaton kinds.
pub trait FiniteAutomaton {
    type State: Named;

    fn states(&self) -> &IndexSet<Self::State>;
    fn final_states(&self) -> Vec<&Self::State>;
    fn start_state(&self) -> Option<&Self::State>;
    fn alphabet(&self) -> &IndexSet<char>;
    fn accepts(&self, input: &str) -> Result<bool, AutomatonError>;
}

pub(crate) fn write_set<T: Display>(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    items: impl Iterator<Item = T>,
) -> std::fmt::Result {
    write!(f, "{} = {{ ", label)?;
    for item in items {
        write!(f, "{} ", item)?;
    }
    writeln!(f, "}}")
}
