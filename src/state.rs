use std::{
    borrow::Borrow,
    fmt::Display,
    hash::{Hash, Hasher},
};

/// Position of a state in the insertion-ordered state set of its automaton.
pub type StateId = usize;

/// Anything identified by a state name.
pub trait Named {
    fn name(&self) -> &str;
}

/// A vertex of a [`crate::dfa::Dfa`]. Finality and transitions live in the automaton.
#[derive(Debug, Clone)]
pub struct DfaState {
    name: String,
}

impl DfaState {
    pub fn new(name: &str) -> Self {
        DfaState {
            name: name.to_string(),
        }
    }
}

/// A vertex of a [`crate::nfa::Nfa`].
///
/// `is_final` mirrors membership in the automaton's final set; the set stays
/// authoritative.
#[derive(Debug, Clone)]
pub struct NfaState {
    name: String,
    is_final: bool,
}

impl NfaState {
    pub fn new(name: &str) -> Self {
        NfaState {
            name: name.to_string(),
            is_final: false,
        }
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub(crate) fn set_final(&mut self) {
        self.is_final = true;
    }
}

// Both state kinds are compared and hashed by name only, so an `IndexSet` of
// states can be probed with a plain `&str`.
macro_rules! impl_named_state {
    ($state:ty) => {
        impl Named for $state {
            fn name(&self) -> &str {
                &self.name
            }
        }

        impl PartialEq for $state {
            fn eq(&self, other: &Self) -> bool {
                self.name == other.name
            }
        }

        impl Eq for $state {}

        impl Hash for $state {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.name.hash(state)
            }
        }

        impl Borrow<str> for $state {
            fn borrow(&self) -> &str {
                &self.name
            }
        }

        impl Display for $state {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.name)
            }
        }
    };
}

impl_named_state!(DfaState);
impl_named_state!(NfaState);
