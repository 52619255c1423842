use std::{collections::HashMap, fmt::Display};

use indexmap::IndexSet;
use log::trace;

use crate::{
    fsm::{write_set, AutomatonError, FiniteAutomaton, EPSILON},
    state::{DfaState, Named, StateId},
    utils::AutomatonFlags,
};

/// A deterministic finite automaton (Q, Σ, δ, q0, F).
///
/// Built incrementally from an ordered sequence of add-state/add-transition
/// calls. Q, Σ and F keep insertion order, which is also the order of the
/// textual 5-tuple produced by `Display`.
#[derive(Debug, Clone, Default)]
pub struct Dfa {
    states: IndexSet<DfaState>,
    alphabet: IndexSet<char>,
    transitions: HashMap<(StateId, char), StateId>,
    start: Option<StateId>,
    final_states: IndexSet<StateId>,
    flags: AutomatonFlags,
}

impl Dfa {
    pub fn new() -> Dfa {
        Dfa::with_flags(AutomatonFlags::default())
    }

    pub fn with_flags(flags: AutomatonFlags) -> Dfa {
        Dfa {
            states: IndexSet::new(),
            alphabet: IndexSet::new(),
            transitions: HashMap::new(),
            start: None,
            final_states: IndexSet::new(),
            flags,
        }
    }

    pub fn get_flags(&self) -> AutomatonFlags {
        self.flags
    }

    /// Makes `name` the start state, reusing an existing state of that name
    /// (typically one added as final). A second call replaces q0.
    pub fn add_start_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        check_name(name)?;
        let id = self.push_state(name);
        self.start = Some(id);
        Ok(())
    }

    pub fn add_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        check_name(name)?;
        self.push_state(name);
        Ok(())
    }

    pub fn add_final_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        check_name(name)?;
        let id = self.push_state(name);
        self.mark_final(id);
        Ok(())
    }

    /// Records δ(from, symbol) = to. Both states must already be in Q; a later
    /// transition on the same (state, symbol) pair replaces the earlier one.
    pub fn add_transition(
        &mut self,
        from: &str,
        symbol: char,
        to: &str,
    ) -> Result<(), AutomatonError> {
        let from = self.state_id(from)?;
        let to = self.state_id(to)?;
        self.push_transition(from, symbol, to);
        Ok(())
    }

    pub fn transition(&self, from: &str, symbol: char) -> Option<&DfaState> {
        let from = self.states.get_index_of(from)?;
        self.transitions
            .get(&(from, symbol))
            .and_then(|to| self.states.get_index(*to))
    }

    pub fn is_final(&self, name: &str) -> bool {
        match self.states.get_index_of(name) {
            Some(id) => self.final_states.contains(&id),
            None => false,
        }
    }

    /// Whether every state has exactly one successor for every symbol of Σ.
    pub fn is_total(&self) -> bool {
        (0..self.states.len()).all(|state| {
            self.alphabet
                .iter()
                .all(|symbol| self.transitions.contains_key(&(state, *symbol)))
        })
    }

    pub(crate) fn push_state(&mut self, name: &str) -> StateId {
        match self.states.get_index_of(name) {
            Some(id) => id,
            None => self.states.insert_full(DfaState::new(name)).0,
        }
    }

    pub(crate) fn mark_final(&mut self, id: StateId) {
        self.final_states.insert(id);
    }

    pub(crate) fn set_start(&mut self, id: StateId) {
        self.start = Some(id);
    }

    pub(crate) fn push_transition(&mut self, from: StateId, symbol: char, to: StateId) {
        self.transitions.insert((from, symbol), to);
        self.alphabet.insert(symbol);
    }

    fn state_id(&self, name: &str) -> Result<StateId, AutomatonError> {
        self.states
            .get_index_of(name)
            .ok_or_else(|| AutomatonError::UnknownState(name.to_string()))
    }
}

fn check_name(name: &str) -> Result<(), AutomatonError> {
    if name.is_empty() {
        Err(AutomatonError::EmptyStateName)
    } else {
        Ok(())
    }
}

impl FiniteAutomaton for Dfa {
    type State = DfaState;

    fn states(&self) -> &IndexSet<DfaState> {
        &self.states
    }

    fn final_states(&self) -> Vec<&DfaState> {
        self.final_states
            .iter()
            .map(|id| &self.states[*id])
            .collect()
    }

    fn start_state(&self) -> Option<&DfaState> {
        self.start.map(|id| &self.states[id])
    }

    fn alphabet(&self) -> &IndexSet<char> {
        &self.alphabet
    }

    /// Runs the input from q0. A symbol outside Σ rejects, except the `'e'`
    /// placeholder under [`AutomatonFlags::EPSILON_SHORTCUT`], which ends the
    /// run early. A missing transition for a symbol of Σ is an error.
    fn accepts(&self, input: &str) -> Result<bool, AutomatonError> {
        let mut current = self.start.ok_or(AutomatonError::NoStartState)?;
        for symbol in input.chars() {
            if self.alphabet.contains(&symbol) {
                current = *self.transitions.get(&(current, symbol)).ok_or_else(|| {
                    AutomatonError::MissingTransition {
                        state: self.states[current].name().to_string(),
                        symbol,
                    }
                })?;
            } else if symbol == EPSILON && self.flags.contains(AutomatonFlags::EPSILON_SHORTCUT) {
                trace!("'{}' ends the run in {}", EPSILON, self.states[current]);
                break;
            } else {
                return Ok(false);
            }
        }
        Ok(self.final_states.contains(&current))
    }
}

impl Display for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_set(f, "Q", self.states.iter())?;
        write_set(f, "Sigma", self.alphabet.iter())?;
        writeln!(f, "delta =")?;
        write!(f, "\t\t")?;
        for symbol in &self.alphabet {
            write!(f, "{}\t", symbol)?;
        }
        writeln!(f)?;
        for (id, state) in self.states.iter().enumerate() {
            write!(f, "\t{}", state)?;
            for symbol in &self.alphabet {
                match self.transitions.get(&(id, *symbol)) {
                    Some(to) => write!(f, "\t{}", self.states[*to])?,
                    None => write!(f, "\t-")?,
                }
            }
            writeln!(f)?;
        }
        match self.start_state() {
            Some(start) => writeln!(f, "q0 = {}", start)?,
            None => writeln!(f, "q0 = -")?,
        }
        write_set(f, "F", self.final_states().into_iter())
    }
}
