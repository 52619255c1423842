use std::{
    collections::{HashMap, VecDeque},
    fmt::Display,
};

use indexmap::IndexSet;
use itertools::Itertools;
use log::trace;

use crate::{
    dfa::Dfa,
    fsm::{write_set, AutomatonError, FiniteAutomaton, Symbol, EPSILON},
    state::{Named, NfaState, StateId},
    subset::subset_construction,
    utils::AutomatonFlags,
};

/// A non-deterministic finite automaton with ε-transitions.
///
/// δ maps (state, symbol) to a set of states; ε-edges are stored under
/// [`Symbol::Epsilon`] and never enter Σ.
#[derive(Debug, Clone, Default)]
pub struct Nfa {
    states: IndexSet<NfaState>,
    alphabet: IndexSet<char>,
    transitions: HashMap<(StateId, Symbol), IndexSet<StateId>>,
    start: Option<StateId>,
    final_states: IndexSet<StateId>,
    flags: AutomatonFlags,
}

impl Nfa {
    pub fn new() -> Nfa {
        Nfa::with_flags(AutomatonFlags::default())
    }

    pub fn with_flags(flags: AutomatonFlags) -> Nfa {
        Nfa {
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

    pub fn add_start_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        let id = self.push_state(name)?;
        self.start = Some(id);
        Ok(())
    }

    pub fn add_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        self.push_state(name)?;
        Ok(())
    }

    pub fn add_final_state(&mut self, name: &str) -> Result<(), AutomatonError> {
        let id = self.push_state(name)?;
        self.final_states.insert(id);
        // Equal by name, so `replace` keeps the state at `id`.
        let mut state = self.states[id].clone();
        state.set_final();
        self.states.replace(state);
        Ok(())
    }

    /// Records `to` as a successor of `from` on `symbol`; the `'e'`
    /// placeholder records an ε-edge.
    pub fn add_transition(
        &mut self,
        from: &str,
        symbol: char,
        to: &str,
    ) -> Result<(), AutomatonError> {
        self.add_symbol_transition(from, Symbol::from(symbol), to)
    }

    pub fn add_epsilon_transition(&mut self, from: &str, to: &str) -> Result<(), AutomatonError> {
        self.add_symbol_transition(from, Symbol::Epsilon, to)
    }

    pub(crate) fn add_symbol_transition(
        &mut self,
        from: &str,
        symbol: Symbol,
        to: &str,
    ) -> Result<(), AutomatonError> {
        let from = self.state_id(from)?;
        let to = self.state_id(to)?;
        self.transitions.entry((from, symbol)).or_default().insert(to);
        if let Symbol::Char(c) = symbol {
            self.alphabet.insert(c);
        }
        Ok(())
    }

    /// The states reachable from `from` on `symbol` (`'e'` for ε) in one step.
    pub fn get_to_state(
        &self,
        from: &str,
        symbol: char,
    ) -> Result<IndexSet<&NfaState>, AutomatonError> {
        let from = self.state_id(from)?;
        Ok(self
            .targets(from, Symbol::from(symbol))
            .map(|targets| targets.iter().map(|id| &self.states[*id]).collect())
            .unwrap_or_default())
    }

    /// All states reachable from `state` through zero or more ε-edges,
    /// `state` included, in breadth-first discovery order.
    pub fn e_closure(&self, state: &str) -> Result<IndexSet<&NfaState>, AutomatonError> {
        let id = self.state_id(state)?;
        Ok(self
            .closure_of(id)
            .into_iter()
            .map(|id| &self.states[id])
            .collect())
    }

    pub fn to_dfa(&self) -> Result<Dfa, AutomatonError> {
        subset_construction(self)
    }

    pub(crate) fn closure_of(&self, state: StateId) -> IndexSet<StateId> {
        let mut closure = IndexSet::new();
        let mut queue = VecDeque::from([state]);
        closure.insert(state);
        while let Some(current) = queue.pop_front() {
            if let Some(targets) = self.targets(current, Symbol::Epsilon) {
                for target in targets {
                    if closure.insert(*target) {
                        queue.push_back(*target);
                    }
                }
            }
        }
        closure
    }

    pub(crate) fn targets(&self, from: StateId, symbol: Symbol) -> Option<&IndexSet<StateId>> {
        self.transitions.get(&(from, symbol))
    }

    pub(crate) fn start_id(&self) -> Option<StateId> {
        self.start
    }

    pub(crate) fn final_ids(&self) -> &IndexSet<StateId> {
        &self.final_states
    }

    /// Copies every transition of `other` into `self`, resolving states by
    /// name. The states must have been copied first.
    pub(crate) fn absorb_transitions(&mut self, other: &Nfa) -> Result<(), AutomatonError> {
        let symbols = other
            .alphabet
            .iter()
            .map(|c| Symbol::Char(*c))
            .chain(std::iter::once(Symbol::Epsilon))
            .collect_vec();
        for (id, state) in other.states.iter().enumerate() {
            for symbol in &symbols {
                if let Some(targets) = other.targets(id, *symbol) {
                    for target in targets {
                        self.add_symbol_transition(
                            state.name(),
                            *symbol,
                            other.states[*target].name(),
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn push_state(&mut self, name: &str) -> Result<StateId, AutomatonError> {
        if name.is_empty() {
            return Err(AutomatonError::EmptyStateName);
        }
        Ok(match self.states.get_index_of(name) {
            Some(id) => id,
            None => self.states.insert_full(NfaState::new(name)).0,
        })
    }

    fn state_id(&self, name: &str) -> Result<StateId, AutomatonError> {
        self.states
            .get_index_of(name)
            .ok_or_else(|| AutomatonError::UnknownState(name.to_string()))
    }

    fn has_epsilon_transitions(&self) -> bool {
        self.transitions.keys().any(|(_, symbol)| symbol.is_epsilon())
    }
}

impl FiniteAutomaton for Nfa {
    type State = NfaState;

    fn states(&self) -> &IndexSet<NfaState> {
        &self.states
    }

    fn final_states(&self) -> Vec<&NfaState> {
        self.final_states
            .iter()
            .map(|id| &self.states[*id])
            .collect()
    }

    fn start_state(&self) -> Option<&NfaState> {
        self.start.map(|id| &self.states[id])
    }

    fn alphabet(&self) -> &IndexSet<char> {
        &self.alphabet
    }

    /// Simulates every branch at once: the current set is ε-closed after each
    /// step and the input is accepted if it ends holding a final state. An
    /// `'e'` outside Σ under [`AutomatonFlags::EPSILON_SHORTCUT`] ends the run
    /// early, as in [`Dfa`] simulation.
    fn accepts(&self, input: &str) -> Result<bool, AutomatonError> {
        let start = self.start.ok_or(AutomatonError::NoStartState)?;
        let mut current = self.closure_of(start);
        for symbol in input.chars() {
            if !self.alphabet.contains(&symbol) {
                if symbol == EPSILON && self.flags.contains(AutomatonFlags::EPSILON_SHORTCUT) {
                    trace!("'{}' ends the run in {:?}", EPSILON, current);
                    break;
                }
                return Ok(false);
            }
            let mut next = IndexSet::new();
            for state in &current {
                if let Some(targets) = self.targets(*state, Symbol::Char(symbol)) {
                    for target in targets {
                        if !next.contains(target) {
                            next.extend(self.closure_of(*target));
                        }
                    }
                }
            }
            if next.is_empty() {
                return Ok(false);
            }
            current = next;
        }
        Ok(current.iter().any(|state| self.final_states.contains(state)))
    }
}

impl Display for Nfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut symbols = self.alphabet.iter().map(|c| Symbol::Char(*c)).collect_vec();
        if self.has_epsilon_transitions() {
            symbols.push(Symbol::Epsilon);
        }

        write_set(f, "Q", self.states.iter())?;
        write_set(f, "Sigma", self.alphabet.iter())?;
        writeln!(f, "delta =")?;
        write!(f, "\t\t")?;
        for symbol in &symbols {
            write!(f, "{}\t", symbol)?;
        }
        writeln!(f)?;
        for (id, state) in self.states.iter().enumerate() {
            write!(f, "\t{}", state)?;
            for symbol in &symbols {
                let targets = self
                    .targets(id, *symbol)
                    .map(|targets| targets.iter().map(|t| self.states[*t].name()).join(","))
                    .unwrap_or_default();
                write!(f, "\t{{{}}}", targets)?;
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
