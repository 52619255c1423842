//! Subset construction turning an ε-NFA into an equivalent total DFA.
//!
//! The powerset of Q is only a conceptual universe: the row of δ' for a subset
//! is computed when the breadth-first search from the ε-closure of q0 first
//! reaches it, so only reachable subsets are ever materialised. The worst case
//! is still exponential in |Q|; [`MAX_DFA_STATES`] bounds how many subsets the
//! search may discover.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexSet;
use itertools::Itertools;
use log::{debug, trace};

use crate::{
    dfa::Dfa,
    fsm::{AutomatonError, FiniteAutomaton, Symbol},
    nfa::Nfa,
    state::{Named, StateId},
    utils::AutomatonFlags,
};

/// Largest number of subset-states a single conversion may discover.
pub const MAX_DFA_STATES: usize = 1 << 16;

/// A set of NFA states, ordered by `StateId`.
type Subset = BTreeSet<StateId>;

pub fn subset_construction(nfa: &Nfa) -> Result<Dfa, AutomatonError> {
    subset_construction_with_limit(nfa, MAX_DFA_STATES)
}

pub(crate) fn subset_construction_with_limit(
    nfa: &Nfa,
    max_states: usize,
) -> Result<Dfa, AutomatonError> {
    let start = nfa.start_id().ok_or(AutomatonError::NoStartState)?;
    let alphabet = nfa.alphabet().iter().copied().collect_vec();
    let closures: Vec<Subset> = (0..nfa.states().len())
        .map(|state| nfa.closure_of(state).into_iter().collect())
        .collect();

    // step[s][k]: ε-closure of everything the ε-closure of s reaches on symbol k.
    let step: Vec<Vec<Subset>> = closures
        .iter()
        .map(|closure| {
            alphabet
                .iter()
                .map(|symbol| {
                    closure
                        .iter()
                        .filter_map(|member| nfa.targets(*member, Symbol::Char(*symbol)))
                        .flatten()
                        .flat_map(|target| closures[*target].iter().copied())
                        .collect()
                })
                .collect()
        })
        .collect();

    // Breadth-first over δ'; the set doubles as the queue and keeps discovery
    // order. rows[i][k] is the index of δ'(reachable[i], alphabet[k]).
    let mut reachable: IndexSet<Subset> = IndexSet::new();
    reachable.insert(closures[start].clone());
    let mut rows: Vec<Vec<usize>> = Vec::new();
    while rows.len() < reachable.len() {
        let mut row = Vec::with_capacity(alphabet.len());
        for k in 0..alphabet.len() {
            let target: Subset = reachable[rows.len()]
                .iter()
                .flat_map(|member| step[*member][k].iter().copied())
                .collect();
            row.push(reachable.insert_full(target).0);
        }
        if reachable.len() > max_states {
            return Err(AutomatonError::SubsetLimitExceeded {
                states: reachable.len(),
                max: max_states,
            });
        }
        rows.push(row);
    }
    debug!(
        "subset construction: {} subsets reachable from q0 over {} NFA states",
        reachable.len(),
        nfa.states().len()
    );

    let names = reachable
        .iter()
        .map(|subset| canonical_name(nfa, subset))
        .collect_vec();
    let mut named: HashMap<&str, &Subset> = HashMap::new();
    for (subset, name) in reachable.iter().zip(&names) {
        if named.insert(name.as_str(), subset).is_some() {
            return Err(AutomatonError::AmbiguousSubsetName(name.clone()));
        }
    }

    let final_names = nfa
        .final_states()
        .into_iter()
        .map(|state| state.name())
        .collect_vec();
    let by_substring = nfa.get_flags().contains(AutomatonFlags::SUBSTRING_FINALITY);
    let finality = reachable
        .iter()
        .zip(&names)
        .map(|(subset, name)| {
            if by_substring {
                final_names.iter().any(|final_name| name.contains(final_name))
            } else {
                subset.iter().any(|id| nfa.final_ids().contains(id))
            }
        })
        .collect_vec();

    // Final states first, then q0, then the rest in discovery order.
    let mut dfa = Dfa::with_flags(nfa.get_flags());
    for (name, is_final) in names.iter().zip(&finality) {
        if *is_final {
            let id = dfa.push_state(name);
            dfa.mark_final(id);
        }
    }
    let start_id = dfa.push_state(&names[0]);
    dfa.set_start(start_id);
    let ids: Vec<StateId> = names.iter().map(|name| dfa.push_state(name)).collect();

    for (from, row) in rows.iter().enumerate() {
        trace!(
            "{:?} final={} on {:?}",
            names[from],
            finality[from],
            row.iter().map(|to| &names[*to]).collect_vec()
        );
        for (symbol, to) in alphabet.iter().zip(row) {
            dfa.push_transition(ids[from], *symbol, ids[*to]);
        }
    }

    Ok(dfa)
}

/// Member names sorted and concatenated; the empty subset is named "".
fn canonical_name(nfa: &Nfa, subset: &Subset) -> String {
    subset
        .iter()
        .map(|id| nfa.states()[*id].name())
        .sorted()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::compile;

    fn strings_up_to(alphabet: &[char], max_len: usize) -> Vec<String> {
        let mut strings = vec![String::new()];
        let mut frontier = vec![String::new()];
        for _ in 0..max_len {
            frontier = frontier
                .iter()
                .flat_map(|prefix| alphabet.iter().map(move |c| format!("{}{}", prefix, c)))
                .collect();
            strings.extend(frontier.iter().cloned());
        }
        strings
    }

    // Strings over {0, 1} ending in "01".
    fn ends_in_01() -> Nfa {
        ends_in_01_with(AutomatonFlags::default())
    }

    fn ends_in_01_with(flags: AutomatonFlags) -> Nfa {
        let mut nfa = Nfa::with_flags(flags);
        nfa.add_final_state("c").unwrap();
        nfa.add_start_state("a").unwrap();
        nfa.add_state("b").unwrap();
        nfa.add_transition("a", '0', "a").unwrap();
        nfa.add_transition("a", '1', "a").unwrap();
        nfa.add_transition("a", '0', "b").unwrap();
        nfa.add_transition("b", '1', "c").unwrap();
        nfa
    }

    #[test]
    fn test_subset_construction_basic() {
        let dfa = ends_in_01().to_dfa().unwrap();
        let names = dfa.states().iter().map(|s| s.name()).collect_vec();
        assert_eq!(names, vec!["ac", "a", "ab"]);
        assert_eq!(dfa.start_state().map(|s| s.name()), Some("a"));
        assert_eq!(
            dfa.final_states().iter().map(|s| s.name()).collect_vec(),
            vec!["ac"]
        );
        assert_eq!(dfa.transition("ab", '1').map(|s| s.name()), Some("ac"));
        assert!(dfa.is_total());

        assert_eq!(dfa.accepts("01"), Ok(true));
        assert_eq!(dfa.accepts("1101"), Ok(true));
        assert_eq!(dfa.accepts("010"), Ok(false));
        assert_eq!(dfa.accepts(""), Ok(false));
    }

    #[test]
    fn test_language_is_preserved() {
        let nfa = ends_in_01();
        let dfa = nfa.to_dfa().unwrap();
        for input in strings_up_to(&['0', '1'], 6) {
            assert_eq!(dfa.accepts(&input), nfa.accepts(&input), "{:?}", input);
        }
    }

    #[test]
    fn test_start_is_epsilon_closure() {
        let mut nfa = Nfa::new();
        nfa.add_final_state("c").unwrap();
        nfa.add_start_state("a").unwrap();
        nfa.add_state("b").unwrap();
        nfa.add_transition("a", 'e', "b").unwrap();
        nfa.add_transition("b", '1', "c").unwrap();
        nfa.add_transition("c", 'e', "a").unwrap();

        let dfa = nfa.to_dfa().unwrap();
        assert_eq!(dfa.start_state().map(|s| s.name()), Some("ab"));
        assert_eq!(dfa.transition("ab", '1').map(|s| s.name()), Some("abc"));
        assert_eq!(dfa.accepts("111"), Ok(true));
        assert_eq!(dfa.accepts(""), Ok(false));
    }

    #[test]
    fn test_identical_subsets_are_merged() {
        let mut nfa = Nfa::new();
        nfa.add_final_state("q").unwrap();
        nfa.add_start_state("s").unwrap();
        nfa.add_state("p").unwrap();
        nfa.add_transition("s", 'a', "p").unwrap();
        nfa.add_transition("s", 'a', "q").unwrap();
        nfa.add_transition("s", 'b', "q").unwrap();
        nfa.add_transition("s", 'b', "p").unwrap();

        let dfa = nfa.to_dfa().unwrap();
        assert_eq!(dfa.transition("s", 'a').map(|s| s.name()), Some("pq"));
        assert_eq!(dfa.transition("s", 'b').map(|s| s.name()), Some("pq"));
        assert_eq!(
            dfa.states().iter().filter(|s| s.name() == "pq").count(),
            1
        );
    }

    #[test]
    fn test_missing_transitions_lead_to_dead_state() {
        let mut nfa = Nfa::new();
        nfa.add_final_state("b").unwrap();
        nfa.add_start_state("a").unwrap();
        nfa.add_transition("a", '0', "b").unwrap();
        nfa.add_transition("a", '1', "a").unwrap();

        let dfa = nfa.to_dfa().unwrap();
        assert!(dfa.is_total());
        assert_eq!(dfa.transition("b", '0').map(|s| s.name()), Some(""));
        assert_eq!(dfa.transition("b", '1').map(|s| s.name()), Some(""));
        assert_eq!(dfa.transition("", '0').map(|s| s.name()), Some(""));
        assert_eq!(dfa.transition("", '1').map(|s| s.name()), Some(""));
        assert!(!dfa.is_final(""));
        assert_eq!(dfa.accepts("110"), Ok(true));
        assert_eq!(dfa.accepts("1100"), Ok(false));
        assert_eq!(dfa.accepts("001"), Ok(false));
    }

    #[test]
    fn test_unreachable_subsets_are_dropped() {
        let mut nfa = Nfa::new();
        nfa.add_final_state("b").unwrap();
        nfa.add_start_state("a").unwrap();
        nfa.add_state("z").unwrap();
        nfa.add_transition("a", 'x', "b").unwrap();
        nfa.add_transition("b", 'x', "a").unwrap();
        nfa.add_transition("z", 'x', "z").unwrap();

        let dfa = nfa.to_dfa().unwrap();
        let mut names = dfa.states().iter().map(|s| s.name()).collect_vec();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_finality_by_name_substring() {
        let build = |flags| {
            let mut nfa = Nfa::with_flags(flags);
            nfa.add_final_state("1").unwrap();
            nfa.add_start_state("x1").unwrap();
            nfa.add_transition("x1", 'a', "1").unwrap();
            nfa.to_dfa().unwrap()
        };

        let by_membership = build(AutomatonFlags::default());
        assert_eq!(by_membership.accepts(""), Ok(false));
        assert_eq!(by_membership.accepts("a"), Ok(true));

        let by_name = build(AutomatonFlags::default() | AutomatonFlags::SUBSTRING_FINALITY);
        assert_eq!(by_name.accepts(""), Ok(true));
        assert_eq!(by_name.accepts("a"), Ok(true));
    }

    #[test]
    fn test_substring_finality_agrees_on_single_character_names() {
        let membership = ends_in_01().to_dfa().unwrap();
        let substring = ends_in_01_with(AutomatonFlags::SUBSTRING_FINALITY)
            .to_dfa()
            .unwrap();
        for input in strings_up_to(&['0', '1'], 5) {
            assert_eq!(membership.accepts(&input), substring.accepts(&input));
        }
    }

    #[test]
    fn test_ambiguous_canonical_names() {
        let mut nfa = Nfa::new();
        nfa.add_start_state("s").unwrap();
        for name in ["1", "23", "12", "3"] {
            nfa.add_state(name).unwrap();
        }
        nfa.add_transition("s", 'a', "1").unwrap();
        nfa.add_transition("s", 'a', "23").unwrap();
        nfa.add_transition("s", 'b', "12").unwrap();
        nfa.add_transition("s", 'b', "3").unwrap();
        assert_eq!(
            nfa.to_dfa().err(),
            Some(AutomatonError::AmbiguousSubsetName("123".to_string()))
        );
    }

    #[test]
    fn test_discovery_limit() {
        assert_eq!(
            subset_construction_with_limit(&ends_in_01(), 2).err(),
            Some(AutomatonError::SubsetLimitExceeded { states: 3, max: 2 })
        );
        assert!(subset_construction_with_limit(&ends_in_01(), 3).is_ok());
    }

    #[test]
    fn test_large_thompson_nfas_convert() {
        let nfa = compile("abcdfghijkl").unwrap();
        assert_eq!(nfa.states().len(), 22);
        let dfa = nfa.to_dfa().unwrap();
        assert_eq!(dfa.states().len(), 13);
        assert_eq!(dfa.accepts("abcdfghijkl"), Ok(true));
        assert_eq!(dfa.accepts("abcdfghijk"), Ok(false));
        assert_eq!(dfa.accepts("abcdfghijkll"), Ok(false));

        let nfa = compile("(a|b)*(a|b)(a|b)(a|b)").unwrap();
        assert_eq!(nfa.states().len(), 21);
        let dfa = nfa.to_dfa().unwrap();
        assert!(dfa.is_total());
        for input in strings_up_to(&['a', 'b'], 6) {
            assert_eq!(dfa.accepts(&input), Ok(input.len() >= 3), "{:?}", input);
        }
    }

    #[test]
    fn test_empty_alphabet() {
        let mut nfa = Nfa::new();
        nfa.add_final_state("a").unwrap();
        nfa.add_start_state("a").unwrap();
        let dfa = nfa.to_dfa().unwrap();
        assert_eq!(dfa.states().len(), 1);
        assert_eq!(dfa.accepts(""), Ok(true));
        assert_eq!(dfa.accepts("a"), Ok(false));
    }
}
