//! Line-oriented automaton descriptions.
//!
//! ```text
//! b          final states
//! a          start state
//!            remaining states (may be blank)
//! a0a a1b b0a b1b
//! 0101       test strings, one per line; `e` is the empty string
//! e
//! ```
//!
//! Transitions are written `<from><symbol><to>` and therefore only describe
//! single-character state names.

use std::{error::Error, fmt::Display};

use colored::Colorize;
use log::debug;
use nom::{
    bytes::complete::take_while1,
    character::complete::{satisfy, space0, space1},
    combinator::{all_consuming, map},
    multi::separated_list0,
    sequence::{delimited, tuple},
    IResult,
};

use crate::{dfa::Dfa, fsm::AutomatonError, nfa::Nfa, utils::AutomatonFlags};

#[derive(Debug, PartialEq)]
pub enum DescriptionError {
    Syntax { line: usize, remainder: String },
    Automaton(AutomatonError),
}

impl From<AutomatonError> for DescriptionError {
    fn from(err: AutomatonError) -> Self {
        DescriptionError::Automaton(err)
    }
}

impl Display for DescriptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { line, remainder } => write!(
                f,
                "{} cannot parse line {} at {:?}",
                format!("[{:0>3}]", 201).red().bold(),
                line,
                remainder
            ),
            Self::Automaton(err) => write!(f, "{}", err),
        }
    }
}

impl Error for DescriptionError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    finals: Vec<String>,
    start: String,
    states: Vec<String>,
    transitions: Vec<(String, char, String)>,
    inputs: Vec<String>,
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

fn parse_names(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(space0, separated_list0(space1, parse_name), space0)(input)
}

fn parse_transition(input: &str) -> IResult<&str, (char, char, char)> {
    let symbol = || satisfy(|c: char| !c.is_whitespace());
    tuple((symbol(), symbol(), symbol()))(input)
}

fn parse_transitions(input: &str) -> IResult<&str, Vec<(String, char, String)>> {
    delimited(
        space0,
        separated_list0(
            space1,
            map(parse_transition, |(from, symbol, to)| {
                (from.to_string(), symbol, to.to_string())
            }),
        ),
        space0,
    )(input)
}

fn parse_line<'a, O>(
    number: usize,
    line: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> Result<O, DescriptionError> {
    all_consuming(parser)(line)
        .map(|(_, parsed)| parsed)
        .map_err(|err| DescriptionError::Syntax {
            line: number,
            remainder: match err {
                nom::Err::Error(e) | nom::Err::Failure(e) => e.input.to_string(),
                nom::Err::Incomplete(_) => String::new(),
            },
        })
}

fn owned(names: Vec<&str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

impl Description {
    pub fn parse(text: &str) -> Result<Description, DescriptionError> {
        let mut lines = text.lines();
        let finals = owned(parse_line(1, lines.next().unwrap_or(""), parse_names)?);
        let start = match parse_line(2, lines.next().unwrap_or(""), parse_names)?.as_slice() {
            [start] => start.to_string(),
            _ => {
                return Err(DescriptionError::Syntax {
                    line: 2,
                    remainder: String::new(),
                })
            }
        };
        let states = owned(parse_line(3, lines.next().unwrap_or(""), parse_names)?);
        let transitions = parse_line(4, lines.next().unwrap_or(""), parse_transitions)?;
        let inputs = lines
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Description {
            finals,
            start,
            states,
            transitions,
            inputs,
        })
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn build_dfa(&self) -> Result<Dfa, DescriptionError> {
        self.build_dfa_with_flags(AutomatonFlags::default())
    }

    pub fn build_dfa_with_flags(&self, flags: AutomatonFlags) -> Result<Dfa, DescriptionError> {
        let mut dfa = Dfa::with_flags(flags);
        for name in &self.finals {
            dfa.add_final_state(name)?;
        }
        dfa.add_start_state(&self.start)?;
        for name in &self.states {
            dfa.add_state(name)?;
        }
        for (from, symbol, to) in &self.transitions {
            dfa.add_transition(from, *symbol, to)?;
        }
        debug!("described DFA:\n{}", dfa);
        Ok(dfa)
    }

    /// Builds an NFA; a transition on `e` becomes an ε-edge.
    pub fn build_nfa(&self) -> Result<Nfa, DescriptionError> {
        self.build_nfa_with_flags(AutomatonFlags::default())
    }

    pub fn build_nfa_with_flags(&self, flags: AutomatonFlags) -> Result<Nfa, DescriptionError> {
        let mut nfa = Nfa::with_flags(flags);
        for name in &self.finals {
            nfa.add_final_state(name)?;
        }
        nfa.add_start_state(&self.start)?;
        for name in &self.states {
            nfa.add_state(name)?;
        }
        for (from, symbol, to) in &self.transitions {
            nfa.add_transition(from, *symbol, to)?;
        }
        debug!("described NFA:\n{}", nfa);
        Ok(nfa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::FiniteAutomaton;

    const ENDS_IN_ONE: &str = "b\na\n\na0a a1b b0a b1b\n0101\n10\ne\n";

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names(" a  bc d "), Ok(("", vec!["a", "bc", "d"])));
        assert_eq!(parse_names(""), Ok(("", vec![])));
    }

    #[test]
    fn test_parse_transitions() {
        assert_eq!(
            parse_transitions("a0b  b1a"),
            Ok((
                "",
                vec![
                    ("a".to_string(), '0', "b".to_string()),
                    ("b".to_string(), '1', "a".to_string())
                ]
            ))
        );
    }

    #[test]
    fn test_parse_description() {
        let description = Description::parse(ENDS_IN_ONE).unwrap();
        assert_eq!(description.inputs(), &["0101", "10", "e"]);
        let dfa = description.build_dfa().unwrap();
        let results = description
            .inputs()
            .iter()
            .map(|input| dfa.accepts(input))
            .collect::<Vec<_>>();
        assert_eq!(results, vec![Ok(true), Ok(false), Ok(false)]);
    }

    #[test]
    fn test_build_nfa_with_epsilon_edges() {
        let description = Description::parse("c\na\nb\naeb a0a b1c\n").unwrap();
        let nfa = description.build_nfa().unwrap();
        assert!(!nfa.alphabet().contains(&'e'));
        assert_eq!(nfa.accepts("1"), Ok(true));
        assert_eq!(nfa.accepts("001"), Ok(true));
        assert_eq!(nfa.accepts("10"), Ok(false));
        let dfa = nfa.to_dfa().unwrap();
        assert_eq!(dfa.accepts("001"), Ok(true));
        assert_eq!(dfa.start_state().map(|s| s.to_string()), Some("ab".to_string()));
    }

    #[test]
    fn test_described_nfa_and_its_dfa_agree_on_inputs() {
        let description = Description::parse("a\na\n\naea a0a\ne\n0\n00e0\n1\n").unwrap();
        let nfa = description.build_nfa().unwrap();
        let dfa = nfa.to_dfa().unwrap();
        for input in description.inputs() {
            assert_eq!(nfa.accepts(input), dfa.accepts(input), "{:?}", input);
        }
        assert_eq!(nfa.accepts("e"), Ok(true));
        assert_eq!(nfa.accepts("1"), Ok(false));
    }

    #[test]
    fn test_malformed_transition() {
        assert_eq!(
            Description::parse("b\na\n\na0bc\n"),
            Err(DescriptionError::Syntax {
                line: 4,
                remainder: "c".to_string()
            })
        );
    }

    #[test]
    fn test_missing_start_state() {
        assert!(matches!(
            Description::parse("b\n"),
            Err(DescriptionError::Syntax { line: 2, .. })
        ));
        assert!(matches!(
            Description::parse("b\na c\n"),
            Err(DescriptionError::Syntax { line: 2, .. })
        ));
    }

    #[test]
    fn test_undefined_state_in_transition() {
        let description = Description::parse("b\na\n\na0z\n").unwrap();
        assert_eq!(
            description.build_dfa().err(),
            Some(DescriptionError::Automaton(AutomatonError::UnknownState(
                "z".to_string()
            )))
        );
    }
}
