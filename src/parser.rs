use std::{error::Error, fmt::Display, str::Chars};

use colored::Colorize;
use itertools::{peek_nth, Itertools, PeekNth};
use log::{debug, trace};

use crate::{
    fsm::{AutomatonError, FiniteAutomaton, Symbol},
    nfa::Nfa,
    state::Named,
};

static OPERATORS: &[char] = &['(', ')', '|', '*'];

/// Deepest parenthesis nesting a pattern may use.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, PartialEq)]
pub enum RegexError {
    UnexpectedToken {
        consumed: Box<String>,
        remainder: Box<String>,
        expected: char,
    },
    UnexpectedEof {
        consumed: Box<String>,
        expected: Option<char>,
    },
    DanglingOperator {
        consumed: Box<String>,
        remainder: Box<String>,
        found: char,
    },
    SuffixRemaining {
        consumed: Box<String>,
        remainder: Box<String>,
    },
    NestingTooDeep {
        consumed: Box<String>,
        remainder: Box<String>,
        max: usize,
    },
    Automaton(AutomatonError),
}

impl From<AutomatonError> for RegexError {
    fn from(err: AutomatonError) -> Self {
        RegexError::Automaton(err)
    }
}

fn write_caret(
    f: &mut std::fmt::Formatter<'_>,
    code: usize,
    message: &str,
    consumed: &str,
    remainder: &str,
) -> std::fmt::Result {
    write!(
        f,
        "{} {}:\n | {}{}\n | {}{}",
        format!("[{:0>3}]", code).red().bold(),
        message,
        consumed,
        remainder,
        " ".repeat(consumed.chars().count()),
        "^".green()
    )
}

impl Display for RegexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken {
                consumed,
                remainder,
                expected,
            } => write_caret(
                f,
                101,
                &format!("expected {:?}", expected),
                consumed,
                remainder,
            ),
            Self::UnexpectedEof { consumed, expected } => {
                let message = match expected {
                    Some(c) => format!("unexpected end of pattern, expected {:?}", c),
                    None => "unexpected end of pattern".to_string(),
                };
                write_caret(f, 102, &message, consumed, "")
            }
            Self::DanglingOperator {
                consumed,
                remainder,
                found,
            } => write_caret(
                f,
                103,
                &format!("{:?} has nothing to apply to", found),
                consumed,
                remainder,
            ),
            Self::SuffixRemaining {
                consumed,
                remainder,
            } => write_caret(f, 104, "unbalanced input", consumed, remainder),
            Self::NestingTooDeep {
                consumed,
                remainder,
                max,
            } => write_caret(
                f,
                105,
                &format!("groups nest deeper than {}", max),
                consumed,
                remainder,
            ),
            Self::Automaton(err) => write!(f, "{}", err),
        }
    }
}

impl Error for RegexError {}

/// Compiles `pattern` into an NFA.
///
/// Grammar: `regex ::= term ('|' term)*`, `term ::= factor*`,
/// `factor ::= base '*'*`, `base ::= char | '(' regex ')'`. The character `e`
/// denotes the empty string.
pub fn compile(pattern: &str) -> Result<Nfa, RegexError> {
    Compiler::new(pattern).compile()
}

/// Single-use recursive-descent compiler. Each production returns an NFA
/// fragment built by Thompson's construction; state names `q0`, `q1`, ... come
/// from a counter owned by this compiler.
#[derive(Debug)]
pub struct Compiler<'a> {
    regex: &'a str,
    regex_iter: PeekNth<Chars<'a>>,
    consumed: usize,
    state_counter: usize,
    depth: usize,
}

impl<'a> Compiler<'a> {
    pub fn new(input: &'a str) -> Compiler<'a> {
        Compiler {
            regex: input,
            regex_iter: peek_nth(input.chars()),
            consumed: 0,
            state_counter: 0,
            depth: 0,
        }
    }

    pub fn compile(mut self) -> Result<Nfa, RegexError> {
        let nfa = self.regex()?;
        if self.more() {
            return Err(RegexError::SuffixRemaining {
                consumed: self.get_consumed(),
                remainder: self.get_remainder(),
            });
        }
        debug!(
            "compiled {:?} into an NFA with {} states over {:?}",
            self.regex,
            nfa.states().len(),
            nfa.alphabet()
        );
        Ok(nfa)
    }

    pub fn peek(&mut self) -> Result<char, RegexError> {
        match self.regex_iter.peek() {
            Some(c) => Ok(*c),
            None => Err(RegexError::UnexpectedEof {
                consumed: self.get_consumed(),
                expected: None,
            }),
        }
    }

    pub fn eat(&mut self, expected: char) -> Result<char, RegexError> {
        match self.regex_iter.peek() {
            Some(actual) if *actual == expected => {
                self.regex_iter.next();
                self.consumed += 1;
                Ok(expected)
            }
            Some(_) => Err(RegexError::UnexpectedToken {
                consumed: self.get_consumed(),
                remainder: self.get_remainder(),
                expected,
            }),
            None => Err(RegexError::UnexpectedEof {
                consumed: self.get_consumed(),
                expected: Some(expected),
            }),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<char, RegexError> {
        let c = self.peek()?;
        self.eat(c)
    }

    pub fn more(&mut self) -> bool {
        self.regex_iter.peek().is_some()
    }

    fn get_remainder(&self) -> Box<String> {
        Box::new(self.regex_iter.clone().collect::<String>())
    }

    fn get_consumed(&self) -> Box<String> {
        Box::new(self.regex.chars().take(self.consumed).collect())
    }

    fn regex(&mut self) -> Result<Nfa, RegexError> {
        let mut regex = self.term()?;
        while self.more() && self.peek()? == '|' {
            self.eat('|')?;
            let alternative = self.term()?;
            regex = self.alternation(regex, alternative)?;
        }
        Ok(regex)
    }

    fn term(&mut self) -> Result<Nfa, RegexError> {
        let mut term: Option<Nfa> = None;
        while self.more() && !matches!(self.peek()?, ')' | '|') {
            let factor = self.factor()?;
            term = Some(match term {
                Some(prefix) => self.concatenation(prefix, factor)?,
                None => factor,
            });
        }
        match term {
            Some(term) => Ok(term),
            None => self.empty_string(),
        }
    }

    fn factor(&mut self) -> Result<Nfa, RegexError> {
        let mut base = self.base()?;
        while self.more() && self.peek()? == '*' {
            self.eat('*')?;
            self.zero_or_more(&mut base)?;
        }
        Ok(base)
    }

    fn base(&mut self) -> Result<Nfa, RegexError> {
        match self.peek()? {
            '(' if self.depth == MAX_NESTING => Err(RegexError::NestingTooDeep {
                consumed: self.get_consumed(),
                remainder: self.get_remainder(),
                max: MAX_NESTING,
            }),
            '(' => {
                self.eat('(')?;
                self.depth += 1;
                let inner = self.regex()?;
                self.depth -= 1;
                self.eat(')')?;
                Ok(inner)
            }
            c if OPERATORS.contains(&c) => Err(RegexError::DanglingOperator {
                consumed: self.get_consumed(),
                remainder: self.get_remainder(),
                found: c,
            }),
            _ => {
                let c = self.next()?;
                self.symbol_transition(c)
            }
        }
    }

    fn gen_state(&mut self) -> String {
        let name = format!("q{}", self.state_counter);
        self.state_counter += 1;
        name
    }

    fn symbol_transition(&mut self, symbol: char) -> Result<Nfa, RegexError> {
        let (start, end) = (self.gen_state(), self.gen_state());
        let mut nfa = Nfa::new();
        nfa.add_final_state(&end)?;
        nfa.add_start_state(&start)?;
        nfa.add_symbol_transition(&start, Symbol::from(symbol), &end)?;
        trace!("{} -{}-> {}", start, symbol, end);
        Ok(nfa)
    }

    // `()`, `a|` and the empty pattern.
    fn empty_string(&mut self) -> Result<Nfa, RegexError> {
        let state = self.gen_state();
        let mut nfa = Nfa::new();
        nfa.add_final_state(&state)?;
        nfa.add_start_state(&state)?;
        Ok(nfa)
    }

    fn alternation(&mut self, lower: Nfa, upper: Nfa) -> Result<Nfa, RegexError> {
        let mut nfa = Nfa::new();
        for state in lower.final_states().into_iter().chain(upper.final_states()) {
            nfa.add_final_state(state.name())?;
        }
        let start = self.gen_state();
        nfa.add_start_state(&start)?;
        for state in lower.states().iter().chain(upper.states()) {
            nfa.add_state(state.name())?;
        }
        nfa.add_epsilon_transition(&start, entry(&lower)?)?;
        nfa.add_epsilon_transition(&start, entry(&upper)?)?;
        nfa.absorb_transitions(&lower)?;
        nfa.absorb_transitions(&upper)?;
        trace!("{} -e-> {} | {}", start, entry(&lower)?, entry(&upper)?);
        Ok(nfa)
    }

    fn concatenation(&mut self, left: Nfa, right: Nfa) -> Result<Nfa, RegexError> {
        let mut nfa = Nfa::new();
        for state in right.final_states() {
            nfa.add_final_state(state.name())?;
        }
        nfa.add_start_state(entry(&left)?)?;
        for state in right.states().iter().chain(left.states()) {
            nfa.add_state(state.name())?;
        }
        let joint = entry(&right)?;
        for state in left.final_states() {
            nfa.add_epsilon_transition(state.name(), joint)?;
        }
        nfa.absorb_transitions(&right)?;
        nfa.absorb_transitions(&left)?;
        trace!(
            "{{{}}} -e-> {}",
            left.final_states().iter().map(|s| s.name()).join(","),
            joint
        );
        Ok(nfa)
    }

    fn zero_or_more(&mut self, nfa: &mut Nfa) -> Result<(), RegexError> {
        let start = entry(nfa)?.to_string();
        let finals = nfa
            .final_states()
            .into_iter()
            .map(|state| state.name().to_string())
            .collect_vec();
        for state in &finals {
            nfa.add_epsilon_transition(state, &start)?;
        }
        let new_start = self.gen_state();
        nfa.add_state(&new_start)?;
        nfa.add_epsilon_transition(&new_start, &start)?;
        nfa.add_start_state(&new_start)?;
        nfa.add_final_state(&new_start)?;
        trace!("{} -e-> {} (star)", new_start, start);
        Ok(())
    }
}

fn entry(nfa: &Nfa) -> Result<&str, AutomatonError> {
    nfa.start_state()
        .map(|state| state.name())
        .ok_or(AutomatonError::NoStartState)
}
