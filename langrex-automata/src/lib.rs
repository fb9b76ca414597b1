//! Patterns, automata and the algebra of regular languages behind `langrex`.
//!
//! A pattern is parsed into a [`Pattern`] tree, compiled into an [`Nfa`] and matched with
//! [`full_match`]. Intersection, difference, symmetric difference and complement are computed
//! on complete [`Dfa`]s over a shared [`Alphabet`] and embedded back into the NFA.

use std::fmt::{self, Display, Formatter};
use thiserror::Error;

mod alphabet;
mod charclass;
mod dfa;
mod matcher;
mod nfa;
mod parse;
mod pattern;

#[cfg(feature = "dot")]
mod dot;

pub use alphabet::{Alphabet, AtomID, CharKind, Context};
pub use charclass::{CharClass, MAX_CODE_POINT};
pub use dfa::{BoolOp, Dfa, DfaState};
pub use matcher::{full_match, Slots};
pub use nfa::{Edge, Nfa, NfaState, StateID};
pub use parse::{SyntaxError, SyntaxErrorKind, SyntaxOptions, MAX_NESTING};
pub use pattern::{Anchor, CaptureGroup, GroupKind, Operator, Pattern};

/// Bounds on the size of the automata built for a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Limits {
    nfa_states: usize,
    dfa_states: usize,
    nesting: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            nfa_states: 100_000,
            dfa_states: 1_000_000,
            nesting: 4 * MAX_NESTING,
        }
    }
}

impl Limits {
    pub fn with_nfa_states(mut self, limit: usize) -> Self {
        self.nfa_states = limit;
        self
    }

    pub fn with_dfa_states(mut self, limit: usize) -> Self {
        self.dfa_states = limit;
        self
    }

    /// Bounds the height of a pattern tree, which the compiler walks recursively. Parsed
    /// patterns stay within [`MAX_NESTING`]; combining regexes can stack them higher.
    pub fn with_nesting(mut self, limit: usize) -> Self {
        self.nesting = limit;
        self
    }

    pub fn nfa_states(&self) -> usize {
        self.nfa_states
    }

    pub fn dfa_states(&self) -> usize {
        self.dfa_states
    }

    pub fn nesting(&self) -> usize {
        self.nesting
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    NfaStates,
    DfaStates,
    Nesting,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Resource::NfaStates => write!(f, "NFA states"),
            Resource::DfaStates => write!(f, "DFA states"),
            Resource::Nesting => write!(f, "levels of nesting"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("pattern needs more than {limit} {resource}")]
pub struct ResourceLimitError {
    pub resource: Resource,
    pub limit: usize,
}

/// parse a string to a pattern, without the opt-in operators
pub fn parse_pattern(input: impl AsRef<str>) -> Result<Pattern, SyntaxError> {
    parse::parse(input.as_ref(), &SyntaxOptions::default())
}

/// parse a string to a pattern with the given syntax options
pub fn parse_pattern_with(
    input: impl AsRef<str>,
    options: &SyntaxOptions,
) -> Result<Pattern, SyntaxError> {
    parse::parse(input.as_ref(), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[ctor::ctor]
    fn init() {
        env_logger::init();
    }

    fn matches(pattern: &str, haystack: &str) -> bool {
        let pattern = parse_pattern(pattern).unwrap();
        let nfa = Nfa::build(&pattern, &Limits::default()).unwrap();
        full_match(&nfa, haystack).is_some()
    }

    fn dfa(pattern: &str) -> Dfa {
        let nfa = Nfa::build(&parse_pattern(pattern).unwrap(), &Limits::default()).unwrap();
        let alphabet = Alphabet::new(nfa.classes());
        Dfa::determinize(&nfa, &alphabet, &Limits::default())
            .unwrap()
            .minimize()
    }

    #[test]
    fn algebraic_laws() {
        assert!(dfa("a&b").matches_nothing());
        assert!(dfa("!\\#").matches_everything());
        assert!(dfa("\\@-\\@").matches_nothing());
        assert!(dfa("(?:a|b)-b").accepts("a"));
        assert!(!dfa("(?:a|b)-b").accepts("b"));
    }

    #[test]
    fn double_complement() {
        for text in ["", "a", "ab", "abab", "ba"] {
            assert_eq!(matches("(?:ab)*", text), matches("!!(?:ab)*", text), "{text:?}");
        }
    }

    #[test]
    fn quantifier_equivalences() {
        for text in ["", "a", "aa", "aaa", "aaaa", "b"] {
            assert_eq!(matches("a+", text), matches("aa*", text), "{text:?}");
            assert_eq!(matches("a?", text), matches("a|\\e", text), "{text:?}");
            assert_eq!(matches("a{3}", text), matches("aaa", text), "{text:?}");
            assert_eq!(
                matches("a{2,4}", text),
                matches("aa|aaa|aaaa", text),
                "{text:?}"
            );
        }
    }

    #[test]
    fn separated_repeat() {
        let options = SyntaxOptions::new().with_separated_repeat(true);
        let pattern = parse_pattern_with("\\d%,", &options).unwrap();
        let nfa = Nfa::build(&pattern, &Limits::default()).unwrap();
        assert!(full_match(&nfa, "1").is_some());
        assert!(full_match(&nfa, "1,2,3").is_some());
        assert!(full_match(&nfa, "1,2,").is_none());
    }

    #[test]
    fn resource_limit_message() {
        let error = ResourceLimitError {
            resource: Resource::DfaStates,
            limit: 10,
        };
        assert_eq!(error.to_string(), "pattern needs more than 10 DFA states");
    }
}
