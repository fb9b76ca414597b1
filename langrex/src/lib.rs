#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use langrex_automata::*;

mod captures;
pub use captures::{Captures, Match};

mod error;
pub use error::{Error, GroupRef, Result};

mod regex;
pub use regex::{Regex, RegexBuilder};

/// Checks a pattern while compiling and evaluates to a `&'static` [`Regex`].
///
/// ```rust
/// use langrex::regex;
///
/// let greeting = regex!("(?hello)(world)");
/// let captures = greeting.captures("helloworld").unwrap().unwrap();
/// assert_eq!(captures.get(1).unwrap().as_str(), "hello");
/// ```
///
/// # Supported Attributes
/// * `#[xor]` parse `^` after an operand as symmetric difference.
/// * `#[separated_repeat]` enable the `%` operator.
/// * `#[graph="$path"]` location to put a graphviz dot file representing the compiled automaton. (only with the `dot` feature)
pub use langrex_macros::regex;

#[doc(hidden)]
pub mod __private {
    use crate::Regex;

    pub fn validated(pattern: &str, xor: bool, separated_repeat: bool) -> Regex {
        Regex::builder(pattern)
            .xor(xor)
            .separated_repeat(separated_repeat)
            .build()
            .unwrap_or_else(|e| panic!("`regex!` accepted the invalid pattern {pattern:?}: {e}"))
    }
}
