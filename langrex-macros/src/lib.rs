use crate::regex::RegexInput;
use proc_macro::TokenStream;
use syn::parse_macro_input;

mod regex;

/// Checks a pattern while compiling and evaluates to a `&'static langrex::Regex`.
///
/// The regex is built on first use and shared afterwards. Syntax errors are reported on the
/// pattern literal. The opt-in operators are enabled with attributes:
///
/// ```rust
/// use langrex::regex;
///
/// let date = regex!(r"(?year:\d{4})\-\d{2}");
/// assert!(date.is_match("2024-05").unwrap());
///
/// let list = regex!(#[separated_repeat] r"\d+%,");
/// assert!(list.is_match("1,22,333").unwrap());
///
/// let either = regex!(#[xor] "a*^(?:aa)*");
/// assert!(either.is_match("a").unwrap());
/// assert!(!either.is_match("aa").unwrap());
/// ```
///
/// With the `dot` feature, `#[graph = "file.dot"]` writes the compiled automaton to a file.
#[proc_macro]
pub fn regex(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as RegexInput);
    input.compile().into()
}
