use crate::captures::Captures;
use crate::error::{Error, GroupRef, Result};
use langrex_automata::{
    full_match, parse_pattern_with, Alphabet, BoolOp, CharClass, Dfa, GroupKind, Limits, Nfa,
    Pattern, ResourceLimitError, SyntaxOptions,
};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, OnceLock};

/// A regular language.
///
/// A `Regex` is immutable. Every combinator returns a new value and leaves its operands
/// untouched. The automaton is compiled on first use and cached, so combining regexes is
/// cheap and only the values that are actually matched against get compiled.
///
/// ```rust
/// use langrex::Regex;
///
/// let words = Regex::new(r"\w+").unwrap();
/// let numbers = Regex::new(r"\d+").unwrap();
/// let names = words.difference(&numbers);
///
/// assert!(names.is_match("abc").unwrap());
/// assert!(names.is_match("a1").unwrap());
/// assert!(!names.is_match("123").unwrap());
/// ```
#[derive(Clone)]
pub struct Regex {
    pattern: Arc<Pattern>,
    limits: Limits,
    compiled: OnceLock<Result<Arc<Nfa>, ResourceLimitError>>,
}

/// Configures how a pattern is parsed and how large its automata may grow.
///
/// ```rust
/// use langrex::Regex;
///
/// let regex = Regex::builder("a*^(?:aa)*").xor(true).build().unwrap();
/// assert!(regex.is_match("aaa").unwrap());
/// assert!(!regex.is_match("aaaa").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    syntax: SyntaxOptions,
    limits: Limits,
}

impl RegexBuilder {
    /// Parse `^` after a complete operand as symmetric difference.
    pub fn xor(mut self, enabled: bool) -> Self {
        self.syntax = self.syntax.with_xor(enabled);
        self
    }

    /// Enable `a % b`: one or more `a`, separated by `b`.
    pub fn separated_repeat(mut self, enabled: bool) -> Self {
        self.syntax = self.syntax.with_separated_repeat(enabled);
        self
    }

    /// The maximum number of NFA states.
    pub fn nfa_state_limit(mut self, limit: usize) -> Self {
        self.limits = self.limits.with_nfa_states(limit);
        self
    }

    /// The maximum number of DFA states, per determinization or product.
    pub fn dfa_state_limit(mut self, limit: usize) -> Self {
        self.limits = self.limits.with_dfa_states(limit);
        self
    }

    /// The maximum height of the pattern tree at compile time. Parsing alone never exceeds
    /// [`MAX_NESTING`](crate::MAX_NESTING) levels.
    pub fn nesting_limit(mut self, limit: usize) -> Self {
        self.limits = self.limits.with_nesting(limit);
        self
    }

    /// Parses the pattern. Compilation happens later, on first use.
    pub fn build(self) -> Result<Regex> {
        let pattern = parse_pattern_with(&self.pattern, &self.syntax)?;
        Ok(Regex::with_limits(Arc::new(pattern), self.limits))
    }
}

fn is_group_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

impl Regex {
    /// Parses a pattern with the default syntax and limits.
    pub fn new(pattern: &str) -> Result<Regex> {
        Self::builder(pattern).build()
    }

    /// Starts configuring a regex.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.to_string(),
            syntax: SyntaxOptions::default(),
            limits: Limits::default(),
        }
    }

    /// Wraps an already built pattern tree.
    pub fn from_pattern(pattern: Pattern) -> Regex {
        Self::with_limits(Arc::new(pattern), Limits::default())
    }

    fn with_limits(pattern: Arc<Pattern>, limits: Limits) -> Regex {
        Regex {
            pattern,
            limits,
            compiled: OnceLock::new(),
        }
    }

    // derived regexes keep the limits of `self`
    fn derive(&self, pattern: Pattern) -> Regex {
        Self::with_limits(Arc::new(pattern), self.limits)
    }

    /// The pattern tree.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The limits the automata of this regex are built with.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The empty language, `\#`.
    pub fn nothing() -> Regex {
        Self::from_pattern(Pattern::nothing())
    }

    /// The language containing only the empty string, `\e`.
    pub fn empty() -> Regex {
        Self::from_pattern(Pattern::Empty)
    }

    /// Every string, `\@`.
    pub fn everything() -> Regex {
        Self::from_pattern(Pattern::Everything)
    }

    /// Exactly the character `c`.
    pub fn literal(c: char) -> Regex {
        Self::from_pattern(Pattern::literal(c))
    }

    /// Any single character, `.`.
    pub fn any_char() -> Regex {
        Self::from_pattern(Pattern::Literal(CharClass::any()))
    }

    /// An ASCII digit, `\d`.
    pub fn digit() -> Regex {
        Self::from_pattern(Pattern::Literal(CharClass::digit()))
    }

    /// An ASCII whitespace character, `\s`.
    pub fn space() -> Regex {
        Self::from_pattern(Pattern::Literal(CharClass::space()))
    }

    /// An ASCII word character, `\w`.
    pub fn word() -> Regex {
        Self::from_pattern(Pattern::Literal(CharClass::word()))
    }

    // `other` with its groups numbered after the groups of `self`
    fn right_operand(&self, other: &Regex) -> Arc<Pattern> {
        other
            .pattern
            .shift_captures(self.pattern.max_capture_index())
    }

    /// `self` followed by `other`.
    pub fn concat(&self, other: &Regex) -> Regex {
        self.derive(Pattern::concat([
            self.pattern.clone(),
            self.right_operand(other),
        ]))
    }

    /// `self|other`
    pub fn union(&self, other: &Regex) -> Regex {
        self.derive(Pattern::union([
            self.pattern.clone(),
            self.right_operand(other),
        ]))
    }

    /// `self&other`: strings in both languages. Capture groups of both operands are dropped.
    pub fn intersection(&self, other: &Regex) -> Regex {
        self.derive(Pattern::And(self.pattern.clone(), self.right_operand(other)))
    }

    /// `self-other`: strings of `self` that are not in `other`. Capture groups are dropped.
    pub fn difference(&self, other: &Regex) -> Regex {
        self.derive(Pattern::Difference(
            self.pattern.clone(),
            self.right_operand(other),
        ))
    }

    /// Strings in exactly one of the languages. Capture groups are dropped.
    pub fn symmetric_difference(&self, other: &Regex) -> Regex {
        self.derive(Pattern::Xor(self.pattern.clone(), self.right_operand(other)))
    }

    /// `!self`: every string not in the language. Capture groups are dropped.
    pub fn complement(&self) -> Regex {
        self.derive(Pattern::Complement(self.pattern.clone()))
    }

    /// `self*`
    pub fn star(&self) -> Regex {
        self.derive(Pattern::Star(self.pattern.clone()))
    }

    /// `self+`
    pub fn plus(&self) -> Regex {
        self.derive(Pattern::Plus(self.pattern.clone()))
    }

    /// `self?`
    pub fn optional(&self) -> Regex {
        self.derive(Pattern::Optional(self.pattern.clone()))
    }

    /// Between `min` and `max` repetitions, unbounded when `max` is `None`.
    pub fn repeat(&self, min: u32, max: Option<u32>) -> Result<Regex> {
        if let Some(max) = max.filter(|&max| max < min) {
            return Err(Error::InvalidRepetition { min, max });
        }
        Ok(self.derive(Pattern::Repeat {
            inner: self.pattern.clone(),
            min,
            max,
        }))
    }

    /// `self{n}`
    pub fn exactly(&self, n: u32) -> Regex {
        self.derive(Pattern::Repeat {
            inner: self.pattern.clone(),
            min: n,
            max: Some(n),
        })
    }

    /// `self{n,}`
    pub fn at_least(&self, n: u32) -> Regex {
        self.derive(Pattern::Repeat {
            inner: self.pattern.clone(),
            min: n,
            max: None,
        })
    }

    /// `self{,n}`
    pub fn at_most(&self, n: u32) -> Regex {
        self.derive(Pattern::Repeat {
            inner: self.pattern.clone(),
            min: 0,
            max: Some(n),
        })
    }

    /// One or more `self`, separated by `separator`.
    pub fn separated_by(&self, separator: &Regex) -> Regex {
        self.derive(Pattern::Separated(
            self.pattern.clone(),
            self.right_operand(separator),
        ))
    }

    /// `~self`: the same language, ignoring case.
    pub fn case_insensitive(&self) -> Regex {
        self.derive(Pattern::CaseInsensitive(self.pattern.clone()))
    }

    /// Wraps the whole regex in a new capture group 1, moving existing groups up by one.
    pub fn capture(&self) -> Regex {
        self.derive(Pattern::Group {
            inner: self.pattern.shift_captures(1),
            kind: GroupKind::Capture {
                index: 1,
                name: None,
            },
        })
    }

    /// Like [`Regex::capture`], with a name for the new group.
    pub fn capture_named(&self, name: &str) -> Result<Regex> {
        if !is_group_name(name) {
            return Err(Error::InvalidGroupName(name.to_string()));
        }
        Ok(self.derive(Pattern::Group {
            inner: self.pattern.shift_captures(1),
            kind: GroupKind::Capture {
                index: 1,
                name: Some(name.to_string()),
            },
        }))
    }

    /// `(?:self)`
    pub fn non_capturing(&self) -> Regex {
        self.derive(Pattern::Group {
            inner: self.pattern.clone(),
            kind: GroupKind::NonCapture,
        })
    }

    /// Strings containing a match of `self` anywhere: `\@(?:self)\@`.
    pub fn anywhere(&self) -> Regex {
        self.derive(Pattern::concat([
            Arc::new(Pattern::Everything),
            self.pattern.clone(),
            Arc::new(Pattern::Everything),
        ]))
    }

    /// Strings starting with a match of `self`: `(?:self)\@`.
    pub fn prefix(&self) -> Regex {
        self.derive(Pattern::concat([
            self.pattern.clone(),
            Arc::new(Pattern::Everything),
        ]))
    }

    /// Strings ending with a match of `self`: `\@(?:self)`.
    pub fn suffix(&self) -> Regex {
        self.derive(Pattern::concat([
            Arc::new(Pattern::Everything),
            self.pattern.clone(),
        ]))
    }

    /// The sub-pattern of a capture group, as a regex of its own.
    ///
    /// Group 0 is the whole regex. When several groups carry the same name, the first one is
    /// used. Groups nested inside the selected one are renumbered from 1.
    ///
    /// ```rust
    /// use langrex::Regex;
    ///
    /// let regex = Regex::new("(?hello)(world)(?Plorem:ipsum)").unwrap();
    /// assert_eq!(regex.group(1).unwrap().to_string(), "hello");
    /// assert_eq!(regex.group("lorem").unwrap().to_string(), "ipsum");
    /// assert!(regex.group(4).is_err());
    /// ```
    pub fn group(&self, group: impl Into<GroupRef>) -> Result<Regex> {
        let group = group.into();
        if group == GroupRef::Index(0) {
            return Ok(self.clone());
        }

        let groups = self.pattern.capture_groups();
        let found = groups.iter().find(|candidate| match &group {
            GroupRef::Index(index) => candidate.index == *index,
            GroupRef::Name(name) => candidate.name == Some(name.as_str()),
        });

        let Some(found) = found else {
            return Err(Error::GroupNotFound(group));
        };
        if let Some(operator) = found.discarded_by {
            return Err(Error::Composition { group, operator });
        }

        log::trace!("group {group} of {self} is {}", found.inner);
        Ok(Self::with_limits(
            found.inner.renumber_captures(),
            self.limits,
        ))
    }

    /// The number of capture groups, not counting group 0.
    pub fn captures_len(&self) -> usize {
        self.pattern.max_capture_index()
    }

    /// The compiled automaton, built on first use.
    pub fn compile(&self) -> Result<&Nfa> {
        let compiled = self
            .compiled
            .get_or_init(|| Nfa::build(&self.pattern, &self.limits).map(Arc::new));
        match compiled {
            Ok(nfa) => Ok(&**nfa),
            Err(e) => Err((*e).into()),
        }
    }

    /// Whether the whole of `haystack` is in the language.
    pub fn is_match(&self, haystack: &str) -> Result<bool> {
        Ok(full_match(self.compile()?, haystack).is_some())
    }

    /// Matches the whole of `haystack` and reports where every capture group matched.
    ///
    /// When a group is repeated, its last iteration is reported. When the haystack can be
    /// matched in several ways, the leftmost alternatives and the longest loops are preferred.
    ///
    /// ```rust
    /// use langrex::Regex;
    ///
    /// let regex = Regex::new(r"(?key:\w+)=(\d+)").unwrap();
    /// let captures = regex.captures("answer=42").unwrap().unwrap();
    /// assert_eq!(captures.name("key").unwrap().as_str(), "answer");
    /// assert_eq!(captures.get(2).unwrap().as_str(), "42");
    /// ```
    pub fn captures<'h>(&self, haystack: &'h str) -> Result<Option<Captures<'h>>> {
        let Some(slots) = full_match(self.compile()?, haystack) else {
            return Ok(None);
        };

        let names = self
            .pattern
            .capture_groups()
            .into_iter()
            .filter(|group| group.discarded_by.is_none())
            .filter_map(|group| Some((group.name?.to_string(), group.index)))
            .collect();
        Ok(Some(Captures::new(haystack, slots, names)))
    }

    fn dfa(&self) -> Result<Dfa> {
        let nfa = self.compile()?;
        let alphabet = Alphabet::new(nfa.classes());
        Ok(Dfa::determinize(nfa, &alphabet, &self.limits)?.minimize())
    }

    fn product(&self, other: &Regex, op: BoolOp) -> Result<Dfa> {
        let (l, r) = (self.compile()?, other.compile()?);
        let alphabet = Alphabet::new(l.classes().chain(r.classes()));
        let l = Dfa::determinize(l, &alphabet, &self.limits)?;
        let r = Dfa::determinize(r, &alphabet, &self.limits)?;
        Ok(Dfa::product(&l, &r, op, &self.limits)?)
    }

    /// Whether the language is empty.
    pub fn matches_nothing(&self) -> Result<bool> {
        Ok(self.dfa()?.matches_nothing())
    }

    /// Whether the language contains the empty string.
    pub fn matches_empty(&self) -> Result<bool> {
        Ok(full_match(self.compile()?, "").is_some())
    }

    /// Whether the language contains every string.
    pub fn matches_everything(&self) -> Result<bool> {
        Ok(self.dfa()?.matches_everything())
    }

    /// Whether every string in this language is also in `other`.
    pub fn is_subset_of(&self, other: &Regex) -> Result<bool> {
        Ok(self.product(other, BoolOp::AndNot)?.matches_nothing())
    }

    /// Whether both regexes describe the same language.
    pub fn is_equivalent_to(&self, other: &Regex) -> Result<bool> {
        Ok(self.product(other, BoolOp::Xor)?.matches_nothing())
    }
}

/// Writes the pattern syntax. It parses back to the same language unless it uses an opt-in
/// operator or a large unnamed class; see [`Pattern`] for the details.
impl Display for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl Debug for Regex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex")
            .field(&self.pattern.to_string())
            .finish()
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $named:ident) => {
        impl std::ops::$trait for Regex {
            type Output = Regex;

            fn $method(self, rhs: Regex) -> Regex {
                self.$named(&rhs)
            }
        }

        impl std::ops::$trait<&Regex> for &Regex {
            type Output = Regex;

            fn $method(self, rhs: &Regex) -> Regex {
                self.$named(rhs)
            }
        }
    };
}

binary_operator!(BitOr, bitor, union);
binary_operator!(BitAnd, bitand, intersection);
binary_operator!(Sub, sub, difference);
binary_operator!(BitXor, bitxor, symmetric_difference);

impl std::ops::Not for Regex {
    type Output = Regex;

    fn not(self) -> Regex {
        self.complement()
    }
}

impl std::ops::Not for &Regex {
    type Output = Regex;

    fn not(self) -> Regex {
        self.complement()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Regex>();
    }

    #[test]
    fn compiles_once() {
        let regex = Regex::new("a|b").unwrap();
        let first: *const Nfa = regex.compile().unwrap();
        let second: *const Nfa = regex.compile().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn resource_errors_are_cached() {
        let regex = Regex::builder("a{100}").nfa_state_limit(50).build().unwrap();
        assert!(matches!(regex.is_match("a"), Err(Error::ResourceLimit(_))));
        assert!(matches!(regex.is_match("a"), Err(Error::ResourceLimit(_))));
    }

    #[test]
    fn group_names() {
        assert!(is_group_name("year"));
        assert!(is_group_name("_1"));
        assert!(!is_group_name("1a"));
        assert!(!is_group_name(""));
        assert!(!is_group_name("a-b"));
    }
}
