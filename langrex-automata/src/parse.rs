//! The surface syntax.
//!
//! A hand written recursive descent parser. From loosest to tightest binding:
//!
//! ```text
//! union        := intersection (('|' | '^') intersection)*
//! intersection := separated (('&' | '-') separated)*
//! separated    := concat ('%' concat)*
//! concat       := prefix+
//! prefix       := ('!' | '~') prefix | postfix
//! postfix      := atom ('*' | '+' | '?' | '{' count '}')*
//! ```
//!
//! The xor reading of `^` and the `%` operator are only available when enabled in
//! [`SyntaxOptions`].

use crate::charclass::{is_special, CharClass};
use crate::pattern::{Anchor, GroupKind, Pattern};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Opt-in syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SyntaxOptions {
    xor: bool,
    separated_repeat: bool,
}

impl SyntaxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `^` after a complete operand as symmetric difference instead of an anchor.
    pub fn with_xor(mut self, enabled: bool) -> Self {
        self.xor = enabled;
        self
    }

    /// Enables `a % b`, one or more `a` separated by `b`.
    pub fn with_separated_repeat(mut self, enabled: bool) -> Self {
        self.separated_repeat = enabled;
        self
    }

    pub fn xor(&self) -> bool {
        self.xor
    }

    pub fn separated_repeat(&self) -> bool {
        self.separated_repeat
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    #[error("expected an expression")]
    ExpectedExpression,
    #[error("operator `{0}` is missing an operand")]
    MissingOperand(char),
    #[error("quantifier `{0}` does not follow an expression")]
    DanglingQuantifier(char),
    #[error("unmatched `)`")]
    UnmatchedParen,
    #[error("unmatched `}}`")]
    UnmatchedBrace,
    #[error("unclosed group")]
    UnclosedGroup,
    #[error("empty group")]
    EmptyGroup,
    #[error("invalid group name")]
    InvalidGroupName,
    #[error("duplicate group name `{0}`")]
    DuplicateGroupName(String),
    #[error("unclosed repetition count")]
    UnclosedRepetition,
    #[error("repetition count without bounds")]
    EmptyRepetition,
    #[error("repetition minimum {min} is larger than maximum {max}")]
    InvalidRange { min: u32, max: u32 },
    #[error("repetition count is too large")]
    CountTooLarge,
    #[error("unknown escape `\\{0}`")]
    UnknownEscape(char),
    #[error("pattern ends in a backslash")]
    TrailingBackslash,
    #[error("invalid code point escape")]
    InvalidCodePoint,
    #[error("unescaped space, write `\\ ` to match a space")]
    ReservedSpace,
    #[error("operator `{0}` is not enabled")]
    DisabledOperator(char),
    #[error("pattern nests more than {} levels deep", MAX_NESTING)]
    NestingTooDeep,
}

/// The deepest pattern tree the parser builds. Leaves count as one level.
pub const MAX_NESTING: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error at position {position}: {kind}")]
pub struct SyntaxError {
    /// Byte offset into the pattern text.
    pub position: usize,
    pub kind: SyntaxErrorKind,
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses pattern syntax. Capture groups are numbered from 1 in the order of their opening
/// parenthesis.
pub fn parse(input: &str, options: &SyntaxOptions) -> ParseResult<Pattern> {
    let mut parser = Parser {
        input,
        pos: 0,
        options: *options,
        next_capture: 1,
        names: HashSet::new(),
        depth: 0,
    };

    let pattern = parser.parse_union()?.map(|node| node.pattern);
    match parser.peek() {
        None => {}
        Some(')') => return Err(parser.error(SyntaxErrorKind::UnmatchedParen)),
        Some(_) => return Err(parser.error(SyntaxErrorKind::ExpectedExpression)),
    }

    let pattern = pattern.unwrap_or(Pattern::Empty);
    log::trace!("parsed {input:?} as {pattern}");
    Ok(pattern)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    options: SyntaxOptions,
    next_capture: usize,
    names: HashSet<String>,
    /// Groups currently open.
    depth: usize,
}

/// A parsed subpattern and the height of its tree.
struct Node {
    pattern: Pattern,
    height: usize,
}

impl Node {
    fn leaf(pattern: Pattern) -> Node {
        Node { pattern, height: 1 }
    }
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: SyntaxErrorKind) -> SyntaxError {
        self.error_at(self.pos, kind)
    }

    fn error_at(&self, position: usize, kind: SyntaxErrorKind) -> SyntaxError {
        SyntaxError { position, kind }
    }

    /// A node over children at most `below` levels high.
    fn node(&self, pattern: Pattern, below: usize) -> ParseResult<Node> {
        self.checked(Node {
            pattern,
            height: below + 1,
        })
    }

    fn checked(&self, node: Node) -> ParseResult<Node> {
        if node.height > MAX_NESTING {
            return Err(self.error(SyntaxErrorKind::NestingTooDeep));
        }
        Ok(node)
    }

    /// Parses `operand (op operand)*` for the operators `op` accepts, left-associative.
    fn parse_binary(
        &mut self,
        operand: fn(&mut Self) -> ParseResult<Option<Node>>,
        op: fn(&SyntaxOptions, char) -> bool,
        combine: fn(char, Arc<Pattern>, Arc<Pattern>) -> Pattern,
    ) -> ParseResult<Option<Node>> {
        let mut lhs = operand(self)?;

        while let Some(c) = self.peek().filter(|&c| op(&self.options, c)) {
            let op_pos = self.pos;
            self.bump();

            let Some(left) = lhs else {
                return Err(self.error_at(op_pos, SyntaxErrorKind::MissingOperand(c)));
            };
            let Some(right) = operand(self)? else {
                return Err(self.error(SyntaxErrorKind::MissingOperand(c)));
            };

            lhs = Some(if c == '|' {
                self.checked(alternative(left, right))?
            } else {
                let below = left.height.max(right.height);
                let pattern = combine(c, Arc::new(left.pattern), Arc::new(right.pattern));
                self.node(pattern, below)?
            });
        }

        Ok(lhs)
    }

    fn parse_union(&mut self) -> ParseResult<Option<Node>> {
        self.parse_binary(
            Self::parse_intersection,
            |options, c| c == '|' || (c == '^' && options.xor),
            |_, l, r| Pattern::Xor(l, r),
        )
    }

    fn parse_intersection(&mut self) -> ParseResult<Option<Node>> {
        self.parse_binary(
            Self::parse_separated,
            |_, c| c == '&' || c == '-',
            |c, l, r| match c {
                '&' => Pattern::And(l, r),
                _ => Pattern::Difference(l, r),
            },
        )
    }

    fn parse_separated(&mut self) -> ParseResult<Option<Node>> {
        self.parse_binary(
            Self::parse_concat,
            |options, c| c == '%' && options.separated_repeat,
            |_, l, r| Pattern::Separated(l, r),
        )
    }

    fn parse_concat(&mut self) -> ParseResult<Option<Node>> {
        let mut items = Vec::new();
        let mut below = 0;
        loop {
            // after a complete operand, `^` is xor
            if !items.is_empty() && self.options.xor && self.peek() == Some('^') {
                break;
            }

            let Some(item) = self.parse_prefix()? else {
                break;
            };
            below = below.max(item.height);
            items.push(Arc::new(item.pattern));
        }

        match items.len() {
            0 => Ok(None),
            1 => Ok(Some(Node {
                pattern: Pattern::concat(items),
                height: below,
            })),
            _ => self.node(Pattern::Concat(items), below).map(Some),
        }
    }

    fn parse_prefix(&mut self) -> ParseResult<Option<Node>> {
        let mut operators = Vec::new();
        while let Some(c @ ('!' | '~')) = self.peek() {
            self.bump();
            operators.push(c);
        }

        let Some(mut node) = self.parse_postfix()? else {
            if operators.is_empty() {
                return Ok(None);
            }
            return Err(self.error(SyntaxErrorKind::ExpectedExpression));
        };

        for c in operators.into_iter().rev() {
            let inner = Arc::new(node.pattern);
            let pattern = if c == '!' {
                Pattern::Complement(inner)
            } else {
                Pattern::CaseInsensitive(inner)
            };
            node = self.node(pattern, node.height)?;
        }
        Ok(Some(node))
    }

    fn parse_postfix(&mut self) -> ParseResult<Option<Node>> {
        let Some(mut node) = self.parse_atom()? else {
            return Ok(None);
        };

        loop {
            let pattern = match self.peek() {
                Some(c @ ('*' | '+' | '?')) => {
                    self.bump();
                    let inner = Arc::new(node.pattern);
                    match c {
                        '*' => Pattern::Star(inner),
                        '+' => Pattern::Plus(inner),
                        _ => Pattern::Optional(inner),
                    }
                }
                Some('{') => {
                    let (min, max) = self.parse_count()?;
                    Pattern::Repeat {
                        inner: Arc::new(node.pattern),
                        min,
                        max,
                    }
                }
                _ => break,
            };
            node = self.node(pattern, node.height)?;
        }

        Ok(Some(node))
    }

    fn parse_count(&mut self) -> ParseResult<(u32, Option<u32>)> {
        let start = self.pos;
        self.bump();

        let min = self.parse_number()?;
        let max = if self.peek() == Some(',') {
            self.bump();
            self.parse_number()?
        } else {
            min
        };

        if self.bump() != Some('}') {
            return Err(self.error_at(start, SyntaxErrorKind::UnclosedRepetition));
        }

        match (min, max) {
            (None, None) => Err(self.error_at(start, SyntaxErrorKind::EmptyRepetition)),
            (Some(min), Some(max)) if min > max => {
                Err(self.error_at(start, SyntaxErrorKind::InvalidRange { min, max }))
            }
            (min, max) => Ok((min.unwrap_or(0), max)),
        }
    }

    fn parse_number(&mut self) -> ParseResult<Option<u32>> {
        let start = self.pos;
        let digits = self
            .rest()
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return Ok(None);
        }

        self.pos += digits;
        self.input[start..self.pos]
            .parse()
            .map(Some)
            .map_err(|_| self.error_at(start, SyntaxErrorKind::CountTooLarge))
    }

    fn parse_atom(&mut self) -> ParseResult<Option<Node>> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let atom = match c {
            ')' | '|' | '&' | '-' => return Ok(None),
            '%' if self.options.separated_repeat => return Ok(None),
            '%' => return Err(self.error(SyntaxErrorKind::DisabledOperator('%'))),
            '*' | '+' | '?' | '{' => {
                return Err(self.error(SyntaxErrorKind::DanglingQuantifier(c)))
            }
            '}' => return Err(self.error(SyntaxErrorKind::UnmatchedBrace)),
            ' ' => return Err(self.error(SyntaxErrorKind::ReservedSpace)),
            '(' => return self.parse_group().map(Some),
            '\\' => return self.parse_escape().map(|escape| Some(Node::leaf(escape))),
            '.' => Pattern::Literal(CharClass::any()),
            '^' => Pattern::Anchor(Anchor::StartLine),
            '$' => Pattern::Anchor(Anchor::EndLine),
            c => Pattern::literal(c),
        };

        self.bump();
        Ok(Some(Node::leaf(atom)))
    }

    fn parse_escape(&mut self) -> ParseResult<Pattern> {
        let start = self.pos;
        self.bump();
        let Some(c) = self.bump() else {
            return Err(self.error_at(start, SyntaxErrorKind::TrailingBackslash));
        };

        let pattern = match c {
            'A' => Pattern::Anchor(Anchor::StartText),
            'Z' => Pattern::Anchor(Anchor::EndText),
            'b' => Pattern::Anchor(Anchor::WordBoundary),
            'B' => Pattern::Anchor(Anchor::NotWordBoundary),
            'd' => Pattern::Literal(CharClass::digit()),
            'D' => Pattern::Literal(CharClass::digit().negate()),
            's' => Pattern::Literal(CharClass::space()),
            'S' => Pattern::Literal(CharClass::space().negate()),
            'w' => Pattern::Literal(CharClass::word()),
            'W' => Pattern::Literal(CharClass::word().negate()),
            '@' => Pattern::Everything,
            '#' => Pattern::nothing(),
            'e' => Pattern::Empty,
            'x' => Pattern::literal(self.parse_code_point(start, 2)?),
            'u' => Pattern::literal(self.parse_code_point(start, 4)?),
            'U' => Pattern::literal(self.parse_code_point(start, 8)?),
            c if is_special(c) => Pattern::literal(c),
            c => return Err(self.error_at(start, SyntaxErrorKind::UnknownEscape(c))),
        };
        Ok(pattern)
    }

    fn parse_code_point(&mut self, start: usize, digits: usize) -> ParseResult<char> {
        let hex = self
            .rest()
            .get(..digits)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()));

        let c = hex
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32)
            .ok_or_else(|| self.error_at(start, SyntaxErrorKind::InvalidCodePoint))?;
        self.pos += digits;
        Ok(c)
    }

    fn identifier(&self) -> &'a str {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                !(c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
            })
            .map_or(rest.len(), |(i, _)| i);
        &rest[..len]
    }

    fn parse_group(&mut self) -> ParseResult<Node> {
        let start = self.pos;
        if self.depth == MAX_NESTING {
            return Err(self.error(SyntaxErrorKind::NestingTooDeep));
        }
        self.bump();

        if let Some(rest) = self.rest().strip_prefix("?#") {
            let Some(len) = rest.find(')') else {
                return Err(self.error_at(start, SyntaxErrorKind::UnclosedGroup));
            };
            self.pos += 2 + len + 1;
            return Ok(Node::leaf(Pattern::Comment(rest[..len].to_string())));
        }

        let kind = if self.rest().starts_with("?:") {
            self.pos += 2;
            GroupKind::NonCapture
        } else if self.rest().starts_with("?<") || self.rest().starts_with("?P<") {
            self.pos += if self.rest().starts_with("?<") { 2 } else { 3 };
            let name_pos = self.pos;
            let name = self.identifier();
            self.pos += name.len();
            if name.is_empty() || self.bump() != Some('>') {
                return Err(self.error_at(name_pos, SyntaxErrorKind::InvalidGroupName));
            }
            self.capture(Some(name), name_pos)?
        } else if self.rest().starts_with('?') {
            self.bump();
            let name_pos = self.pos;
            let ident = self.identifier();
            if !ident.is_empty() && self.rest()[ident.len()..].starts_with(':') {
                self.pos += ident.len() + 1;
                let name = match ident.strip_prefix('P') {
                    Some(stripped) if is_identifier(stripped) => stripped,
                    _ => ident,
                };
                self.capture(Some(name), name_pos)?
            } else {
                // `(?p)` is a plain capture of `p`
                self.capture(None, name_pos)?
            }
        } else {
            self.capture(None, start)?
        };

        self.depth += 1;
        let body = self.parse_union()?;
        self.depth -= 1;
        if self.peek() != Some(')') {
            return Err(self.error_at(start, SyntaxErrorKind::UnclosedGroup));
        }
        self.bump();

        let Some(body) = body else {
            return Err(self.error_at(start, SyntaxErrorKind::EmptyGroup));
        };
        let group = Pattern::Group {
            inner: Arc::new(body.pattern),
            kind,
        };
        self.node(group, body.height)
    }

    fn capture(&mut self, name: Option<&str>, position: usize) -> ParseResult<GroupKind> {
        if let Some(name) = name {
            if !self.names.insert(name.to_string()) {
                return Err(self.error_at(
                    position,
                    SyntaxErrorKind::DuplicateGroupName(name.to_string()),
                ));
            }
        }

        let index = self.next_capture;
        self.next_capture += 1;
        Ok(GroupKind::Capture {
            index,
            name: name.map(str::to_string),
        })
    }
}

/// `left|right`, appending to `left` when it is a union built by the same loop.
fn alternative(mut left: Node, right: Node) -> Node {
    if let Pattern::Or(items) = &mut left.pattern {
        items.push(Arc::new(right.pattern));
        left.height = left.height.max(right.height + 1);
        return left;
    }

    let height = left.height.max(right.height) + 1;
    Node {
        pattern: Pattern::Or(vec![Arc::new(left.pattern), Arc::new(right.pattern)]),
        height,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern::*;

    fn parse_default(input: &str) -> ParseResult<Pattern> {
        parse(input, &SyntaxOptions::default())
    }

    fn error_kind(input: &str) -> SyntaxErrorKind {
        parse_default(input).unwrap_err().kind
    }

    fn lit(c: char) -> Arc<Pattern> {
        Arc::new(Pattern::literal(c))
    }

    fn start_line() -> Arc<Pattern> {
        Arc::new(Pattern::Anchor(crate::pattern::Anchor::StartLine))
    }

    #[test]
    fn precedence() {
        // a|b&c-d  ==  a|((b&c)-d)
        assert_eq!(
            parse_default("a|b&c-d").unwrap(),
            Or(vec![
                lit('a'),
                Arc::new(Difference(Arc::new(And(lit('b'), lit('c'))), lit('d')))
            ])
        );

        // ab* == a(b*)
        assert_eq!(
            parse_default("ab*").unwrap(),
            Concat(vec![lit('a'), Arc::new(Star(lit('b')))])
        );

        // !a* == !(a*)
        assert_eq!(
            parse_default("!a*").unwrap(),
            Complement(Arc::new(Star(lit('a'))))
        );

        // quantifiers stack
        assert_eq!(
            parse_default("a*?").unwrap(),
            Optional(Arc::new(Star(lit('a'))))
        );

        // sequences and alternatives are flat
        assert_eq!(
            parse_default("abc|d|e").unwrap(),
            Or(vec![
                Arc::new(Concat(vec![lit('a'), lit('b'), lit('c')])),
                lit('d'),
                lit('e'),
            ])
        );
    }

    #[test]
    fn long_patterns_stay_shallow() {
        let literal = "a".repeat(100_000);
        let pattern = parse_default(&literal).unwrap();
        assert_eq!(pattern.height(), 2);

        let alternatives = vec!["a"; 100_000].join("|");
        assert_eq!(parse_default(&alternatives).unwrap().height(), 2);
    }

    #[test]
    fn nesting_limit() {
        let fits = format!("{}a{}", "(".repeat(MAX_NESTING - 1), ")".repeat(MAX_NESTING - 1));
        assert_eq!(parse_default(&fits).unwrap().height(), MAX_NESTING);

        let deep = |open: &str, close: &str| {
            let input = format!("{}a{}", open.repeat(10_000), close.repeat(10_000));
            parse_default(&input).unwrap_err()
        };
        for error in [
            deep("(", ")"),
            deep("(?:", ")"),
            deep("!", ""),
            deep("~", ""),
            deep("", "*"),
            deep("", "{2}"),
        ] {
            assert_eq!(error.kind, SyntaxErrorKind::NestingTooDeep);
        }

        let chain = vec!["a"; 10_000].join("-");
        assert_eq!(error_kind(&chain), SyntaxErrorKind::NestingTooDeep);

        let error = deep("(", ")");
        assert_eq!(error.position, MAX_NESTING);
        assert_eq!(
            error.to_string(),
            format!("syntax error at position {MAX_NESTING}: pattern nests more than {MAX_NESTING} levels deep")
        );
    }

    #[test]
    fn empty_pattern() {
        assert_eq!(parse_default("").unwrap(), Empty);
    }

    #[test]
    fn group_forms() {
        let pattern = parse_default("(?hello)(world)(?Plorem:ipsum)").unwrap();
        let groups: Vec<_> = pattern
            .capture_groups()
            .iter()
            .map(|g| (g.index, g.name.map(str::to_string), g.inner.to_string()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (1, None, "hello".to_string()),
                (2, None, "world".to_string()),
                (3, Some("lorem".to_string()), "ipsum".to_string()),
            ]
        );

        let pattern = parse_default("(?<a>x)(?P<b>y)(?c:z)(?P:w)(?:v)").unwrap();
        let names: Vec<_> = pattern
            .capture_groups()
            .iter()
            .map(|g| g.name.map(str::to_string))
            .collect();
        assert_eq!(
            names,
            vec![
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string()),
                Some("P".to_string()),
            ]
        );
    }

    #[test]
    fn outer_groups_are_numbered_first() {
        let pattern = parse_default("((a)(b))").unwrap();
        let groups = pattern.capture_groups();
        assert_eq!(groups[0].inner.to_string(), "(a)(b)");
        assert_eq!(groups[1].inner.to_string(), "a");
        assert_eq!(groups[2].inner.to_string(), "b");
    }

    #[test]
    fn comments() {
        assert_eq!(
            parse_default("(?#some text)").unwrap(),
            Comment("some text".to_string())
        );
        assert_eq!(error_kind("(?#oops"), SyntaxErrorKind::UnclosedGroup);
    }

    #[test]
    fn escapes() {
        assert_eq!(parse_default("\\.").unwrap(), Pattern::literal('.'));
        assert_eq!(parse_default("\\\\").unwrap(), Pattern::literal('\\'));
        assert_eq!(parse_default("\\ ").unwrap(), Pattern::literal(' '));
        assert_eq!(parse_default("\\x41").unwrap(), Pattern::literal('A'));
        assert_eq!(parse_default("\\u00e9").unwrap(), Pattern::literal('é'));
        assert_eq!(parse_default("\\U0001F600").unwrap(), Pattern::literal('😀'));
        assert_eq!(parse_default("\\@").unwrap(), Everything);
        assert_eq!(parse_default("\\#").unwrap(), Pattern::nothing());
        assert_eq!(parse_default("\\e").unwrap(), Empty);
        assert_eq!(
            parse_default("\\W").unwrap(),
            Literal(CharClass::word().negate())
        );

        assert_eq!(error_kind("\\q"), SyntaxErrorKind::UnknownEscape('q'));
        assert_eq!(error_kind("a\\"), SyntaxErrorKind::TrailingBackslash);
        assert_eq!(error_kind("\\x4"), SyntaxErrorKind::InvalidCodePoint);
        assert_eq!(error_kind("\\UFFFFFFFF"), SyntaxErrorKind::InvalidCodePoint);
    }

    #[test]
    fn counts() {
        let repeat = |input: &str| match parse_default(input).unwrap() {
            Repeat { min, max, .. } => (min, max),
            other => panic!("expected a repetition, got {other:?}"),
        };
        assert_eq!(repeat("a{3}"), (3, Some(3)));
        assert_eq!(repeat("a{2,}"), (2, None));
        assert_eq!(repeat("a{,4}"), (0, Some(4)));
        assert_eq!(repeat("a{2,4}"), (2, Some(4)));

        assert_eq!(
            error_kind("a{4,2}"),
            SyntaxErrorKind::InvalidRange { min: 4, max: 2 }
        );
        assert_eq!(error_kind("a{}"), SyntaxErrorKind::EmptyRepetition);
        assert_eq!(error_kind("a{,}"), SyntaxErrorKind::EmptyRepetition);
        assert_eq!(error_kind("a{3"), SyntaxErrorKind::UnclosedRepetition);
        assert_eq!(error_kind("a{99999999999}"), SyntaxErrorKind::CountTooLarge);
    }

    #[test]
    fn caret_is_an_anchor_by_default() {
        assert_eq!(
            parse_default("a^b").unwrap(),
            Concat(vec![lit('a'), start_line(), lit('b')])
        );
    }

    #[test]
    fn opt_in_operators() {
        let options = SyntaxOptions::new()
            .with_xor(true)
            .with_separated_repeat(true);

        assert_eq!(parse("a^b", &options).unwrap(), Xor(lit('a'), lit('b')));
        assert_eq!(
            parse("a|b^c|d", &options).unwrap(),
            Or(vec![
                Arc::new(Xor(Arc::new(Or(vec![lit('a'), lit('b')])), lit('c'))),
                lit('d'),
            ])
        );
        // a leading caret is still an anchor
        assert_eq!(
            parse("^a", &options).unwrap(),
            Concat(vec![start_line(), lit('a')])
        );
        assert_eq!(
            parse("a%,", &options).unwrap(),
            Separated(lit('a'), lit(','))
        );

        assert_eq!(error_kind("a%b"), SyntaxErrorKind::DisabledOperator('%'));
    }

    #[test]
    fn errors() {
        use SyntaxErrorKind::*;

        assert_eq!(error_kind("a|"), MissingOperand('|'));
        assert_eq!(error_kind("|a"), MissingOperand('|'));
        assert_eq!(error_kind("a&"), MissingOperand('&'));
        assert_eq!(error_kind("*a"), DanglingQuantifier('*'));
        assert_eq!(error_kind("a)"), UnmatchedParen);
        assert_eq!(error_kind("a}"), UnmatchedBrace);
        assert_eq!(error_kind("(a"), UnclosedGroup);
        assert_eq!(error_kind("()"), EmptyGroup);
        assert_eq!(error_kind("(?<1>a)"), InvalidGroupName);
        assert_eq!(
            error_kind("(?x:a)(?x:b)"),
            DuplicateGroupName("x".to_string())
        );
        assert_eq!(error_kind("a b"), ReservedSpace);
        assert_eq!(error_kind("!"), ExpectedExpression);

        let error = parse_default("ab)").unwrap_err();
        assert_eq!(error.position, 2);
        assert_eq!(error.to_string(), "syntax error at position 2: unmatched `)`");
    }
}
