use crate::alphabet::Context;
use crate::charclass::CharClass;
use std::fmt::{self, Display, Formatter};
use std::mem;
use std::sync::{Arc, OnceLock};

/// Zero-width assertions.
#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// `^`: start of the text or just after a newline.
    StartLine,
    /// `$`: end of the text or just before a newline.
    EndLine,
    /// `\A`
    StartText,
    /// `\Z`
    EndText,
    /// `\b`
    WordBoundary,
    /// `\B`
    NotWordBoundary,
}

impl Anchor {
    /// Whether the assertion holds at a position with `before` on its left and `after` on its
    /// right.
    pub fn holds(self, before: Context, after: Context) -> bool {
        match self {
            Anchor::StartLine => before == Context::Edge || before.is_newline(),
            Anchor::EndLine => after == Context::Edge || after.is_newline(),
            Anchor::StartText => before == Context::Edge,
            Anchor::EndText => after == Context::Edge,
            Anchor::WordBoundary => before.is_word() != after.is_word(),
            Anchor::NotWordBoundary => before.is_word() == after.is_word(),
        }
    }
}

impl Display for Anchor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Anchor::StartLine => "^",
            Anchor::EndLine => "$",
            Anchor::StartText => "\\A",
            Anchor::EndText => "\\Z",
            Anchor::WordBoundary => "\\b",
            Anchor::NotWordBoundary => "\\B",
        };
        write!(f, "{repr}")
    }
}

#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    /// A capturing group with its 1-based index and optional name.
    Capture { index: usize, name: Option<String> },
    NonCapture,
}

/// The set operators that discard capture groups.
#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq)]
pub enum Operator {
    Intersection,
    Difference,
    Xor,
    Complement,
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Intersection => write!(f, "intersection (`&`)"),
            Operator::Difference => write!(f, "difference (`-`)"),
            Operator::Xor => write!(f, "symmetric difference (`^`)"),
            Operator::Complement => write!(f, "complement (`!`)"),
        }
    }
}

/// A pattern: an immutable tree describing a regular language.
///
/// Subtrees are shared through [`Arc`], so combining patterns never copies or mutates the
/// operands.
///
/// `Display` writes pattern syntax that parses back to an equal pattern, with two exceptions.
/// The opt-in operators print as `^` and `%`, which only read back as operators with the
/// matching [`SyntaxOptions`](crate::SyntaxOptions) switched on. A class of more than 64
/// characters that is neither `.` nor a named class such as `\w` prints as a list of code point
/// ranges, `[0X41-0X5A]`, which the syntax has no way to read.
#[derive(Hash, Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// The empty string, `\e`.
    Empty,
    /// One character out of the class. The empty class is the empty language, `\#`.
    Literal(CharClass),
    /// Every string, `\@`.
    Everything,
    Anchor(Anchor),
    /// `(?#...)`, matches the empty string.
    Comment(String),
    /// A sequence matched one item after the other.
    Concat(Vec<Arc<Pattern>>),
    /// Alternatives, in order of preference.
    Or(Vec<Arc<Pattern>>),
    And(Arc<Pattern>, Arc<Pattern>),
    Difference(Arc<Pattern>, Arc<Pattern>),
    Xor(Arc<Pattern>, Arc<Pattern>),
    Complement(Arc<Pattern>),
    Star(Arc<Pattern>),
    Plus(Arc<Pattern>),
    Optional(Arc<Pattern>),
    /// Between `min` and `max` repetitions; `max == None` is unbounded.
    Repeat {
        inner: Arc<Pattern>,
        min: u32,
        max: Option<u32>,
    },
    /// `a % b`: one or more `a`, separated by `b`.
    Separated(Arc<Pattern>, Arc<Pattern>),
    Group {
        inner: Arc<Pattern>,
        kind: GroupKind,
    },
    /// `~a`: `a` with every character class matching case-insensitively.
    CaseInsensitive(Arc<Pattern>),
}

/// A capturing group found in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureGroup<'a> {
    pub index: usize,
    pub name: Option<&'a str>,
    pub inner: &'a Arc<Pattern>,
    /// The outermost set operator this group sits under, if any. Such groups never capture.
    pub discarded_by: Option<Operator>,
}

impl Pattern {
    pub fn literal(c: char) -> Pattern {
        Pattern::Literal(CharClass::single(c))
    }

    pub fn nothing() -> Pattern {
        Pattern::Literal(CharClass::empty())
    }

    /// The concatenation of `items`, splicing in the items of nested sequences.
    pub fn concat(items: impl IntoIterator<Item = Arc<Pattern>>) -> Pattern {
        let items = flatten(items, |pattern| match pattern {
            Pattern::Concat(items) => Some(items),
            _ => None,
        });
        match items.len() {
            0 => Pattern::Empty,
            1 => unwrap_single(items),
            _ => Pattern::Concat(items),
        }
    }

    /// The union of `items`, splicing in the alternatives of nested unions.
    pub fn union(items: impl IntoIterator<Item = Arc<Pattern>>) -> Pattern {
        let items = flatten(items, |pattern| match pattern {
            Pattern::Or(items) => Some(items),
            _ => None,
        });
        match items.len() {
            0 => Pattern::nothing(),
            1 => unwrap_single(items),
            _ => Pattern::Or(items),
        }
    }

    /// The set operator at the root of this pattern, if it is one.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Pattern::And(..) => Some(Operator::Intersection),
            Pattern::Difference(..) => Some(Operator::Difference),
            Pattern::Xor(..) => Some(Operator::Xor),
            Pattern::Complement(_) => Some(Operator::Complement),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&Arc<Pattern>> {
        match self {
            Pattern::Empty
            | Pattern::Literal(_)
            | Pattern::Everything
            | Pattern::Anchor(_)
            | Pattern::Comment(_) => vec![],
            Pattern::Concat(items) | Pattern::Or(items) => items.iter().collect(),
            Pattern::And(l, r)
            | Pattern::Difference(l, r)
            | Pattern::Xor(l, r)
            | Pattern::Separated(l, r) => vec![l, r],
            Pattern::Complement(i)
            | Pattern::Star(i)
            | Pattern::Plus(i)
            | Pattern::Optional(i)
            | Pattern::CaseInsensitive(i)
            | Pattern::Repeat { inner: i, .. }
            | Pattern::Group { inner: i, .. } => vec![i],
        }
    }

    /// All capturing groups, in the left-to-right order of their opening parenthesis.
    pub fn capture_groups(&self) -> Vec<CaptureGroup<'_>> {
        let mut groups = Vec::new();
        let mut stack = vec![(self, None)];
        while let Some((pattern, discarded_by)) = stack.pop() {
            if let Pattern::Group {
                inner,
                kind: GroupKind::Capture { index, name },
            } = pattern
            {
                groups.push(CaptureGroup {
                    index: *index,
                    name: name.as_deref(),
                    inner,
                    discarded_by,
                });
            }

            let discarded_by = discarded_by.or(pattern.operator());
            stack.extend(
                pattern
                    .children()
                    .into_iter()
                    .rev()
                    .map(|child| (child.as_ref(), discarded_by)),
            );
        }
        groups
    }

    /// The number of levels in the tree; a leaf has height 1.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut stack = vec![(self, 1)];
        while let Some((pattern, depth)) = stack.pop() {
            height = height.max(depth);
            stack.extend(
                pattern
                    .children()
                    .into_iter()
                    .map(|child| (child.as_ref(), depth + 1)),
            );
        }
        height
    }

    // moves the children out, leaving shared placeholders behind
    fn take_children(&mut self) -> Vec<Arc<Pattern>> {
        match self {
            Pattern::Empty
            | Pattern::Literal(_)
            | Pattern::Everything
            | Pattern::Anchor(_)
            | Pattern::Comment(_) => vec![],
            Pattern::Concat(items) | Pattern::Or(items) => mem::take(items),
            Pattern::And(l, r)
            | Pattern::Difference(l, r)
            | Pattern::Xor(l, r)
            | Pattern::Separated(l, r) => {
                vec![mem::replace(l, placeholder()), mem::replace(r, placeholder())]
            }
            Pattern::Complement(i)
            | Pattern::Star(i)
            | Pattern::Plus(i)
            | Pattern::Optional(i)
            | Pattern::CaseInsensitive(i)
            | Pattern::Repeat { inner: i, .. }
            | Pattern::Group { inner: i, .. } => vec![mem::replace(i, placeholder())],
        }
    }

    /// The largest capture index in the pattern, or 0 without capture groups.
    pub fn max_capture_index(&self) -> usize {
        self.capture_groups()
            .iter()
            .map(|group| group.index)
            .max()
            .unwrap_or(0)
    }

    /// A copy of this pattern with every capture index mapped through `f`.
    pub fn map_captures(self: &Arc<Self>, f: &impl Fn(usize) -> usize) -> Arc<Pattern> {
        if self.capture_groups().is_empty() {
            return self.clone();
        }

        let pattern = match self.as_ref() {
            Pattern::Empty
            | Pattern::Literal(_)
            | Pattern::Everything
            | Pattern::Anchor(_)
            | Pattern::Comment(_) => return self.clone(),
            Pattern::Concat(items) => {
                Pattern::Concat(items.iter().map(|item| item.map_captures(f)).collect())
            }
            Pattern::Or(items) => {
                Pattern::Or(items.iter().map(|item| item.map_captures(f)).collect())
            }
            Pattern::And(l, r) => Pattern::And(l.map_captures(f), r.map_captures(f)),
            Pattern::Difference(l, r) => {
                Pattern::Difference(l.map_captures(f), r.map_captures(f))
            }
            Pattern::Xor(l, r) => Pattern::Xor(l.map_captures(f), r.map_captures(f)),
            Pattern::Separated(l, r) => Pattern::Separated(l.map_captures(f), r.map_captures(f)),
            Pattern::Complement(i) => Pattern::Complement(i.map_captures(f)),
            Pattern::Star(i) => Pattern::Star(i.map_captures(f)),
            Pattern::Plus(i) => Pattern::Plus(i.map_captures(f)),
            Pattern::Optional(i) => Pattern::Optional(i.map_captures(f)),
            Pattern::CaseInsensitive(i) => Pattern::CaseInsensitive(i.map_captures(f)),
            Pattern::Repeat { inner, min, max } => Pattern::Repeat {
                inner: inner.map_captures(f),
                min: *min,
                max: *max,
            },
            Pattern::Group { inner, kind } => Pattern::Group {
                inner: inner.map_captures(f),
                kind: match kind {
                    GroupKind::Capture { index, name } => GroupKind::Capture {
                        index: f(*index),
                        name: name.clone(),
                    },
                    GroupKind::NonCapture => GroupKind::NonCapture,
                },
            },
        };
        Arc::new(pattern)
    }

    /// Shifts every capture index up by `offset`.
    pub fn shift_captures(self: &Arc<Self>, offset: usize) -> Arc<Pattern> {
        if offset == 0 {
            return self.clone();
        }
        self.map_captures(&|index| index + offset)
    }

    /// Renumbers the capture groups so the first one has index 1.
    pub fn renumber_captures(self: &Arc<Self>) -> Arc<Pattern> {
        match self.capture_groups().iter().map(|group| group.index).min() {
            Some(first) if first > 1 => self.map_captures(&|index| index - (first - 1)),
            _ => self.clone(),
        }
    }

    // binding strength, used to decide where `Display` needs parentheses
    fn precedence(&self) -> u8 {
        match self {
            Pattern::Concat(items) | Pattern::Or(items) if items.is_empty() => 6,
            Pattern::Or(..) | Pattern::Xor(..) => 0,
            Pattern::And(..) | Pattern::Difference(..) => 1,
            Pattern::Separated(..) => 2,
            Pattern::Concat(..) => 3,
            Pattern::Complement(_) | Pattern::CaseInsensitive(_) => 4,
            Pattern::Star(_) | Pattern::Plus(_) | Pattern::Optional(_) | Pattern::Repeat { .. } => 5,
            Pattern::Empty
            | Pattern::Literal(_)
            | Pattern::Everything
            | Pattern::Anchor(_)
            | Pattern::Comment(_)
            | Pattern::Group { .. } => 6,
        }
    }
}

impl Drop for Pattern {
    // iterative, so that dropping a deep tree does not recurse once per level
    fn drop(&mut self) {
        let mut stack = self.take_children();
        while let Some(child) = stack.pop() {
            if let Some(mut pattern) = Arc::into_inner(child) {
                stack.extend(pattern.take_children());
            }
        }
    }
}

fn placeholder() -> Arc<Pattern> {
    static EMPTY: OnceLock<Arc<Pattern>> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::new(Pattern::Empty)).clone()
}

fn flatten(
    items: impl IntoIterator<Item = Arc<Pattern>>,
    nested: fn(&Pattern) -> Option<&Vec<Arc<Pattern>>>,
) -> Vec<Arc<Pattern>> {
    let mut flat = Vec::new();
    for item in items {
        if let Some(inner) = nested(item.as_ref()) {
            flat.extend(inner.iter().cloned());
            continue;
        }
        flat.push(item);
    }
    flat
}

fn unwrap_single(items: Vec<Arc<Pattern>>) -> Pattern {
    let item = items.into_iter().next().unwrap_or_else(placeholder);
    Arc::try_unwrap(item).unwrap_or_else(|shared| Pattern::clone(&shared))
}

struct Operand<'a>(&'a Pattern, u8);

impl Display for Operand<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Operand(pattern, min) = *self;
        if pattern.precedence() < min {
            write!(f, "(?:{pattern})")
        } else {
            write!(f, "{pattern}")
        }
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Empty => write!(f, "\\e"),
            Pattern::Literal(class) => write!(f, "{class}"),
            Pattern::Everything => write!(f, "\\@"),
            Pattern::Anchor(anchor) => write!(f, "{anchor}"),
            Pattern::Comment(text) => write!(f, "(?#{text})"),
            Pattern::Concat(items) if items.is_empty() => write!(f, "\\e"),
            Pattern::Or(items) if items.is_empty() => write!(f, "\\#"),
            Pattern::Or(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", Operand(item, 0))?;
                    } else {
                        write!(f, "|{}", Operand(item, 1))?;
                    }
                }
                Ok(())
            }
            Pattern::Xor(l, r) => write!(f, "{}^{}", Operand(l, 0), Operand(r, 1)),
            Pattern::And(l, r) => write!(f, "{}&{}", Operand(l, 1), Operand(r, 2)),
            Pattern::Difference(l, r) => write!(f, "{}-{}", Operand(l, 1), Operand(r, 2)),
            Pattern::Separated(l, r) => write!(f, "{}%{}", Operand(l, 2), Operand(r, 3)),
            Pattern::Concat(items) => items
                .iter()
                .try_for_each(|item| write!(f, "{}", Operand(item, 4))),
            Pattern::Complement(i) => write!(f, "!{}", Operand(i, 4)),
            Pattern::CaseInsensitive(i) => write!(f, "~{}", Operand(i, 4)),
            Pattern::Star(i) => write!(f, "{}*", Operand(i, 5)),
            Pattern::Plus(i) => write!(f, "{}+", Operand(i, 5)),
            Pattern::Optional(i) => write!(f, "{}?", Operand(i, 5)),
            Pattern::Repeat { inner, min, max } => {
                write!(f, "{}", Operand(inner, 5))?;
                match (min, max) {
                    (min, Some(max)) if min == max => write!(f, "{{{min}}}"),
                    (min, None) => write!(f, "{{{min},}}"),
                    (0, Some(max)) => write!(f, "{{,{max}}}"),
                    (min, Some(max)) => write!(f, "{{{min},{max}}}"),
                }
            }
            Pattern::Group { inner, kind } => match kind {
                GroupKind::Capture { name: None, .. } => write!(f, "({inner})"),
                GroupKind::Capture {
                    name: Some(name), ..
                } => write!(f, "(?P<{name}>{inner})"),
                GroupKind::NonCapture => write!(f, "(?:{inner})"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::CharKind;
    use crate::{parse_pattern, parse_pattern_with, SyntaxOptions};

    #[test]
    fn anchors() {
        let word = Context::Char(CharKind::Word);
        let newline = Context::Char(CharKind::Newline);
        let other = Context::Char(CharKind::Other);

        assert!(Anchor::StartLine.holds(Context::Edge, word));
        assert!(Anchor::StartLine.holds(newline, word));
        assert!(!Anchor::StartText.holds(newline, word));
        assert!(Anchor::EndLine.holds(word, newline));
        assert!(!Anchor::EndText.holds(word, newline));
        assert!(Anchor::WordBoundary.holds(Context::Edge, word));
        assert!(Anchor::WordBoundary.holds(word, other));
        assert!(!Anchor::WordBoundary.holds(other, Context::Edge));
        assert!(Anchor::NotWordBoundary.holds(word, word));
    }

    #[test]
    fn capture_groups_in_order() {
        let pattern = parse_pattern("(a(?x:b))(?:c)(d)").unwrap();
        let groups = pattern.capture_groups();
        let summary: Vec<_> = groups.iter().map(|g| (g.index, g.name)).collect();
        assert_eq!(summary, vec![(1, None), (2, Some("x")), (3, None)]);
        assert_eq!(pattern.max_capture_index(), 3);
    }

    #[test]
    fn discarded_groups() {
        let pattern = parse_pattern("(a)&(b)|(c)").unwrap();
        let groups = pattern.capture_groups();
        assert_eq!(groups[0].discarded_by, Some(Operator::Intersection));
        assert_eq!(groups[1].discarded_by, Some(Operator::Intersection));
        assert_eq!(groups[2].discarded_by, None);

        let pattern = parse_pattern("!(a)").unwrap();
        assert_eq!(
            pattern.capture_groups()[0].discarded_by,
            Some(Operator::Complement)
        );
    }

    #[test]
    fn renumbering() {
        let pattern = Arc::new(parse_pattern("(a)(?n:b)").unwrap());
        let shifted = pattern.shift_captures(3);
        let indices: Vec<_> = shifted.capture_groups().iter().map(|g| g.index).collect();
        assert_eq!(indices, vec![4, 5]);
        assert_eq!(shifted.capture_groups()[1].name, Some("n"));

        let back = shifted.renumber_captures();
        assert_eq!(back, pattern);
    }

    #[test]
    fn display_round_trips() {
        for source in [
            "ab|c",
            "a(b|c)*",
            "(?:a|b)&c-d",
            "!a*",
            "~(?P<name>x)y",
            "a{3}b{2,}c{,4}d{1,5}",
            "\\A\\d+\\Z",
            "a(?#note)b",
            "\\@\\#\\e",
            "\\.\\ \\-",
        ] {
            let pattern = parse_pattern(source).unwrap();
            let printed = pattern.to_string();
            assert_eq!(parse_pattern(&printed).unwrap(), pattern, "{source} printed as {printed}");
        }
    }

    #[test]
    fn opt_in_operators_print_back_with_their_options() {
        let options = SyntaxOptions::new()
            .with_xor(true)
            .with_separated_repeat(true);
        for source in ["a^b|c", "(?:a|b)^c", "a%,^b"] {
            let pattern = parse_pattern_with(source, &options).unwrap();
            let printed = pattern.to_string();
            assert_eq!(
                parse_pattern_with(&printed, &options).unwrap(),
                pattern,
                "{source} printed as {printed}"
            );
        }

        // without the option the caret reads as an anchor
        let xor = parse_pattern_with("a^b", &options).unwrap();
        assert_ne!(parse_pattern(&xor.to_string()).unwrap(), xor);
    }

    #[test]
    fn sequences_and_unions_flatten() {
        let ab = Arc::new(parse_pattern("ab").unwrap());
        let cd = Arc::new(parse_pattern("cd").unwrap());
        let joined = Pattern::concat([ab.clone(), cd.clone()]);
        assert_eq!(joined, parse_pattern("abcd").unwrap());
        assert_eq!(joined.height(), 2);

        let either = Pattern::union([
            Arc::new(parse_pattern("a|b").unwrap()),
            Arc::new(parse_pattern("c").unwrap()),
        ]);
        assert_eq!(either, parse_pattern("a|b|c").unwrap());
        assert_eq!(either.to_string(), "a|b|c");

        assert_eq!(Pattern::concat([ab.clone()]), *ab);
        assert_eq!(Pattern::concat(Vec::<Arc<Pattern>>::new()), Pattern::Empty);
        assert_eq!(Pattern::union(Vec::<Arc<Pattern>>::new()), Pattern::nothing());
    }

    #[test]
    fn deep_trees_drop_without_recursing() {
        let mut pattern = Pattern::literal('a');
        for _ in 0..200_000 {
            pattern = Pattern::Star(Arc::new(pattern));
        }
        assert_eq!(pattern.height(), 200_001);
        assert!(pattern.capture_groups().is_empty());
        drop(pattern);
    }
}
