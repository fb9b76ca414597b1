//! Sets of code points: the symbols that patterns and automata are built from.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter, Write};
use std::sync::OnceLock;

/// The largest Unicode scalar value.
pub const MAX_CODE_POINT: u32 = 0x10FFFF;

// Every simply-cased character lives below this code point.
const CASED_LIMIT: u32 = 0x1FFFF;

/// A set of code points, stored as sorted, disjoint and non-adjacent inclusive ranges.
///
/// Classes are closed under union, intersection, difference and negation (relative to the
/// whole code point space), which the automaton algebra relies on when it partitions the
/// alphabet.
#[derive(Hash, Debug, Clone, PartialEq, Eq, Default)]
pub struct CharClass {
    ranges: Vec<(u32, u32)>,
}

impl CharClass {
    /// The class without members. As a pattern it denotes the empty language `\#`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every code point, the class of `.`.
    pub fn any() -> Self {
        Self {
            ranges: vec![(0, MAX_CODE_POINT)],
        }
    }

    pub fn single(c: char) -> Self {
        Self {
            ranges: vec![(c as u32, c as u32)],
        }
    }

    pub fn range(lo: char, hi: char) -> Self {
        Self::from_ranges([(lo as u32, hi as u32)])
    }

    /// Builds a class from arbitrary (possibly overlapping, unsorted) inclusive ranges.
    /// Ranges with `lo > hi` are ignored.
    pub fn from_ranges(ranges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut ranges: Vec<_> = ranges
            .into_iter()
            .map(|(lo, hi)| (lo, hi.min(MAX_CODE_POINT)))
            .filter(|(lo, hi)| lo <= hi)
            .collect();
        ranges.sort_unstable();

        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        Self { ranges: merged }
    }

    /// `\d`: the ASCII digits.
    pub fn digit() -> Self {
        Self::from_ranges([(0x30, 0x39)])
    }

    /// `\w`: ASCII letters, digits and the underscore.
    pub fn word() -> Self {
        Self::from_ranges([(0x30, 0x39), (0x41, 0x5A), (0x5F, 0x5F), (0x61, 0x7A)])
    }

    /// `\s`: tab, line feed, vertical tab, form feed, carriage return and space.
    pub fn space() -> Self {
        Self::from_ranges([(0x09, 0x0D), (0x20, 0x20)])
    }

    pub fn newline() -> Self {
        Self::single('\n')
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn is_any(&self) -> bool {
        self.ranges == [(0, MAX_CODE_POINT)]
    }

    /// Number of code points in the class.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|&(lo, hi)| u64::from(hi - lo) + 1)
            .sum()
    }

    /// Returns the only member if the class has exactly one.
    pub fn as_single(&self) -> Option<char> {
        match self.ranges.as_slice() {
            [(lo, hi)] if lo == hi => char::from_u32(*lo),
            _ => None,
        }
    }

    pub fn contains(&self, c: char) -> bool {
        self.contains_code(c as u32)
    }

    pub fn contains_code(&self, code: u32) -> bool {
        let idx = self.ranges.partition_point(|&(_, hi)| hi < code);
        self.ranges.get(idx).is_some_and(|&(lo, _)| lo <= code)
    }

    pub fn union(&self, other: &CharClass) -> CharClass {
        Self::from_ranges(self.ranges.iter().chain(&other.ranges).copied())
    }

    /// The complement relative to all code points.
    pub fn negate(&self) -> CharClass {
        let mut ranges = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                ranges.push((next, lo - 1));
            }
            next = hi + 1;
        }
        if next <= MAX_CODE_POINT {
            ranges.push((next, MAX_CODE_POINT));
        }
        Self { ranges }
    }

    pub fn intersection(&self, other: &CharClass) -> CharClass {
        self.negate().union(&other.negate()).negate()
    }

    pub fn difference(&self, other: &CharClass) -> CharClass {
        self.intersection(&other.negate())
    }

    /// Adds every character that equals a member up to case.
    ///
    /// Two characters are equal up to case when a chain of simple lower- and uppercase
    /// mappings leads from one to the other, so `s`, `S` and `ſ` all fold together.
    /// Only mappings to a single character count, so `ß` does not fold to `SS`.
    pub fn case_fold(&self) -> CharClass {
        if self.is_empty() || self.is_any() {
            return self.clone();
        }

        let variants = case_orbits()
            .iter()
            .filter(|&(&code, _)| self.contains_code(code))
            .flat_map(|(_, orbit)| orbit.iter().map(|&variant| (variant, variant)));
        Self::from_ranges(self.ranges.iter().copied().chain(variants))
    }
}

/// For every cased character, all characters equal to it up to case, itself included.
fn case_orbits() -> &'static HashMap<u32, Vec<u32>> {
    static ORBITS: OnceLock<HashMap<u32, Vec<u32>>> = OnceLock::new();
    ORBITS.get_or_init(|| {
        let mut neighbours: HashMap<u32, Vec<u32>> = HashMap::new();
        for c in (0..=CASED_LIMIT).filter_map(char::from_u32) {
            for variant in simple_case_variants(c) {
                neighbours.entry(c as u32).or_default().push(variant as u32);
                neighbours.entry(variant as u32).or_default().push(c as u32);
            }
        }

        let mut orbits = HashMap::new();
        for &code in neighbours.keys() {
            if orbits.contains_key(&code) {
                continue;
            }

            let mut orbit = vec![code];
            let mut next = 0;
            while let Some(&member) = orbit.get(next) {
                for &variant in &neighbours[&member] {
                    if !orbit.contains(&variant) {
                        orbit.push(variant);
                    }
                }
                next += 1;
            }

            orbit.sort_unstable();
            for &member in &orbit {
                orbits.insert(member, orbit.clone());
            }
        }
        orbits
    })
}

fn simple_case_variants(c: char) -> impl Iterator<Item = char> {
    let mut lower = c.to_lowercase();
    let mut upper = c.to_uppercase();
    let lower = if lower.len() == 1 { lower.next() } else { None };
    let upper = if upper.len() == 1 { upper.next() } else { None };
    lower.into_iter().chain(upper).filter(move |&v| v != c)
}

/// Characters that must be escaped with a backslash to be matched literally.
pub(crate) const SPECIAL: &[char] = &[
    '.', '^', '$', '|', '&', '-', '!', '*', '+', '?', '{', '}', '(', ')', '~', '%', ' ', '\\',
];

pub(crate) fn is_special(c: char) -> bool {
    SPECIAL.contains(&c)
}

/// Writes `c` in a form the parser reads back as that character.
pub(crate) fn write_escaped(f: &mut impl Write, c: char) -> fmt::Result {
    match c {
        c if is_special(c) => write!(f, "\\{c}"),
        c if c.is_control() => match c as u32 {
            code if code <= 0xFF => write!(f, "\\x{code:02X}"),
            code if code <= 0xFFFF => write!(f, "\\u{code:04X}"),
            code => write!(f, "\\U{code:08X}"),
        },
        c => f.write_char(c),
    }
}

// Classes larger than this are not spelled out as an alternation.
const MAX_SPELLED_MEMBERS: u64 = 64;

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "\\#");
        }
        if self.is_any() {
            return write!(f, ".");
        }
        if let Some(c) = self.as_single() {
            return write_escaped(f, c);
        }

        let named = [
            (Self::digit(), "\\d"),
            (Self::space(), "\\s"),
            (Self::word(), "\\w"),
        ];
        for (class, name) in &named {
            if self == class {
                return write!(f, "{name}");
            }
            if *self == class.negate() {
                return write!(f, "{}", name.to_uppercase());
            }
        }

        if self.len() <= MAX_SPELLED_MEMBERS {
            // the parser has no bracket syntax, so small classes become an alternation
            write!(f, "(?:")?;
            let members = self
                .ranges
                .iter()
                .flat_map(|&(lo, hi)| lo..=hi)
                .filter_map(char::from_u32);
            for (i, c) in members.enumerate() {
                if i > 0 {
                    write!(f, "|")?;
                }
                write_escaped(f, c)?;
            }
            return write!(f, ")");
        }

        write!(f, "[")?;
        for &(lo, hi) in &self.ranges {
            if lo == hi {
                write!(f, "{lo:#X}")?;
            } else {
                write!(f, "{lo:#X}-{hi:#X}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_ranges() {
        let class = CharClass::from_ranges([(5, 9), (0, 2), (3, 4), (20, 10)]);
        assert_eq!(class.ranges(), &[(0, 9)]);

        let class = CharClass::from_ranges([(10, 20), (0, 3), (15, 30)]);
        assert_eq!(class.ranges(), &[(0, 3), (10, 30)]);
    }

    #[test]
    fn membership() {
        let word = CharClass::word();
        assert!(word.contains('a'));
        assert!(word.contains('Z'));
        assert!(word.contains('_'));
        assert!(word.contains('7'));
        assert!(!word.contains('-'));
        assert!(!word.contains('é'));

        assert!(CharClass::space().contains('\n'));
        assert!(!CharClass::empty().contains('a'));
        assert!(CharClass::any().contains('\u{10FFFF}'));
    }

    #[test]
    fn negation_is_involutive() {
        let digit = CharClass::digit();
        let not_digit = digit.negate();
        assert!(!not_digit.contains('5'));
        assert!(not_digit.contains('a'));
        assert!(not_digit.contains('\0'));
        assert_eq!(not_digit.negate(), digit);

        assert!(CharClass::empty().negate().is_any());
        assert!(CharClass::any().negate().is_empty());
    }

    #[test]
    fn set_algebra() {
        let a_to_m = CharClass::range('a', 'm');
        let h_to_z = CharClass::range('h', 'z');

        assert_eq!(a_to_m.intersection(&h_to_z), CharClass::range('h', 'm'));
        assert_eq!(a_to_m.difference(&h_to_z), CharClass::range('a', 'g'));
        assert_eq!(a_to_m.union(&h_to_z), CharClass::range('a', 'z'));
        assert!(CharClass::digit().intersection(&CharClass::space()).is_empty());
        assert_eq!(CharClass::range('a', 'z').len(), 26);
    }

    #[test]
    fn case_folding() {
        let folded = CharClass::single('k').case_fold();
        assert!(folded.contains('k'));
        assert!(folded.contains('K'));

        let folded = CharClass::single('Σ').case_fold();
        assert!(folded.contains('σ'));

        assert_eq!(CharClass::single('7').case_fold(), CharClass::single('7'));
        assert!(CharClass::word().case_fold().contains('A'));
    }

    #[test]
    fn case_folding_follows_chains_of_mappings() {
        const LONG_S: char = '\u{17F}';
        const KELVIN: char = '\u{212A}';

        for c in ['s', 'S', LONG_S] {
            let folded = CharClass::single(c).case_fold();
            for variant in ['s', 'S', LONG_S] {
                assert!(folded.contains(variant), "{c:?} should fold to {variant:?}");
            }
        }
        for c in ['k', 'K', KELVIN] {
            let folded = CharClass::single(c).case_fold();
            for variant in ['k', 'K', KELVIN] {
                assert!(folded.contains(variant), "{c:?} should fold to {variant:?}");
            }
        }

        let folded = CharClass::single('ς').case_fold();
        assert!(folded.contains('σ'));
        assert!(folded.contains('Σ'));

        let not_word = CharClass::word().negate().case_fold();
        for c in ['s', 'S', 'k', 'K'] {
            assert!(not_word.contains(c), "{c:?}");
        }
        assert!(!not_word.contains('a'));
    }

    #[test]
    fn case_folding_is_symmetric() {
        let sample: Vec<char> = "aAsSkKıIiİσςΣßẞǅǄǆ\u{17F}\u{212A}\u{1E9E}".chars().collect();
        for &a in &sample {
            let folded = CharClass::single(a).case_fold();
            assert_eq!(folded.case_fold(), folded, "{a:?}");
            for &b in &sample {
                assert_eq!(
                    folded.contains(b),
                    CharClass::single(b).case_fold().contains(a),
                    "{a:?} and {b:?}"
                );
            }
        }
    }

    #[test]
    fn display() {
        assert_eq!(CharClass::empty().to_string(), "\\#");
        assert_eq!(CharClass::any().to_string(), ".");
        assert_eq!(CharClass::single('a').to_string(), "a");
        assert_eq!(CharClass::single('|').to_string(), "\\|");
        assert_eq!(CharClass::single(' ').to_string(), "\\ ");
        assert_eq!(CharClass::single('\n').to_string(), "\\x0A");
        assert_eq!(CharClass::digit().to_string(), "\\d");
        assert_eq!(CharClass::word().negate().to_string(), "\\W");
        assert_eq!(CharClass::range('a', 'c').to_string(), "(?:a|b|c)");
    }
}
