use langrex_automata::Slots;
use std::ops::Range;

/// The span of a capture group in a haystack.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Match<'h> {
    haystack: &'h str,
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    /// Byte offset of the first character.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset just past the last character.
    pub fn end(&self) -> usize {
        self.end
    }

    /// `start()..end()`
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the group matched the empty string.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched text.
    pub fn as_str(&self) -> &'h str {
        &self.haystack[self.range()]
    }
}

/// The capture groups of a successful match. Group 0 is the whole haystack.
#[derive(Clone, Debug)]
pub struct Captures<'h> {
    haystack: &'h str,
    slots: Slots,
    // name and index of every named group, in pattern order
    names: Vec<(String, usize)>,
}

impl<'h> Captures<'h> {
    pub(crate) fn new(haystack: &'h str, slots: Slots, names: Vec<(String, usize)>) -> Self {
        Self {
            haystack,
            slots,
            names,
        }
    }

    /// The span of group `index`, if that group took part in the match.
    pub fn get(&self, index: usize) -> Option<Match<'h>> {
        let start = (*self.slots.get(2 * index)?)?;
        let end = (*self.slots.get(2 * index + 1)?)?;
        Some(Match {
            haystack: self.haystack,
            start,
            end,
        })
    }

    /// The span of the first group called `name` that took part in the match.
    pub fn name(&self, name: &str) -> Option<Match<'h>> {
        self.names
            .iter()
            .filter(|(n, _)| n == name)
            .find_map(|&(_, index)| self.get(index))
    }

    /// Number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    /// Always false: group 0 is always present.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every group in order, `None` for groups that did not take part in the match.
    pub fn iter(&self) -> impl Iterator<Item = Option<Match<'h>>> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }
}
