//! Partitioning of the code point space into atoms.
//!
//! Deterministic automata cannot have one transition per code point, so before determinizing
//! we cut the code point space at every boundary of every class that occurs in the automaton.
//! Every class is then exactly a union of atoms, and all members of an atom behave the same
//! in every transition and every zero-width assertion.

use crate::charclass::{CharClass, MAX_CODE_POINT};
use std::collections::BTreeSet;

pub type AtomID = usize;

/// How a character looks to the zero-width assertions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CharKind {
    Newline,
    Word,
    Other,
}

impl CharKind {
    pub fn of(c: char) -> Self {
        Self::of_code(c as u32)
    }

    pub fn of_code(code: u32) -> Self {
        match code {
            0x0A => CharKind::Newline,
            0x30..=0x39 | 0x41..=0x5A | 0x5F | 0x61..=0x7A => CharKind::Word,
            _ => CharKind::Other,
        }
    }
}

/// What lies on one side of a position in the input: the edge of the text or a character.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Context {
    Edge,
    Char(CharKind),
}

impl Context {
    pub const ALL: [Context; 4] = [
        Context::Edge,
        Context::Char(CharKind::Newline),
        Context::Char(CharKind::Word),
        Context::Char(CharKind::Other),
    ];

    pub fn of(c: char) -> Self {
        Context::Char(CharKind::of(c))
    }

    pub fn is_word(self) -> bool {
        self == Context::Char(CharKind::Word)
    }

    pub fn is_newline(self) -> bool {
        self == Context::Char(CharKind::Newline)
    }
}

/// A partition of all code points into consecutive atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    // first code point of every atom, strictly increasing, starting at 0
    starts: Vec<u32>,
}

impl Alphabet {
    /// The coarsest partition that refines every given class, the word class and the newline.
    pub fn new<'a>(classes: impl IntoIterator<Item = &'a CharClass>) -> Self {
        let mut bounds = BTreeSet::from([0]);
        let mut cut = |class: &CharClass| {
            for &(lo, hi) in class.ranges() {
                bounds.insert(lo);
                if hi < MAX_CODE_POINT {
                    bounds.insert(hi + 1);
                }
            }
        };

        cut(&CharClass::word());
        cut(&CharClass::newline());
        for class in classes {
            cut(class);
        }

        Self {
            starts: bounds.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn atoms(&self) -> impl Iterator<Item = AtomID> {
        0..self.starts.len()
    }

    pub fn atom_of(&self, code: u32) -> AtomID {
        // starts[0] == 0, so the partition point is at least 1
        self.starts.partition_point(|&start| start <= code) - 1
    }

    pub fn atom_of_char(&self, c: char) -> AtomID {
        self.atom_of(c as u32)
    }

    /// The inclusive code point range an atom covers.
    pub fn atom_range(&self, atom: AtomID) -> (u32, u32) {
        let hi = self
            .starts
            .get(atom + 1)
            .map_or(MAX_CODE_POINT, |next| next - 1);
        (self.starts[atom], hi)
    }

    pub fn kind(&self, atom: AtomID) -> CharKind {
        CharKind::of_code(self.starts[atom])
    }

    /// The atoms a class consists of. Only meaningful for classes this partition refines.
    pub fn atoms_of<'a>(&'a self, class: &'a CharClass) -> impl Iterator<Item = AtomID> + 'a {
        class
            .ranges()
            .iter()
            .flat_map(|&(lo, hi)| self.atom_of(lo)..=self.atom_of(hi))
    }

    pub fn class_of_atoms(&self, atoms: impl IntoIterator<Item = AtomID>) -> CharClass {
        CharClass::from_ranges(atoms.into_iter().map(|atom| self.atom_range(atom)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_refine_classes() {
        let ab = CharClass::range('a', 'b');
        let bz = CharClass::range('b', 'z');
        let alphabet = Alphabet::new([&ab, &bz]);

        for class in [&ab, &bz] {
            let atoms: Vec<_> = alphabet.atoms_of(class).collect();
            assert_eq!(&alphabet.class_of_atoms(atoms), class);
        }

        assert_ne!(alphabet.atom_of_char('a'), alphabet.atom_of_char('b'));
        assert_eq!(alphabet.atom_of_char('c'), alphabet.atom_of_char('y'));
    }

    #[test]
    fn atoms_cover_everything() {
        let alphabet = Alphabet::new(&[] as &[CharClass]);
        assert_eq!(alphabet.atom_of(0), 0);
        assert_eq!(alphabet.atom_range(alphabet.len() - 1).1, MAX_CODE_POINT);

        let all = alphabet.class_of_atoms(alphabet.atoms());
        assert!(all.is_any());
    }

    #[test]
    fn atoms_have_a_single_kind() {
        let alphabet = Alphabet::new([&CharClass::any()]);
        for atom in alphabet.atoms() {
            let (lo, hi) = alphabet.atom_range(atom);
            assert_eq!(CharKind::of_code(lo), CharKind::of_code(hi));
        }
        assert_eq!(alphabet.kind(alphabet.atom_of_char('\n')), CharKind::Newline);
        assert_eq!(alphabet.kind(alphabet.atom_of_char('q')), CharKind::Word);
        assert_eq!(alphabet.kind(alphabet.atom_of_char('-')), CharKind::Other);
    }
}
