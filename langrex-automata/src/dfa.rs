//! Complete deterministic automata over an [`Alphabet`] of atoms, and the language algebra on
//! them.

use crate::alphabet::{Alphabet, CharKind, Context};
use crate::nfa::{Edge, Nfa, StateID};
use crate::{Limits, Resource, ResourceLimitError};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::hash::Hash;

/// How the acceptance of two automata combines in a product.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    AndNot,
    Xor,
}

impl BoolOp {
    pub fn apply(self, l: bool, r: bool) -> bool {
        match self {
            BoolOp::And => l && r,
            BoolOp::AndNot => l && !r,
            BoolOp::Xor => l != r,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfaState {
    pub accepting: bool,
    /// The successor for every atom of the alphabet.
    pub next: Vec<StateID>,
}

/// A deterministic automaton with a transition for every state and every atom.
///
/// Rejection is explicit: there is a dead state that is not accepting and only loops to
/// itself, which is what lets [`Dfa::complement`] simply flip acceptance.
#[derive(Debug, Clone)]
pub struct Dfa {
    alphabet: Alphabet,
    states: Vec<DfaState>,
    start: StateID,
}

impl Dfa {
    /// Subset construction.
    ///
    /// `alphabet` must refine every class in `nfa`. Every state remembers what kind of
    /// character preceded it, so assertions are decided exactly while following the epsilon
    /// closure. The operand is treated as a whole text: it starts and ends at an edge.
    pub fn determinize(
        nfa: &Nfa,
        alphabet: &Alphabet,
        limits: &Limits,
    ) -> Result<Dfa, ResourceLimitError> {
        Self::determinize_between(nfa, alphabet, Context::Edge, Context::Edge, limits)
    }

    /// Subset construction for the strings `nfa` accepts when they are read with `entry` on
    /// their left and `exit` on their right.
    pub fn determinize_between(
        nfa: &Nfa,
        alphabet: &Alphabet,
        entry: Context,
        exit: Context,
        limits: &Limits,
    ) -> Result<Dfa, ResourceLimitError> {
        let dead = (Vec::new(), Context::Edge);
        let start = (vec![nfa.start()], entry);

        let states = explore(start, limits.dfa_states(), |(set, before)| {
            if set.is_empty() {
                return (false, vec![dead.clone(); alphabet.len()]);
            }

            let accepting = nfa
                .closure(set, *before, exit)
                .contains(&nfa.accept());

            let mut targets = vec![BTreeSet::new(); alphabet.len()];
            for kind in [CharKind::Newline, CharKind::Word, CharKind::Other] {
                for state in nfa.closure(set, *before, Context::Char(kind)) {
                    for edge in &nfa.state(state).edges {
                        let Edge::Class(class, target) = edge else {
                            continue;
                        };
                        for atom in alphabet.atoms_of(class) {
                            if alphabet.kind(atom) == kind {
                                targets[atom].insert(*target);
                            }
                        }
                    }
                }
            }

            let next = targets
                .into_iter()
                .enumerate()
                .map(|(atom, targets)| {
                    if targets.is_empty() {
                        dead.clone()
                    } else {
                        let after = Context::Char(alphabet.kind(atom));
                        (targets.into_iter().collect(), after)
                    }
                })
                .collect();
            (accepting, next)
        })?;

        log::debug!(
            "determinized {} NFA states into {} DFA states over {} atoms",
            nfa.states().len(),
            states.len(),
            alphabet.len()
        );
        Ok(Dfa {
            alphabet: alphabet.clone(),
            states,
            start: 0,
        })
    }

    /// The synchronized product of two automata over the same alphabet.
    pub fn product(
        l: &Dfa,
        r: &Dfa,
        op: BoolOp,
        limits: &Limits,
    ) -> Result<Dfa, ResourceLimitError> {
        debug_assert_eq!(l.alphabet, r.alphabet);

        let states = explore((l.start, r.start), limits.dfa_states(), |&(p, q)| {
            let (p, q) = (&l.states[p], &r.states[q]);
            let accepting = op.apply(p.accepting, q.accepting);
            let next = p.next.iter().copied().zip(q.next.iter().copied()).collect();
            (accepting, next)
        })?;

        Ok(Dfa {
            alphabet: l.alphabet.clone(),
            states,
            start: 0,
        })
    }

    pub fn complement(mut self) -> Dfa {
        for state in &mut self.states {
            state.accepting = !state.accepting;
        }
        self
    }

    /// Merges equivalent states by Moore's partition refinement.
    pub fn minimize(&self) -> Dfa {
        let mut block: Vec<usize> = self
            .states
            .iter()
            .map(|state| usize::from(state.accepting))
            .collect();
        let mut blocks = 0;

        loop {
            let mut ids = HashMap::new();
            let refined: Vec<usize> = self
                .states
                .iter()
                .enumerate()
                .map(|(state, dfa_state)| {
                    let signature = (
                        block[state],
                        dfa_state.next.iter().map(|&t| block[t]).collect::<Vec<_>>(),
                    );
                    let fresh = ids.len();
                    *ids.entry(signature).or_insert(fresh)
                })
                .collect();

            let stable = ids.len() == blocks;
            blocks = ids.len();
            block = refined;
            if stable {
                break;
            }
        }

        let mut states = vec![None; blocks];
        for (state, dfa_state) in self.states.iter().enumerate() {
            states[block[state]].get_or_insert_with(|| DfaState {
                accepting: dfa_state.accepting,
                next: dfa_state.next.iter().map(|&t| block[t]).collect(),
            });
        }

        let minimized = Dfa {
            alphabet: self.alphabet.clone(),
            states: states.into_iter().flatten().collect(),
            start: block[self.start],
        };
        log::trace!(
            "minimized {} DFA states to {}",
            self.states.len(),
            minimized.len()
        );
        minimized
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub fn start(&self) -> StateID {
        self.start
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States from which an accepting state can be reached.
    pub fn live_states(&self) -> Vec<bool> {
        let mut predecessors = vec![Vec::new(); self.states.len()];
        for (state, dfa_state) in self.states.iter().enumerate() {
            for &target in &dfa_state.next {
                predecessors[target].push(state);
            }
        }

        let mut live: Vec<bool> = self.states.iter().map(|s| s.accepting).collect();
        let mut queue: VecDeque<StateID> = (0..self.states.len()).filter(|&s| live[s]).collect();
        while let Some(state) = queue.pop_front() {
            for &pred in &predecessors[state] {
                if !live[pred] {
                    live[pred] = true;
                    queue.push_back(pred);
                }
            }
        }
        live
    }

    fn reachable_states(&self) -> impl Iterator<Item = &DfaState> {
        let mut seen = vec![false; self.states.len()];
        let mut stack = vec![self.start];
        seen[self.start] = true;
        while let Some(state) = stack.pop() {
            for &target in &self.states[state].next {
                if !seen[target] {
                    seen[target] = true;
                    stack.push(target);
                }
            }
        }

        self.states
            .iter()
            .zip(seen)
            .filter_map(|(state, seen)| seen.then_some(state))
    }

    /// Whether the language has no strings at all.
    pub fn matches_nothing(&self) -> bool {
        !self.reachable_states().any(|state| state.accepting)
    }

    /// Whether the language contains every string.
    pub fn matches_everything(&self) -> bool {
        self.reachable_states().all(|state| state.accepting)
    }

    pub fn matches_empty(&self) -> bool {
        self.states[self.start].accepting
    }

    pub fn accepts(&self, text: &str) -> bool {
        let state = text.chars().fold(self.start, |state, c| {
            self.states[state].next[self.alphabet.atom_of_char(c)]
        });
        self.states[state].accepting
    }
}

/// Breadth-first construction of a complete automaton whose states are identified by keys.
///
/// `expand` returns whether a state accepts and the key of its successor for every atom.
/// The start key becomes state 0.
fn explore<K: Clone + Eq + Hash>(
    start: K,
    limit: usize,
    mut expand: impl FnMut(&K) -> (bool, Vec<K>),
) -> Result<Vec<DfaState>, ResourceLimitError> {
    let mut ids = HashMap::from([(start.clone(), 0)]);
    let mut keys = vec![start];
    let mut states = Vec::new();

    while states.len() < keys.len() {
        let (accepting, successors) = expand(&keys[states.len()]);

        let mut next = Vec::with_capacity(successors.len());
        for key in successors {
            let id = match ids.get(&key) {
                Some(&id) => id,
                None => {
                    let id = keys.len();
                    if id >= limit {
                        return Err(ResourceLimitError {
                            resource: Resource::DfaStates,
                            limit,
                        });
                    }
                    ids.insert(key.clone(), id);
                    keys.push(key);
                    id
                }
            };
            next.push(id);
        }

        states.push(DfaState { accepting, next });
    }

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_pattern;

    fn nfa(pattern: &str) -> Nfa {
        Nfa::build(&parse_pattern(pattern).unwrap(), &Limits::default()).unwrap()
    }

    fn determinized(pattern: &str) -> Dfa {
        let nfa = nfa(pattern);
        let alphabet = Alphabet::new(nfa.classes());
        Dfa::determinize(&nfa, &alphabet, &Limits::default()).unwrap()
    }

    fn product(l: &str, r: &str, op: BoolOp) -> Dfa {
        let (l, r) = (nfa(l), nfa(r));
        let alphabet = Alphabet::new(l.classes().chain(r.classes()));
        let l = Dfa::determinize(&l, &alphabet, &Limits::default()).unwrap();
        let r = Dfa::determinize(&r, &alphabet, &Limits::default()).unwrap();
        Dfa::product(&l, &r, op, &Limits::default()).unwrap()
    }

    #[test]
    fn determinized_matching() {
        let dfa = determinized("a(b|c)*d");
        assert!(dfa.accepts("ad"));
        assert!(dfa.accepts("abcbd"));
        assert!(!dfa.accepts("abc"));
        assert!(!dfa.accepts("xd"));
        assert!(!dfa.matches_empty());
    }

    #[test]
    fn anchors_are_exact() {
        let dfa = determinized("\\w+\\b\\W*");
        assert!(dfa.accepts("abc"));
        assert!(dfa.accepts("abc--"));

        let dfa = determinized("a\\bb");
        assert!(dfa.matches_nothing());

        let dfa = determinized("a$\\x0A^b");
        assert!(dfa.accepts("a\nb"));
    }

    #[test]
    fn complete_and_complemented() {
        let dfa = determinized("ab");
        for state in dfa.states() {
            assert_eq!(state.next.len(), dfa.alphabet().len());
        }

        let complement = dfa.complement();
        assert!(!complement.accepts("ab"));
        assert!(complement.accepts(""));
        assert!(complement.accepts("abc"));
        assert!(complement.accepts("zzz"));
    }

    #[test]
    fn products() {
        let both = product("a*", "aa*", BoolOp::And);
        assert!(both.accepts("aaa"));
        assert!(!both.accepts(""));

        let diff = product("a*", "aa*", BoolOp::AndNot);
        assert!(diff.accepts(""));
        assert!(!diff.accepts("a"));

        let xor = product("a|b", "b|c", BoolOp::Xor);
        assert!(xor.accepts("a"));
        assert!(xor.accepts("c"));
        assert!(!xor.accepts("b"));

        assert!(product("a", "b", BoolOp::And).matches_nothing());
    }

    #[test]
    fn minimization() {
        let dfa = determinized("(a|b)*abb");
        let minimized = dfa.minimize();
        // four states of the textbook automaton plus the dead state
        assert_eq!(minimized.len(), 5);
        for text in ["abb", "aabb", "babb", "ab", "", "abba"] {
            assert_eq!(dfa.accepts(text), minimized.accepts(text), "{text:?}");
        }
    }

    #[test]
    fn universality() {
        assert!(determinized("\\@").matches_everything());
        assert!(determinized(".*").matches_everything());
        assert!(!determinized(".+").matches_everything());
        assert!(determinized("\\#").matches_nothing());
        assert!(determinized("\\e").matches_empty());
    }

    #[test]
    fn liveness() {
        let dfa = determinized("ab").minimize();
        let live = dfa.live_states();
        assert!(live[dfa.start()]);
        assert_eq!(live.iter().filter(|&&live| !live).count(), 1);
    }

    #[test]
    fn state_limit() {
        let nfa = nfa("(a|b)*a(a|b){8}");
        let alphabet = Alphabet::new(nfa.classes());
        let limits = Limits::default().with_dfa_states(64);
        let error = Dfa::determinize(&nfa, &alphabet, &limits).unwrap_err();
        assert_eq!(error.resource, Resource::DfaStates);
    }
}
