//! Thompson construction of a pattern into a nondeterministic automaton.
//!
//! Capture groups become `Open`/`Close` edges and anchors become `Assert` edges; neither
//! consumes input. The order of the edges leaving a state is the priority used when matching:
//! earlier edges are preferred.
//!
//! Set operators have no direct Thompson construction. Their operands are compiled to
//! standalone automata, determinized over a shared [`Alphabet`], combined, minimized and
//! embedded back as a plain fragment without capture groups. When an operand contains
//! assertions, its language depends on the characters around the fragment, so one automaton is
//! built for every pair of surrounding contexts and each copy is guarded by `Before` and
//! `After` edges that only pass in those contexts.

use crate::alphabet::{Alphabet, Context};
use crate::charclass::CharClass;
use crate::dfa::{BoolOp, Dfa};
use crate::pattern::{Anchor, GroupKind, Pattern};
use crate::{Limits, Resource, ResourceLimitError};
use std::collections::BTreeMap;

pub type StateID = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    /// Consume one character of the class.
    Class(CharClass, StateID),
    Epsilon(StateID),
    /// Zero-width assertion on the characters around the current position.
    Assert(Anchor, StateID),
    /// Enter the capture group with this index.
    Open(usize, StateID),
    /// Leave the capture group with this index.
    Close(usize, StateID),
    /// Pass only where the character before the current position is of this context.
    Before(Context, StateID),
    /// Pass only where the character after the current position is of this context.
    After(Context, StateID),
}

impl Edge {
    pub fn target(&self) -> StateID {
        match self {
            Edge::Class(_, target)
            | Edge::Epsilon(target)
            | Edge::Assert(_, target)
            | Edge::Open(_, target)
            | Edge::Close(_, target)
            | Edge::Before(_, target)
            | Edge::After(_, target) => *target,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfaState {
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<NfaState>,
    start: StateID,
    accept: StateID,
    captures: usize,
}

impl Nfa {
    /// Compiles a pattern, keeping its capture groups.
    pub fn build(pattern: &Pattern, limits: &Limits) -> Result<Nfa, ResourceLimitError> {
        let limit = limits.nesting();
        if pattern.height() > limit {
            return Err(ResourceLimitError {
                resource: Resource::Nesting,
                limit,
            });
        }

        let nfa = NfaBuilder::new(limits, true).finish(pattern)?;
        log::debug!(
            "compiled {pattern} into an NFA with {} states",
            nfa.states.len()
        );
        Ok(nfa)
    }

    pub fn states(&self) -> &[NfaState] {
        &self.states
    }

    pub fn state(&self, id: StateID) -> &NfaState {
        &self.states[id]
    }

    pub fn start(&self) -> StateID {
        self.start
    }

    pub fn accept(&self) -> StateID {
        self.accept
    }

    /// The largest capture index, so capture slots run from 0 to this value inclusive.
    pub fn captures(&self) -> usize {
        self.captures
    }

    /// Every class that labels an edge.
    pub fn classes(&self) -> impl Iterator<Item = &CharClass> {
        self.states
            .iter()
            .flat_map(|state| &state.edges)
            .filter_map(|edge| match edge {
                Edge::Class(class, _) => Some(class),
                _ => None,
            })
    }

    /// Whether some path depends on the characters around a position.
    pub fn has_assertions(&self) -> bool {
        self.states
            .iter()
            .flat_map(|state| &state.edges)
            .any(|edge| matches!(edge, Edge::Assert(..) | Edge::Before(..) | Edge::After(..)))
    }

    /// All states reachable from `set` without consuming input, at a position with `before`
    /// on its left and `after` on its right.
    pub fn closure(&self, set: &[StateID], before: Context, after: Context) -> Vec<StateID> {
        let mut seen = vec![false; self.states.len()];
        let mut stack = set.to_vec();
        let mut closure = Vec::new();

        while let Some(state) = stack.pop() {
            if seen[state] {
                continue;
            }
            seen[state] = true;
            closure.push(state);

            for edge in &self.states[state].edges {
                match edge {
                    Edge::Epsilon(target) | Edge::Open(_, target) | Edge::Close(_, target) => {
                        stack.push(*target)
                    }
                    Edge::Assert(anchor, target) if anchor.holds(before, after) => {
                        stack.push(*target)
                    }
                    Edge::Before(context, target) if *context == before => stack.push(*target),
                    Edge::After(context, target) if *context == after => stack.push(*target),
                    Edge::Assert(..) | Edge::Before(..) | Edge::After(..) | Edge::Class(..) => {}
                }
            }
        }

        closure
    }
}

type Fragment = (StateID, StateID);

struct NfaBuilder<'l> {
    states: Vec<NfaState>,
    limits: &'l Limits,
    fold_case: bool,
    captures: bool,
}

impl<'l> NfaBuilder<'l> {
    fn new(limits: &'l Limits, captures: bool) -> Self {
        Self {
            states: Vec::new(),
            limits,
            fold_case: false,
            captures,
        }
    }

    fn finish(mut self, pattern: &Pattern) -> Result<Nfa, ResourceLimitError> {
        let (start, accept) = self.build(pattern)?;
        Ok(Nfa {
            states: self.states,
            start,
            accept,
            captures: if self.captures {
                pattern.max_capture_index()
            } else {
                0
            },
        })
    }

    fn add_state(&mut self) -> Result<StateID, ResourceLimitError> {
        let limit = self.limits.nfa_states();
        if self.states.len() >= limit {
            return Err(ResourceLimitError {
                resource: Resource::NfaStates,
                limit,
            });
        }

        self.states.push(NfaState::default());
        Ok(self.states.len() - 1)
    }

    fn add_edge(&mut self, from: StateID, edge: Edge) {
        self.states[from].edges.push(edge);
    }

    fn pair(&mut self) -> Result<Fragment, ResourceLimitError> {
        Ok((self.add_state()?, self.add_state()?))
    }

    fn build(&mut self, pattern: &Pattern) -> Result<Fragment, ResourceLimitError> {
        match pattern {
            Pattern::Empty | Pattern::Comment(_) => {
                let state = self.add_state()?;
                Ok((state, state))
            }
            Pattern::Literal(class) => {
                let (start, end) = self.pair()?;
                let class = if self.fold_case {
                    class.case_fold()
                } else {
                    class.clone()
                };
                if !class.is_empty() {
                    self.add_edge(start, Edge::Class(class, end));
                }
                Ok((start, end))
            }
            Pattern::Everything => {
                let (start, end) = self.pair()?;
                self.add_edge(start, Edge::Class(CharClass::any(), start));
                self.add_edge(start, Edge::Epsilon(end));
                Ok((start, end))
            }
            Pattern::Anchor(anchor) => {
                let (start, end) = self.pair()?;
                self.add_edge(start, Edge::Assert(*anchor, end));
                Ok((start, end))
            }
            Pattern::Concat(items) => {
                let start = self.add_state()?;
                let mut fragment = (start, start);
                for item in items {
                    let next = self.build(item)?;
                    fragment = self.concat(fragment, next);
                }
                Ok(fragment)
            }
            Pattern::Or(branches) => {
                let (start, end) = self.pair()?;
                for branch in branches {
                    let (s, e) = self.build(branch)?;
                    self.add_edge(start, Edge::Epsilon(s));
                    self.add_edge(e, Edge::Epsilon(end));
                }
                Ok((start, end))
            }
            Pattern::Star(inner) => {
                let inner = self.build(inner)?;
                self.star(inner)
            }
            Pattern::Plus(inner) => {
                let (s, e) = self.build(inner)?;
                let end = self.add_state()?;
                self.add_edge(e, Edge::Epsilon(s));
                self.add_edge(e, Edge::Epsilon(end));
                Ok((s, end))
            }
            Pattern::Optional(inner) => {
                let (start, end) = self.pair()?;
                let (s, e) = self.build(inner)?;
                self.add_edge(start, Edge::Epsilon(s));
                self.add_edge(start, Edge::Epsilon(end));
                self.add_edge(e, Edge::Epsilon(end));
                Ok((start, end))
            }
            Pattern::Repeat { inner, min, max } => self.repeat(inner, *min, *max),
            Pattern::Separated(item, separator) => {
                // a (b a)*
                let first = self.build(item)?;
                let sep = self.build(separator)?;
                let next = self.build(item)?;
                let tail = self.concat(sep, next);
                let tail = self.star(tail)?;
                Ok(self.concat(first, tail))
            }
            Pattern::Group {
                inner,
                kind: GroupKind::Capture { index, .. },
            } if self.captures => {
                let (start, end) = self.pair()?;
                let (s, e) = self.build(inner)?;
                self.add_edge(start, Edge::Open(*index, s));
                self.add_edge(e, Edge::Close(*index, end));
                Ok((start, end))
            }
            Pattern::Group { inner, .. } => self.build(inner),
            Pattern::CaseInsensitive(inner) => {
                let outer = std::mem::replace(&mut self.fold_case, true);
                let fragment = self.build(inner);
                self.fold_case = outer;
                fragment
            }
            Pattern::And(l, r) => self.combine(l, r, BoolOp::And),
            Pattern::Difference(l, r) => self.combine(l, r, BoolOp::AndNot),
            Pattern::Xor(l, r) => self.combine(l, r, BoolOp::Xor),
            Pattern::Complement(inner) => {
                let nfa = self.operand(inner)?;
                let alphabet = Alphabet::new(nfa.classes());
                let limits = self.limits;
                self.embed_language(nfa.has_assertions(), |entry, exit| {
                    let dfa = Dfa::determinize_between(&nfa, &alphabet, entry, exit, limits)?;
                    Ok(dfa.complement().minimize())
                })
            }
        }
    }

    fn concat(&mut self, (ls, le): Fragment, (rs, re): Fragment) -> Fragment {
        self.add_edge(le, Edge::Epsilon(rs));
        (ls, re)
    }

    fn star(&mut self, (s, e): Fragment) -> Result<Fragment, ResourceLimitError> {
        let (start, end) = self.pair()?;
        self.add_edge(start, Edge::Epsilon(s));
        self.add_edge(start, Edge::Epsilon(end));
        self.add_edge(e, Edge::Epsilon(start));
        Ok((start, end))
    }

    fn repeat(
        &mut self,
        inner: &Pattern,
        min: u32,
        max: Option<u32>,
    ) -> Result<Fragment, ResourceLimitError> {
        let start = self.add_state()?;
        let mut end = start;

        for _ in 0..min {
            let copy = self.build(inner)?;
            (_, end) = self.concat((start, end), copy);
        }

        match max {
            None => {
                let copy = self.build(inner)?;
                let rest = self.star(copy)?;
                (_, end) = self.concat((start, end), rest);
            }
            Some(max) if max > min => {
                let exit = self.add_state()?;
                for _ in min..max {
                    let (s, e) = self.build(inner)?;
                    self.add_edge(end, Edge::Epsilon(s));
                    self.add_edge(end, Edge::Epsilon(exit));
                    end = e;
                }
                self.add_edge(end, Edge::Epsilon(exit));
                end = exit;
            }
            Some(_) => {}
        }

        Ok((start, end))
    }

    /// Compiles a set operand on its own, without capture groups.
    fn operand(&self, pattern: &Pattern) -> Result<Nfa, ResourceLimitError> {
        let mut builder = NfaBuilder::new(self.limits, false);
        builder.fold_case = self.fold_case;
        builder.finish(pattern)
    }

    fn combine(
        &mut self,
        l: &Pattern,
        r: &Pattern,
        op: BoolOp,
    ) -> Result<Fragment, ResourceLimitError> {
        let l = self.operand(l)?;
        let r = self.operand(r)?;
        let alphabet = Alphabet::new(l.classes().chain(r.classes()));
        let contextual = l.has_assertions() || r.has_assertions();

        let limits = self.limits;
        self.embed_language(contextual, |entry, exit| {
            let l = Dfa::determinize_between(&l, &alphabet, entry, exit, limits)?;
            let r = Dfa::determinize_between(&r, &alphabet, entry, exit, limits)?;
            let dfa = Dfa::product(&l, &r, op, limits)?.minimize();
            log::debug!("{op:?} of {} and {} DFA states: {} states", l.len(), r.len(), dfa.len());
            Ok(dfa)
        })
    }

    /// Embeds the language `language(entry, exit)` describes between the contexts the fragment
    /// is entered and left in. Without assertions in the operands every pair of contexts gives
    /// the same language, so a single unguarded copy is enough.
    fn embed_language(
        &mut self,
        contextual: bool,
        language: impl Fn(Context, Context) -> Result<Dfa, ResourceLimitError>,
    ) -> Result<Fragment, ResourceLimitError> {
        let fragment = self.pair()?;
        if !contextual {
            let dfa = language(Context::Edge, Context::Edge)?;
            self.embed(&dfa, fragment, None)?;
            return Ok(fragment);
        }

        for entry in Context::ALL {
            for exit in Context::ALL {
                let dfa = language(entry, exit)?;
                self.embed(&dfa, fragment, Some((entry, exit)))?;
            }
        }
        Ok(fragment)
    }

    /// Copies the live part of a DFA between `start` and `end`, guarded by the entry and exit
    /// contexts in `guard`.
    fn embed(
        &mut self,
        dfa: &Dfa,
        (start, end): Fragment,
        guard: Option<(Context, Context)>,
    ) -> Result<(), ResourceLimitError> {
        let live = dfa.live_states();
        if !live[dfa.start()] {
            return Ok(());
        }

        let mut ids = vec![None; dfa.len()];
        for state in (0..dfa.len()).filter(|&state| live[state]) {
            ids[state] = Some(self.add_state()?);
        }

        for (state, dfa_state) in dfa.states().iter().enumerate() {
            let Some(from) = ids[state] else {
                continue;
            };

            let mut by_target: BTreeMap<StateID, Vec<usize>> = BTreeMap::new();
            for (atom, &target) in dfa_state.next.iter().enumerate() {
                if live[target] {
                    by_target.entry(target).or_default().push(atom);
                }
            }
            for (target, atoms) in by_target {
                if let Some(to) = ids[target] {
                    let class = dfa.alphabet().class_of_atoms(atoms);
                    self.add_edge(from, Edge::Class(class, to));
                }
            }

            if dfa_state.accepting {
                let exit = match guard {
                    Some((_, exit)) => Edge::After(exit, end),
                    None => Edge::Epsilon(end),
                };
                self.add_edge(from, exit);
            }
        }

        if let Some(first) = ids[dfa.start()] {
            let entry = match guard {
                Some((entry, _)) => Edge::Before(entry, first),
                None => Edge::Epsilon(first),
            };
            self.add_edge(start, entry);
        }
        Ok(())
    }
}
