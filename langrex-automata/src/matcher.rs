//! Full-string matching with capture groups, by simulating the NFA on all paths at once.
//!
//! Each thread carries its own capture slots. Threads are kept in priority order and a state
//! is claimed by the first thread that reaches it at a given position, so the surviving
//! captures are those of the highest priority path: left alternatives and loop continuations
//! first. Along one path, a group that is entered several times keeps its last span.

use crate::alphabet::Context;
use crate::nfa::{Edge, Nfa, StateID};

/// Capture slots: `slots[2 * i]` and `slots[2 * i + 1]` are the byte offsets where group `i`
/// starts and ends. Group 0 is the whole match.
pub type Slots = Vec<Option<usize>>;

struct Threads {
    seen: Vec<bool>,
    list: Vec<(StateID, Slots)>,
}

impl Threads {
    fn new(states: usize) -> Self {
        Self {
            seen: vec![false; states],
            list: Vec::new(),
        }
    }

    fn clear(&mut self) {
        for (state, _) in self.list.drain(..) {
            self.seen[state] = false;
        }
    }

    /// Adds `state` and everything reachable from it without consuming input.
    fn add(
        &mut self,
        nfa: &Nfa,
        state: StateID,
        slots: Slots,
        position: usize,
        before: Context,
        after: Context,
    ) {
        let mut stack = vec![(state, slots)];

        while let Some((state, slots)) = stack.pop() {
            if self.seen[state] {
                continue;
            }
            self.seen[state] = true;

            // reversed, so the first edge is explored first
            for edge in nfa.state(state).edges.iter().rev() {
                match *edge {
                    Edge::Epsilon(target) => stack.push((target, slots.clone())),
                    Edge::Assert(anchor, target) if anchor.holds(before, after) => {
                        stack.push((target, slots.clone()))
                    }
                    Edge::Open(group, target) => {
                        let mut slots = slots.clone();
                        slots[2 * group] = Some(position);
                        stack.push((target, slots));
                    }
                    Edge::Close(group, target) => {
                        let mut slots = slots.clone();
                        slots[2 * group + 1] = Some(position);
                        stack.push((target, slots));
                    }
                    Edge::Before(context, target) if context == before => {
                        stack.push((target, slots.clone()))
                    }
                    Edge::After(context, target) if context == after => {
                        stack.push((target, slots.clone()))
                    }
                    Edge::Assert(..) | Edge::Before(..) | Edge::After(..) | Edge::Class(..) => {}
                }
            }

            self.list.push((state, slots));
        }
    }
}

/// Matches the whole of `haystack`, returning the capture slots of the preferred match.
pub fn full_match(nfa: &Nfa, haystack: &str) -> Option<Slots> {
    let mut current = Threads::new(nfa.states().len());
    let mut next = Threads::new(nfa.states().len());

    let context_at = |position: usize| {
        haystack[position..]
            .chars()
            .next()
            .map_or(Context::Edge, Context::of)
    };

    let slots = vec![None; 2 * (nfa.captures() + 1)];
    current.add(nfa, nfa.start(), slots, 0, Context::Edge, context_at(0));

    for (position, c) in haystack.char_indices() {
        if current.list.is_empty() {
            break;
        }

        let after_position = position + c.len_utf8();
        let after = context_at(after_position);
        for (state, slots) in &current.list {
            for edge in &nfa.state(*state).edges {
                if let Edge::Class(class, target) = edge {
                    if class.contains(c) {
                        next.add(
                            nfa,
                            *target,
                            slots.clone(),
                            after_position,
                            Context::of(c),
                            after,
                        );
                    }
                }
            }
        }

        current.clear();
        std::mem::swap(&mut current, &mut next);
    }

    let (_, mut slots) = current
        .list
        .into_iter()
        .find(|(state, _)| *state == nfa.accept())?;
    slots[0] = Some(0);
    slots[1] = Some(haystack.len());
    log::trace!("matched {haystack:?}: {slots:?}");
    Some(slots)
}
