use crate::dfa::Dfa;
use crate::nfa::{Edge, Nfa};
use std::collections::BTreeMap;
use std::io;
use std::io::Write;

fn escape(label: impl ToString) -> String {
    label.to_string().replace('\\', "\\\\").replace('"', "\\\"")
}

impl Nfa {
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;
        writeln!(w, "start[shape=point] start -> id{}", self.start())?;

        for (src, state) in self.states().iter().enumerate() {
            let attrs = if src == self.accept() {
                ", shape=doublecircle"
            } else {
                ""
            };
            writeln!(w, "node[label=\"{src}\"{attrs}] id{src}")?;

            for edge in &state.edges {
                let label = match edge {
                    Edge::Class(class, _) => escape(class),
                    Edge::Epsilon(_) => "ε".to_string(),
                    Edge::Assert(anchor, _) => escape(anchor),
                    Edge::Open(group, _) => format!("({group}"),
                    Edge::Close(group, _) => format!("){group}"),
                    Edge::Before(context, _) => format!("before {context:?}"),
                    Edge::After(context, _) => format!("after {context:?}"),
                };
                writeln!(w, "id{src} -> id{} [label=\"{label}\"]", edge.target())?;
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}

impl Dfa {
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;
        writeln!(w, "start[shape=point] start -> id{}", self.start())?;

        for (src, state) in self.states().iter().enumerate() {
            let attrs = if state.accepting {
                ", shape=doublecircle"
            } else {
                ""
            };
            writeln!(w, "node[label=\"{src}\"{attrs}] id{src}")?;

            let mut by_target: BTreeMap<_, Vec<_>> = BTreeMap::new();
            for (atom, &target) in state.next.iter().enumerate() {
                by_target.entry(target).or_default().push(atom);
            }
            for (tgt, atoms) in by_target {
                let class = self.alphabet().class_of_atoms(atoms);
                writeln!(w, "id{src} -> id{tgt} [label=\"{}\"]", escape(class))?;
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}
