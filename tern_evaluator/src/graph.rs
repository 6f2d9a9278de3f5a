//! An explicit record of which request asked for which, for debugging.
//!
//! The evaluator only builds this when asked to; normally the shape of the
//! computation lives nowhere but on the call stack.

use fxhash::{FxBuildHasher, FxHashMap};
use indexmap::IndexSet;
use std::fmt::{self, Write};

use crate::any_request::AnyRequest;

struct Node {
    request: AnyRequest,
    /// Indices of the requests this one evaluated, in first-seen order.
    dependencies: IndexSet<usize, FxBuildHasher>,
}

#[derive(Default)]
pub(crate) struct DependencyGraph {
    indices: FxHashMap<AnyRequest, usize>,
    nodes: Vec<Node>,
}

impl DependencyGraph {
    fn node(&mut self, request: AnyRequest) -> usize {
        if let Some(&index) = self.indices.get(&request) {
            return index;
        }

        let index = self.nodes.len();
        self.indices.insert(request.clone(), index);
        self.nodes.push(Node {
            request,
            dependencies: IndexSet::default(),
        });
        index
    }

    /// Adds `request` as a root, if it is not already known.
    pub(crate) fn add_request(&mut self, request: AnyRequest) {
        self.node(request);
    }

    /// Records that `parent` evaluated `child`.
    pub(crate) fn add_dependency(&mut self, parent: AnyRequest, child: AnyRequest) {
        let parent = self.node(parent);
        let child = self.node(child);
        self.nodes[parent].dependencies.insert(child);
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Renders everything reachable from `root` as an indented tree. Edges
    /// back into the current path are marked instead of followed.
    pub(crate) fn dump(&self, root: &AnyRequest) -> String {
        let mut out = String::new();
        // Writing to a `String` cannot fail.
        let _ = self.write_tree(root, &mut out);
        out
    }

    fn write_tree(&self, root: &AnyRequest, out: &mut String) -> fmt::Result {
        writeln!(out, "{}", root)?;

        if let Some(&index) = self.indices.get(root) {
            let mut path = vec![index];
            self.write_dependencies(index, "", &mut path, out)?;
        }

        Ok(())
    }

    fn write_dependencies(
        &self,
        index: usize,
        prefix: &str,
        path: &mut Vec<usize>,
        out: &mut String,
    ) -> fmt::Result {
        let dependencies = &self.nodes[index].dependencies;

        for (position, &dependency) in dependencies.iter().enumerate() {
            let last = position + 1 == dependencies.len();
            let (branch, indent) = if last {
                ("`-- ", "    ")
            } else {
                ("|-- ", "|   ")
            };

            write!(out, "{}{}{}", prefix, branch, self.nodes[dependency].request)?;

            if path.contains(&dependency) {
                writeln!(out, " (cyclic dependency)")?;
                continue;
            }

            writeln!(out)?;
            path.push(dependency);
            self.write_dependencies(dependency, &format!("{}{}", prefix, indent), path, out)?;
            path.pop();
        }

        Ok(())
    }

    /// Renders the whole graph in the Graphviz `dot` language.
    pub(crate) fn graphviz(&self) -> String {
        let mut out = String::new();
        let _ = self.write_graphviz(&mut out);
        out
    }

    fn write_graphviz(&self, out: &mut String) -> fmt::Result {
        writeln!(out, "digraph Dependencies {{")?;

        for (index, node) in self.nodes.iter().enumerate() {
            writeln!(
                out,
                "  request_{} [label=\"{}\"];",
                index,
                escape_label(&node.request.to_string())
            )?;
        }

        for (index, node) in self.nodes.iter().enumerate() {
            for dependency in &node.dependencies {
                writeln!(out, "  request_{} -> request_{};", index, dependency)?;
            }
        }

        writeln!(out, "}}")
    }
}

fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());

    for c in label.chars() {
        match c {
            '"' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            },
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_requests::{Product, Sum};

    fn sum(a: i64, b: i64) -> AnyRequest {
        AnyRequest::new(Sum::new((a, b)))
    }

    #[test]
    fn dump_draws_a_tree() {
        let mut graph = DependencyGraph::default();
        graph.add_dependency(sum(0, 3), sum(0, 2));
        graph.add_dependency(sum(0, 2), sum(0, 1));
        graph.add_dependency(sum(0, 3), AnyRequest::new(Product::new((2, 2))));
        // Repeated edges are only drawn once.
        graph.add_dependency(sum(0, 3), sum(0, 2));

        assert_eq!(
            graph.dump(&sum(0, 3)),
            "Sum(0, 3)\n\
             |-- Sum(0, 2)\n\
             |   `-- Sum(0, 1)\n\
             `-- Product(2, 2)\n"
        );
    }

    #[test]
    fn dump_marks_cycles() {
        let mut graph = DependencyGraph::default();
        graph.add_dependency(sum(1, 0), sum(2, 0));
        graph.add_dependency(sum(2, 0), sum(1, 0));

        assert_eq!(
            graph.dump(&sum(1, 0)),
            "Sum(1, 0)\n\
             `-- Sum(2, 0)\n    \
                 `-- Sum(1, 0) (cyclic dependency)\n"
        );
    }

    #[test]
    fn unknown_roots_have_no_dependencies() {
        let graph = DependencyGraph::default();
        assert_eq!(graph.dump(&sum(1, 1)), "Sum(1, 1)\n");
    }

    #[test]
    fn graphviz_lists_nodes_then_edges() {
        let mut graph = DependencyGraph::default();
        graph.add_dependency(sum(1, 2), sum(3, 4));
        graph.add_request(sum(5, 6));

        assert_eq!(
            graph.graphviz(),
            "digraph Dependencies {\n  \
               request_0 [label=\"Sum(1, 2)\"];\n  \
               request_1 [label=\"Sum(3, 4)\"];\n  \
               request_2 [label=\"Sum(5, 6)\"];\n  \
               request_0 -> request_1;\n\
             }\n"
        );
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape_label(r#"Lookup("x\y")"#), r#"Lookup(\"x\\y\")"#);
    }
}
