//! TempId dependency graph for one batch
//!
//! Nodes are batch positions (node index `i` is request `i`); an edge points
//! from a parent's position to each child's position. Every node has at most
//! one incoming edge because a request names at most one parent.
//! Uses petgraph for storage and traversal.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::domain::TempId;

use super::request::BatchItemRequest;

/// A `parentTempId` that no request in the batch declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReference {
    pub position: usize,
    pub parent_temp_id: TempId,
}

/// Result of cycle detection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CyclePartition {
    /// Positions that sit on a cycle themselves
    pub on_cycle: Vec<usize>,
    /// Positions below a cycle (descendants of a cyclic position, not on one)
    pub below_cycle: Vec<usize>,
}

#[cfg(test)]
impl CyclePartition {
    pub fn is_empty(&self) -> bool {
        self.on_cycle.is_empty() && self.below_cycle.is_empty()
    }

    /// Every cyclic position, ascending
    pub fn cyclic(&self) -> Vec<usize> {
        let mut all: Vec<usize> = self.on_cycle.iter().chain(&self.below_cycle).copied().collect();
        all.sort_unstable();
        all
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Parent/child graph over batch positions
#[derive(Debug)]
pub struct TempIdGraph {
    graph: DiGraph<usize, ()>,
    unknown: Vec<UnknownReference>,
}

impl TempIdGraph {
    /// Builds the graph from raw requests
    ///
    /// If a tempId is declared more than once the last declaration wins;
    /// batches are validated against duplicates before they get here.
    pub fn build(requests: &[BatchItemRequest]) -> Self {
        let mut graph = DiGraph::with_capacity(requests.len(), requests.len());
        for position in 0..requests.len() {
            graph.add_node(position);
        }

        let declared: HashMap<&TempId, usize> = requests
            .iter()
            .enumerate()
            .filter_map(|(position, r)| r.temp_id.as_ref().map(|t| (t, position)))
            .collect();

        let mut unknown = Vec::new();

        for (position, request) in requests.iter().enumerate() {
            let Some(parent_temp_id) = &request.parent_temp_id else {
                continue;
            };

            match declared.get(parent_temp_id) {
                Some(&parent) => {
                    graph.add_edge(NodeIndex::new(parent), NodeIndex::new(position), ());
                }
                None => unknown.push(UnknownReference {
                    position,
                    parent_temp_id: parent_temp_id.clone(),
                }),
            }
        }

        Self { graph, unknown }
    }

    /// Number of positions in the batch
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Positions whose parent reference did not resolve
    pub fn unknown_references(&self) -> &[UnknownReference] {
        &self.unknown
    }

    /// The parent position of a request, if its reference resolved
    pub fn parent(&self, position: usize) -> Option<usize> {
        self.graph
            .neighbors_directed(NodeIndex::new(position), Direction::Incoming)
            .next()
            .map(|idx| idx.index())
    }

    /// Direct children of a position, ascending
    pub fn children(&self, position: usize) -> Vec<usize> {
        let mut children: Vec<usize> = self
            .graph
            .neighbors_directed(NodeIndex::new(position), Direction::Outgoing)
            .map(|idx| idx.index())
            .collect();
        children.sort_unstable();
        children
    }

    /// Three-color depth-first search over parent→child edges
    ///
    /// A back-edge to a gray node closes a cycle; every node on the current
    /// path from that node down is on the cycle. Descendants of any cyclic
    /// node are then collected so they fail with it.
    pub fn find_cycles(&self) -> CyclePartition {
        let n = self.len();
        let mut color = vec![Color::White; n];
        let mut on_cycle = vec![false; n];

        for root in 0..n {
            if color[root] != Color::White {
                continue;
            }

            // (node, children, next child to visit); the stack is the gray path
            let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(root, self.children(root), 0)];
            color[root] = Color::Gray;

            while let Some((node, children, next)) = stack.last_mut() {
                let node = *node;
                if *next >= children.len() {
                    color[node] = Color::Black;
                    stack.pop();
                    continue;
                }

                let child = children[*next];
                *next += 1;

                match color[child] {
                    Color::White => {
                        color[child] = Color::Gray;
                        stack.push((child, self.children(child), 0));
                    }
                    Color::Gray => {
                        if let Some(start) = stack.iter().position(|(n, _, _)| *n == child) {
                            for (member, _, _) in &stack[start..] {
                                on_cycle[*member] = true;
                            }
                        }
                    }
                    Color::Black => {}
                }
            }
        }

        let mut cyclic = on_cycle.clone();
        for start in (0..n).filter(|&p| on_cycle[p]) {
            let mut dfs = Dfs::new(&self.graph, NodeIndex::new(start));
            while let Some(idx) = dfs.next(&self.graph) {
                cyclic[idx.index()] = true;
            }
        }

        CyclePartition {
            on_cycle: (0..n).filter(|&p| on_cycle[p]).collect(),
            below_cycle: (0..n).filter(|&p| cyclic[p] && !on_cycle[p]).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> BatchItemRequest {
        BatchItemRequest::task(name)
    }

    #[test]
    fn builds_parent_edges() {
        let requests = vec![
            task("Parent").with_temp_id("p"),
            task("Child").with_parent("p"),
            task("Loose"),
        ];
        let graph = TempIdGraph::build(&requests);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.parent(1), Some(0));
        assert_eq!(graph.parent(0), None);
        assert_eq!(graph.children(0), vec![1]);
        assert!(graph.unknown_references().is_empty());
    }

    #[test]
    fn child_may_precede_parent() {
        let requests = vec![task("Child").with_parent("p"), task("Parent").with_temp_id("p")];
        let graph = TempIdGraph::build(&requests);

        assert_eq!(graph.parent(0), Some(1));
    }

    #[test]
    fn unknown_parent_gets_no_edge() {
        let requests = vec![task("Valid"), task("Bad").with_parent("missing")];
        let graph = TempIdGraph::build(&requests);

        assert_eq!(graph.parent(1), None);
        assert_eq!(
            graph.unknown_references(),
            &[UnknownReference {
                position: 1,
                parent_temp_id: "missing".parse().unwrap(),
            }]
        );
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let requests = vec![
            task("A").with_temp_id("a"),
            task("B").with_temp_id("b").with_parent("a"),
            task("C").with_parent("b"),
            task("D").with_parent("a"),
        ];
        assert!(TempIdGraph::build(&requests).find_cycles().is_empty());
    }

    #[test]
    fn two_node_cycle() {
        let requests = vec![
            task("A").with_temp_id("a").with_parent("b"),
            task("B").with_temp_id("b").with_parent("a"),
        ];
        let cycles = TempIdGraph::build(&requests).find_cycles();

        assert_eq!(cycles.on_cycle, vec![0, 1]);
        assert!(cycles.below_cycle.is_empty());
    }

    #[test]
    fn self_reference_is_one_node_cycle() {
        let requests = vec![task("Self").with_temp_id("s").with_parent("s"), task("Other")];
        let cycles = TempIdGraph::build(&requests).find_cycles();

        assert_eq!(cycles.on_cycle, vec![0]);
        assert_eq!(cycles.cyclic(), vec![0]);
    }

    #[test]
    fn descendants_of_cycle_are_cyclic() {
        let requests = vec![
            task("A").with_temp_id("a").with_parent("c"),
            task("B").with_temp_id("b").with_parent("a"),
            task("C").with_temp_id("c").with_parent("b"),
            task("Child of B").with_temp_id("d").with_parent("b"),
            task("Grandchild").with_parent("d"),
            task("Unrelated").with_temp_id("u"),
            task("Unrelated child").with_parent("u"),
        ];
        let cycles = TempIdGraph::build(&requests).find_cycles();

        assert_eq!(cycles.on_cycle, vec![0, 1, 2]);
        assert_eq!(cycles.below_cycle, vec![3, 4]);
        assert_eq!(cycles.cyclic(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cycle_found_from_any_start() {
        // Root of the traversal is a descendant-free node outside the cycle
        let requests = vec![
            task("Outside"),
            task("X").with_temp_id("x").with_parent("y"),
            task("Y").with_temp_id("y").with_parent("x"),
        ];
        let cycles = TempIdGraph::build(&requests).find_cycles();
        assert_eq!(cycles.on_cycle, vec![1, 2]);
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut requests = vec![task("root").with_temp_id("0")];
        for i in 1..5000 {
            requests.push(
                task(&format!("n{}", i))
                    .with_temp_id(&i.to_string())
                    .with_parent(&(i - 1).to_string()),
            );
        }
        let graph = TempIdGraph::build(&requests);
        assert!(graph.find_cycles().is_empty());
    }
}
