//! Execution order for the positions that survived graph checks
//!
//! Kahn-style readiness over parent→child edges. A position is ready when it
//! has no parent, or its parent is already settled (created or failed before
//! scheduling). Among ready positions the lowest input index goes first.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::graph::TempIdGraph;

/// Orders every position for which `excluded` is false
///
/// Every scheduled position with a scheduled parent appears strictly after
/// that parent. `excluded` must cover every cyclic position; acyclic
/// subgraphs always drain completely.
pub fn schedule(graph: &TempIdGraph, excluded: &[bool]) -> Vec<usize> {
    let n = graph.len();
    let is_clear = |p: usize| !excluded.get(p).copied().unwrap_or(false);

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
        .filter(|&p| is_clear(p))
        .filter(|&p| graph.parent(p).map_or(true, |parent| !is_clear(parent)))
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(position)) = ready.pop() {
        order.push(position);
        for child in graph.children(position) {
            if is_clear(child) {
                ready.push(Reverse(child));
            }
        }
    }

    order
}
