// src/graph/cycles.rs
//! Dependency cycle detection.
//!
//! Depth-first search with a global visited set and a recursion stack, so
//! each node and edge is examined once. A back edge to a node on the stack
//! records the stack suffix from that node as one cycle.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::types::Cycle;

/// Finds cycles among `edges`. Each cycle starts at its lexicographically
/// smallest id, does not repeat the closing node, and appears once; the
/// result is sorted.
pub fn find_cycles<'a, I>(edges: I) -> Vec<Cycle>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (from, to) in edges {
        adjacency.entry(from).or_default().insert(to);
        adjacency.entry(to).or_default();
    }

    let mut state = DfsState {
        visited: HashSet::new(),
        on_stack: HashSet::new(),
        path: Vec::new(),
        cycles: BTreeSet::new(),
    };

    for &node in adjacency.keys() {
        if !state.visited.contains(node) {
            dfs(node, &adjacency, &mut state);
        }
    }

    state.cycles.into_iter().collect()
}

struct DfsState<'a> {
    visited: HashSet<&'a str>,
    on_stack: HashSet<&'a str>,
    path: Vec<&'a str>,
    cycles: BTreeSet<Cycle>,
}

fn dfs<'a>(node: &'a str, adjacency: &BTreeMap<&'a str, BTreeSet<&'a str>>, state: &mut DfsState<'a>) {
    state.visited.insert(node);
    state.on_stack.insert(node);
    state.path.push(node);

    if let Some(neighbors) = adjacency.get(node) {
        for &next in neighbors {
            if !state.visited.contains(next) {
                dfs(next, adjacency, state);
            } else if state.on_stack.contains(next) {
                record_cycle(next, state);
            }
        }
    }

    state.on_stack.remove(node);
    state.path.pop();
}

fn record_cycle(entry: &str, state: &mut DfsState) {
    let Some(pos) = state.path.iter().position(|n| *n == entry) else {
        return;
    };
    let members = &state.path[pos..];
    state.cycles.insert(canonical(members));
}

/// Rotates a cycle so its smallest id comes first.
fn canonical(members: &[&str]) -> Cycle {
    let start = members
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map_or(0, |(i, _)| i);
    members[start..]
        .iter()
        .chain(&members[..start])
        .map(|s| (*s).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycles_of(list: &[(&'static str, &'static str)]) -> Vec<Cycle> {
        find_cycles(list.iter().copied())
    }

    #[test]
    fn test_cycle_detection_logic() {
        let cases: Vec<(Vec<(&str, &str)>, usize, &str)> = vec![
            (vec![("a", "b"), ("b", "c")], 0, "No cycles"),
            (vec![("a", "b"), ("b", "a")], 1, "Simple cycle"),
            (vec![("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")], 0, "Diamond DAG"),
            (vec![("a", "a")], 1, "Self loop"),
            (vec![("a", "b"), ("b", "c"), ("c", "a")], 1, "Three node cycle"),
            (vec![("a", "b"), ("b", "a"), ("c", "d"), ("d", "c")], 2, "Disjoint cycles"),
            (vec![("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")], 2, "Figure-8"),
            (vec![], 0, "Empty graph"),
        ];

        for (edge_list, expected, desc) in cases {
            assert_eq!(cycles_of(&edge_list).len(), expected, "Failed: {desc}");
        }
    }

    #[test]
    fn test_two_node_cycle_reported_once_without_closing_node() {
        let cycles = cycles_of(&[("b.py", "a.py"), ("a.py", "b.py")]);
        assert_eq!(cycles, vec![vec!["a.py".to_string(), "b.py".to_string()]]);
    }

    #[test]
    fn test_rotation_starts_at_smallest_id() {
        let cycles = cycles_of(&[("m", "z"), ("z", "c"), ("c", "m")]);
        assert_eq!(cycles, vec![vec!["c".to_string(), "m".to_string(), "z".to_string()]]);
    }

    #[test]
    fn test_output_is_sorted_and_stable() {
        let edges = [("x", "y"), ("y", "x"), ("a", "b"), ("b", "a")];
        let first = cycles_of(&edges);
        let mut reversed = edges;
        reversed.reverse();
        assert_eq!(first, cycles_of(&reversed));
        assert_eq!(first[0][0], "a");
    }
}
