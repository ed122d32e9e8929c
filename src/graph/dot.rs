// src/graph/dot.rs
//! Graphviz export of the resolved reference graph.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::types::Cycle;

use super::builder::DependencyGraph;

/// Renders the graph in DOT. Edges that take part in a cycle are drawn red.
///
/// # Errors
/// Returns error if formatting fails.
pub fn render(graph: &DependencyGraph, cycles: &[Cycle]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_dot(&mut out, graph, cycles)?;
    Ok(out)
}

fn write_dot(out: &mut String, graph: &DependencyGraph, cycles: &[Cycle]) -> std::fmt::Result {
    let cyclic = cycle_edges(cycles);

    writeln!(out, "digraph metricmap {{")?;
    writeln!(out, "    rankdir=LR;")?;
    writeln!(out, "    node [shape=box, fontname=\"monospace\"];")?;

    for node in &graph.nodes {
        writeln!(out, "    \"{}\";", escape(node))?;
    }
    for (source, target) in graph.pairs() {
        let style = if cyclic.contains(&(source, target)) {
            " [color=red, penwidth=2]"
        } else {
            ""
        };
        writeln!(out, "    \"{}\" -> \"{}\"{style};", escape(source), escape(target))?;
    }
    writeln!(out, "}}")
}

fn cycle_edges(cycles: &[Cycle]) -> BTreeSet<(&str, &str)> {
    let mut set = BTreeSet::new();
    for cycle in cycles {
        for (i, from) in cycle.iter().enumerate() {
            if let Some(to) = cycle.get((i + 1) % cycle.len()) {
                set.insert((from.as_str(), to.as_str()));
            }
        }
    }
    set
}

fn escape(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}
