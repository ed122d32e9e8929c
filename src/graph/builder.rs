// src/graph/builder.rs
//! Two-pass dependency graph construction.
//!
//! Pass one indexes every unit by id and declared type name; pass two
//! resolves each raw reference against that index.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{RawReference, ReferenceEdge, SourceUnit};

use super::resolver::{self, Resolution, UnitIndex};

/// Directed reference graph over unit ids.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Every unit id, edges or not.
    pub nodes: BTreeSet<String>,
    /// Resolved edges keyed by source id, one per distinct target.
    pub edges: BTreeMap<String, Vec<ReferenceEdge>>,
    /// Local-looking references that matched no unit.
    pub dangling: Vec<ReferenceEdge>,
    /// References to stdlib, third-party code, engine types or assets.
    pub external_count: usize,
}

impl DependencyGraph {
    /// Resolves the references of every unit.
    ///
    /// `unreadable` maps discovered-but-unreadable ids to their I/O error;
    /// references to them become dangling with that error as the note.
    #[must_use]
    pub fn build(
        units: &[(&SourceUnit, &[RawReference])],
        unreadable: &BTreeMap<String, String>,
        godot_root: &str,
    ) -> Self {
        let mut ordered: Vec<&(&SourceUnit, &[RawReference])> = units.iter().collect();
        ordered.sort_by(|a, b| a.0.id.cmp(&b.0.id));

        let mut index = UnitIndex::new(godot_root);
        for (unit, _) in &ordered {
            index.insert(&unit.id, unit.class_name.as_deref());
        }
        for (id, err) in unreadable {
            index.insert_unreadable(id, err);
        }

        let mut graph = Self::default();
        for (unit, references) in ordered {
            graph.nodes.insert(unit.id.clone());
            let mut by_target: BTreeMap<String, ReferenceEdge> = BTreeMap::new();

            for reference in *references {
                let edge = |target: Option<String>, note: Option<String>| ReferenceEdge {
                    source: unit.id.clone(),
                    target,
                    kind: reference.kind,
                    raw: reference.target.clone(),
                    line: reference.line,
                    note,
                };
                match resolver::resolve(&index, &unit.id, unit.lang, reference) {
                    Resolution::Resolved(target) if target == unit.id => {}
                    Resolution::Resolved(target) => {
                        by_target
                            .entry(target.clone())
                            .or_insert_with(|| edge(Some(target), None));
                    }
                    Resolution::Unresolved(note) => {
                        tracing::debug!("{}:{} unresolved `{}`", unit.id, reference.line, reference.target);
                        graph.dangling.push(edge(None, Some(note)));
                    }
                    Resolution::External => graph.external_count += 1,
                }
            }

            if !by_target.is_empty() {
                graph.edges.insert(unit.id.clone(), by_target.into_values().collect());
            }
        }
        graph.dangling.sort();
        graph
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// `(source, target)` pairs of resolved edges, in sorted order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().flat_map(|(source, edges)| {
            edges
                .iter()
                .filter_map(move |e| e.target.as_deref().map(|t| (source.as_str(), t)))
        })
    }

    /// Units with the most outgoing edges, ties broken by id.
    #[must_use]
    pub fn top_dependents(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .edges
            .iter()
            .map(|(id, edges)| (id.clone(), edges.len()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        counts
    }
}
