// src/report.rs
//! Report assembly: ranking, bucketing, summary and gate.
//!
//! Everything here is deterministic. Collections are sorted and no wall
//! clock values are recorded, so two runs over the same tree serialize to
//! identical bytes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::FailOn;
use crate::graph::DependencyGraph;
use crate::lang::Lang;
use crate::project::ProjectType;
use crate::security::{Finding, Severity};
use crate::types::{
    Bucket, Cycle, DeclarationKind, Diagnostic, DiagnosticKind, MetricRecord, ReferenceEdge,
    SourceUnit,
};

/// Units listed under `top_dependents`.
pub const TOP_DEPENDENTS: usize = 5;

/// Average cyclomatic complexity above which a recommendation is added.
const AVERAGE_CYCLOMATIC_WARN: f64 = 5.0;

#[derive(Debug, Clone, Serialize)]
pub struct ProjectInfo {
    pub root: String,
    pub kind: ProjectType,
}

/// A metric record with its bucket.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionEntry {
    #[serde(flatten)]
    pub metric: MetricRecord,
    pub bucket: Bucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dependent {
    pub file: String,
    pub edges: usize,
}

/// Per-unit listing: what a file declares and which units it references.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleEntry {
    pub file: String,
    pub language: Lang,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    pub functions: Vec<String>,
    pub classes: Vec<String>,
    pub constants: Vec<String>,
    pub signals: Vec<String>,
    pub exports: Vec<String>,
    /// Resolved targets, sorted.
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub files_scanned: usize,
    pub files_skipped: usize,
    pub total_functions: usize,
    pub high_complexity_count: usize,
    pub medium_complexity_count: usize,
    pub low_complexity_count: usize,
    pub average_cyclomatic_complexity: f64,
    pub average_cognitive_complexity: f64,
    pub languages: BTreeMap<String, usize>,
    pub classes: usize,
    pub constants: usize,
    pub signals: usize,
    pub exports: usize,
    pub edges: usize,
    pub dangling_references: usize,
    pub external_references: usize,
    pub cycles: usize,
    pub security_findings: usize,
    pub diagnostics: usize,
    pub top_dependents: Vec<Dependent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub project: ProjectInfo,
    pub summary: Summary,
    pub functions: Vec<FunctionEntry>,
    pub modules: Vec<ModuleEntry>,
    pub cycles: Vec<Cycle>,
    pub edges: Vec<ReferenceEdge>,
    pub unresolved: Vec<ReferenceEdge>,
    pub findings: Vec<Finding>,
    pub diagnostics: Vec<Diagnostic>,
    pub recommendations: Vec<String>,
}

/// Everything the engine hands over for assembly.
#[derive(Debug)]
pub struct ReportInput {
    pub project: ProjectInfo,
    pub units: Vec<SourceUnit>,
    pub metrics: Vec<MetricRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub graph: DependencyGraph,
    pub cycles: Vec<Cycle>,
    pub findings: Vec<Finding>,
    pub files_skipped: usize,
}

impl Report {
    #[must_use]
    pub fn assemble(input: ReportInput) -> Self {
        let ReportInput { project, units, metrics, mut diagnostics, graph, cycles, mut findings, files_skipped } = input;

        let mut functions: Vec<FunctionEntry> = metrics
            .into_iter()
            .map(|metric| FunctionEntry { bucket: Bucket::of(metric.cyclomatic), metric })
            .collect();
        functions.sort_by(|a, b| {
            b.metric.cyclomatic
                .cmp(&a.metric.cyclomatic)
                .then_with(|| a.metric.file.cmp(&b.metric.file))
                .then_with(|| a.metric.name.cmp(&b.metric.name))
                .then_with(|| a.metric.line.cmp(&b.metric.line))
        });

        for edge in &graph.dangling {
            let note = edge.note.as_deref().unwrap_or("no matching unit");
            diagnostics.push(Diagnostic::new(
                &edge.source,
                DiagnosticKind::UnresolvedReference,
                Some(edge.line),
                format!("unresolved reference `{}`: {note}", edge.raw),
            ));
        }
        diagnostics.sort();
        diagnostics.dedup();
        findings.sort();

        let edges: Vec<ReferenceEdge> = graph.edges.values().flatten().cloned().collect();
        let summary = summarize(&units, &functions, &graph, &cycles, &findings, &diagnostics, files_skipped);
        let recommendations = recommend(&summary);
        let modules = module_entries(&units, &graph);

        Self {
            project,
            summary,
            functions,
            modules,
            cycles,
            edges,
            unresolved: graph.dangling,
            findings,
            diagnostics,
            recommendations,
        }
    }

    /// True when the run should fail: an entry at or above `fail_on`, a cycle
    /// when `fail_on_cycles` is set, or a critical security finding.
    #[must_use]
    pub fn gate(&self, fail_on: FailOn, fail_on_cycles: bool) -> bool {
        self.functions.iter().any(|f| fail_on.trips(f.bucket))
            || (fail_on_cycles && !self.cycles.is_empty())
            || self.findings.iter().any(|f| f.severity == Severity::Critical)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::cast_precision_loss)]
fn average(total: usize, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    round2(total as f64 / count as f64)
}

fn summarize(
    units: &[SourceUnit],
    functions: &[FunctionEntry],
    graph: &DependencyGraph,
    cycles: &[Cycle],
    findings: &[Finding],
    diagnostics: &[Diagnostic],
    files_skipped: usize,
) -> Summary {
    let count_bucket = |b: Bucket| functions.iter().filter(|f| f.bucket == b).count();
    let count_kind = |k: DeclarationKind| units.iter().map(|u| u.count(k)).sum();

    let mut languages = BTreeMap::new();
    for unit in units {
        *languages.entry(unit.lang.name().to_string()).or_insert(0) += 1;
    }

    let total = functions.len();
    Summary {
        files_scanned: units.len(),
        files_skipped,
        total_functions: total,
        high_complexity_count: count_bucket(Bucket::High),
        medium_complexity_count: count_bucket(Bucket::Medium),
        low_complexity_count: count_bucket(Bucket::Low),
        average_cyclomatic_complexity: average(functions.iter().map(|f| f.metric.cyclomatic).sum(), total),
        average_cognitive_complexity: average(functions.iter().map(|f| f.metric.cognitive).sum(), total),
        languages,
        classes: count_kind(DeclarationKind::Class),
        constants: count_kind(DeclarationKind::Const),
        signals: count_kind(DeclarationKind::Signal),
        exports: count_kind(DeclarationKind::Export),
        edges: graph.edge_count(),
        dangling_references: graph.dangling.len(),
        external_references: graph.external_count,
        cycles: cycles.len(),
        security_findings: findings.len(),
        diagnostics: diagnostics.len(),
        top_dependents: graph
            .top_dependents(TOP_DEPENDENTS)
            .into_iter()
            .map(|(file, edges)| Dependent { file, edges })
            .collect(),
    }
}

fn module_entries(units: &[SourceUnit], graph: &DependencyGraph) -> Vec<ModuleEntry> {
    let mut out: Vec<ModuleEntry> = units
        .iter()
        .map(|unit| ModuleEntry {
            file: unit.id.clone(),
            language: unit.lang,
            class_name: unit.class_name.clone(),
            extends: unit.extends.clone(),
            functions: unit.names(&[DeclarationKind::Function, DeclarationKind::Method]),
            classes: unit.names(&[DeclarationKind::Class]),
            constants: unit.names(&[DeclarationKind::Const]),
            signals: unit.names(&[DeclarationKind::Signal]),
            exports: unit.names(&[DeclarationKind::Export]),
            dependencies: graph
                .edges
                .get(&unit.id)
                .map(|edges| edges.iter().filter_map(|e| e.target.clone()).collect())
                .unwrap_or_default(),
        })
        .collect();
    out.sort_by(|a, b| a.file.cmp(&b.file));
    out
}

fn recommend(summary: &Summary) -> Vec<String> {
    let mut out = Vec::new();
    if summary.high_complexity_count > 0 {
        out.push(format!(
            "{} high-complexity function(s) found; consider splitting them into smaller units",
            summary.high_complexity_count
        ));
    }
    if summary.average_cyclomatic_complexity > AVERAGE_CYCLOMATIC_WARN {
        out.push(format!(
            "average cyclomatic complexity is {:.2}; simplify control flow",
            summary.average_cyclomatic_complexity
        ));
    }
    if summary.cycles > 0 {
        out.push(format!(
            "{} dependency cycle(s) found; break them by extracting shared code",
            summary.cycles
        ));
    }
    out
}
