// src/analysis/mod.rs
//! Per-file analysis: declaration extraction, metrics and raw references.

pub mod engine;
pub mod token_scan;
pub mod tree;
pub mod walker;

use std::path::Path;

use crate::lang::Lang;
use crate::types::{Diagnostic, MetricRecord, RawReference, SourceUnit};

pub use engine::Engine;
pub use token_scan::TokenScanAnalyzer;
pub use tree::TreeAnalyzer;

/// Default number of lines the token scan inspects after a signature.
pub const DEFAULT_TOKEN_SCAN_WINDOW: usize = 50;

/// Knobs shared by every analyzer.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerSettings {
    pub token_scan_window: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self { token_scan_window: DEFAULT_TOKEN_SCAN_WINDOW }
    }
}

/// Everything one file contributes to the run.
#[derive(Debug)]
pub struct UnitAnalysis {
    pub unit: SourceUnit,
    pub metrics: Vec<MetricRecord>,
    pub references: Vec<RawReference>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A language analyzer. Implementations never fail: problems inside the
/// file become [`Diagnostic`]s on the result.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, path: &Path, text: String, settings: &AnalyzerSettings) -> UnitAnalysis;
}

/// Picks the analyzer for a language: syntax tree when a grammar exists,
/// token scan otherwise.
#[must_use]
pub fn analyzer_for(lang: Lang) -> Box<dyn Analyzer> {
    if lang.has_grammar() {
        Box::new(TreeAnalyzer::new(lang))
    } else {
        Box::new(TokenScanAnalyzer::new(lang))
    }
}

/// Files opt out with `metricmap:ignore` in their first five lines.
#[must_use]
pub fn has_ignore_directive(source: &str) -> bool {
    source
        .lines()
        .take(5)
        .any(|line| line.contains("metricmap:ignore"))
}
