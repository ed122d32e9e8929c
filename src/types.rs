// src/types.rs
//! Core data model shared by the analyzers, the graph builder and the report.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::lang::Lang;

/// One source file. Immutable after parse.
#[derive(Debug, Clone, Serialize)]
pub struct SourceUnit {
    /// Path relative to the scan root.
    pub path: PathBuf,
    /// Forward-slash form of `path`; unique key across the run.
    pub id: String,
    pub lang: Lang,
    #[serde(skip)]
    pub text: String,
    pub declarations: Vec<Declaration>,
    /// Public type name this unit declares, used for symbolic resolution.
    pub class_name: Option<String>,
    /// Parent script or base type named by the unit's `extends` clause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
}

impl SourceUnit {
    #[must_use]
    pub fn new(path: &Path, lang: Lang, text: String) -> Self {
        Self {
            path: path.to_path_buf(),
            id: path_id(path),
            lang,
            text,
            declarations: Vec::new(),
            class_name: None,
            extends: None,
        }
    }

    /// Counts declarations of `kind`, including nested children.
    #[must_use]
    pub fn count(&self, kind: DeclarationKind) -> usize {
        fn walk(decls: &[Declaration], kind: DeclarationKind) -> usize {
            decls
                .iter()
                .map(|d| usize::from(d.kind == kind) + walk(&d.children, kind))
                .sum()
        }
        walk(&self.declarations, kind)
    }

    /// Names of declarations of the given kinds in source order. Nested
    /// declarations are qualified by their parent: `Player.jump`.
    #[must_use]
    pub fn names(&self, kinds: &[DeclarationKind]) -> Vec<String> {
        fn walk(decls: &[Declaration], prefix: &str, kinds: &[DeclarationKind], out: &mut Vec<String>) {
            for d in decls {
                let name = if prefix.is_empty() { d.name.clone() } else { format!("{prefix}.{}", d.name) };
                if kinds.contains(&d.kind) {
                    out.push(name.clone());
                }
                walk(&d.children, &name, kinds, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.declarations, "", kinds, &mut out);
        out
    }
}

/// Normalizes a relative path into the forward-slash id used as graph key.
#[must_use]
pub fn path_id(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Method,
    Class,
    Const,
    Signal,
    /// Editor-exposed GDScript property (`@export var`).
    Export,
}

/// A function, class or module-level binding found in a unit.
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    pub kind: DeclarationKind,
    pub name: String,
    pub line: usize,
    pub end_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Declaration>,
}

impl Declaration {
    #[must_use]
    pub fn new(kind: DeclarationKind, name: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            line,
            end_line: line,
            params: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Tree,
    /// Keyword scan over a bounded window of lines. Lower fidelity.
    TokenScan,
}

/// Computed scores for one callable declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricRecord {
    pub file: String,
    pub name: String,
    pub kind: DeclarationKind,
    pub line: usize,
    pub cyclomatic: usize,
    pub cognitive: usize,
    pub lines: usize,
    pub parameters: usize,
    pub mode: AnalysisMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Import,
    /// `from M import n`: target `M.n`, falling back to `M`.
    #[serde(rename = "from_import")]
    FromImport,
    Include,
    Preload,
    Load,
    Extends,
    Using,
}

/// A candidate reference string before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReference {
    pub target: String,
    pub kind: ReferenceKind,
    pub line: usize,
}

impl RawReference {
    #[must_use]
    pub fn new(target: impl Into<String>, kind: ReferenceKind, line: usize) -> Self {
        Self { target: target.into(), kind, line }
    }
}

/// Directed edge "source textually references target".
/// `target == None` marks a dangling edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ReferenceEdge {
    pub source: String,
    pub target: Option<String>,
    pub kind: ReferenceKind,
    pub raw: String,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Ordered unit ids forming a closed chain; the closing node is not repeated.
pub type Cycle = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    IoError,
    UnresolvedReference,
}

/// Something that could not be analyzed, and why.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(path: &str, kind: DiagnosticKind, line: Option<usize>, message: String) -> Self {
        Self { path: path.to_string(), kind, line, message }
    }
}

/// Complexity bucket on the cyclomatic score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Low,
    Medium,
    High,
}

impl Bucket {
    pub const HIGH_ABOVE: usize = 10;
    pub const MEDIUM_FROM: usize = 5;

    #[must_use]
    pub fn of(cyclomatic: usize) -> Self {
        if cyclomatic > Self::HIGH_ABOVE {
            Self::High
        } else if cyclomatic >= Self::MEDIUM_FROM {
            Self::Medium
        } else {
            Self::Low
        }
    }
}
