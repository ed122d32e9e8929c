//! Main execution logic for the `metricmap` analysis engine.
//! Unified entry point for a scan run.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::config::Config;
use crate::discovery;
use crate::error::Result;
use crate::graph::{dot, find_cycles, DependencyGraph};
use crate::lang::Lang;
use crate::project::{self, ProjectType};
use crate::report::{ProjectInfo, Report, ReportInput};
use crate::security;
use crate::types::{path_id, Diagnostic, DiagnosticKind, RawReference, SourceUnit};

use super::{analyzer_for, has_ignore_directive, AnalyzerSettings, UnitAnalysis};

/// Result of a scan: the report plus the DOT rendering of its graph.
#[derive(Debug)]
pub struct Scan {
    pub report: Report,
    pub dot: String,
}

/// What happened to one discovered file.
enum Outcome {
    Analyzed(UnitAnalysis),
    /// Opted out via the ignore directive. Still a resolution target.
    Ignored(SourceUnit),
    Unreadable { id: String, error: String },
}

/// The main analysis engine.
/// Orchestrates discovery, per-file analysis, graph building and assembly.
pub struct Engine {
    config: Config,
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the full pipeline over the configured target.
    ///
    /// # Errors
    /// Per-file problems never fail the scan; they become diagnostics. The
    /// `Result` is reserved for failures outside any single file.
    pub fn scan(&self) -> Result<Scan> {
        let start = Instant::now();
        let found = discovery::discover(&self.config);
        let settings = self.config.analyzer_settings();

        let outcomes: Vec<Outcome> = found
            .files
            .par_iter()
            .map(|rel| analyze_file(&self.config.root, rel, &settings))
            .collect();

        let mut analyses = Vec::new();
        let mut ignored = Vec::new();
        let mut unreadable = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Analyzed(a) => analyses.push(a),
                Outcome::Ignored(unit) => ignored.push(unit),
                Outcome::Unreadable { id, error } => {
                    diagnostics.push(Diagnostic::new(&id, DiagnosticKind::IoError, None, error.clone()));
                    unreadable.insert(id, error);
                }
            }
        }
        let files_skipped = ignored.len() + unreadable.len() + found.walk_errors;

        let godot_root = godot_root_id(&self.config.root);
        let graph = {
            let mut inputs: Vec<(&SourceUnit, &[RawReference])> = analyses
                .iter()
                .map(|a| (&a.unit, a.references.as_slice()))
                .collect();
            inputs.extend(ignored.iter().map(|u| (u, &[][..])));
            DependencyGraph::build(&inputs, &unreadable, &godot_root)
        };
        let cycles = find_cycles(graph.pairs());
        if !cycles.is_empty() {
            tracing::warn!("found {} dependency cycle(s)", cycles.len());
        }
        let dot = dot::render(&graph, &cycles)?;

        let findings = if self.config.scan.security {
            let mut all: Vec<_> = analyses
                .par_iter()
                .flat_map_iter(|a| security::scan_source(&a.unit.id, &a.unit.text))
                .collect();
            all.sort();
            all
        } else {
            Vec::new()
        };

        let mut units = Vec::with_capacity(analyses.len());
        let mut metrics = Vec::new();
        for analysis in analyses {
            metrics.extend(analysis.metrics);
            diagnostics.extend(analysis.diagnostics);
            units.push(analysis.unit);
        }

        let report = Report::assemble(ReportInput {
            project: ProjectInfo {
                root: path_id(&self.config.root),
                kind: ProjectType::detect_in(&self.config.root),
            },
            units,
            metrics,
            diagnostics,
            graph,
            cycles,
            findings,
            files_skipped,
        });

        tracing::info!(
            "scanned {} files ({} skipped), {} functions, {} edges, {} cycles in {:?}",
            report.summary.files_scanned,
            report.summary.files_skipped,
            report.summary.total_functions,
            report.summary.edges,
            report.summary.cycles,
            start.elapsed()
        );
        Ok(Scan { report, dot })
    }
}

fn analyze_file(root: &Path, rel: &Path, settings: &AnalyzerSettings) -> Outcome {
    let id = path_id(rel);
    let Some(lang) = Lang::from_path(rel) else {
        return Outcome::Unreadable { id, error: "unsupported extension".to_string() };
    };
    let text = match fs::read_to_string(root.join(rel)) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("{id}: {e}");
            return Outcome::Unreadable { id, error: e.to_string() };
        }
    };
    if has_ignore_directive(&text) {
        tracing::debug!("{id}: ignore directive, skipping");
        return Outcome::Ignored(SourceUnit::new(rel, lang, String::new()));
    }

    tracing::debug!("{id}: analyzing as {}", lang.name());
    Outcome::Analyzed(analyzer_for(lang).analyze(rel, text, settings))
}

/// Relative id of the directory `res://` maps to; empty for the root.
fn godot_root_id(root: &Path) -> String {
    let dir: PathBuf = project::godot_root(root);
    dir.strip_prefix(root).map(path_id).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclarationKind;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) -> std::io::Result<()> {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, body)
    }

    #[test]
    fn test_ignored_file_still_resolves() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "main.py", "import helper\n\ndef run():\n    return helper.go()\n")?;
        write(dir.path(), "helper.py", "# metricmap:ignore\ndef go():\n    return 1\n")?;

        let scan = Engine::new(Config::load(dir.path())?).scan()?;
        let report = scan.report;
        assert_eq!(report.summary.files_scanned, 1);
        assert_eq!(report.summary.files_skipped, 1);
        assert_eq!(report.summary.edges, 1);
        assert!(report.unresolved.is_empty());
        assert!(report.functions.iter().all(|f| f.metric.name != "go"));
        Ok(())
    }

    #[test]
    fn test_unreadable_file_becomes_diagnostic() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "ok.py", "def f():\n    pass\n")?;
        fs::write(dir.path().join("bad.py"), [0xff, 0xfe, 0x00, 0xc3])?;

        let report = Engine::new(Config::load(dir.path())?).scan()?.report;
        assert_eq!(report.summary.files_scanned, 1);
        assert!(report
            .diagnostics
            .iter()
            .any(|d| d.path == "bad.py" && d.kind == DiagnosticKind::IoError));
        Ok(())
    }

    #[test]
    fn test_godot_root_and_class_name_resolution() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "game/project.godot", "")?;
        write(dir.path(), "game/actors/base.gd", "class_name Actor\nextends Node\n")?;
        write(
            dir.path(),
            "game/actors/player.gd",
            "extends Actor\nconst Gun = preload(\"res://weapons/gun.gd\")\n\nfunc _ready():\n    pass\n",
        )?;
        write(dir.path(), "game/weapons/gun.gd", "extends Node\n")?;

        let report = Engine::new(Config::load(dir.path())?).scan()?.report;
        let targets: Vec<_> = report
            .edges
            .iter()
            .filter(|e| e.source == "game/actors/player.gd")
            .filter_map(|e| e.target.as_deref())
            .collect();
        assert_eq!(targets, vec!["game/actors/base.gd", "game/weapons/gun.gd"]);
        assert!(report.functions.iter().any(|f| f.metric.kind == DeclarationKind::Function));
        Ok(())
    }

    #[test]
    fn test_one_line_class_name_extends_resolves() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "base.gd", "class_name Base extends Node\n")?;
        write(dir.path(), "child.gd", "class_name Child extends Base\n")?;

        let report = Engine::new(Config::load(dir.path())?).scan()?.report;
        let edges: Vec<_> = report
            .edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_deref()))
            .collect();
        assert_eq!(edges, vec![("child.gd", Some("base.gd"))]);
        assert_eq!(report.summary.external_references, 1);
        let child = report.modules.iter().find(|m| m.file == "child.gd");
        assert_eq!(child.and_then(|m| m.extends.as_deref()), Some("Base"));
        Ok(())
    }

    #[test]
    fn test_security_scan_is_opt_in() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write(dir.path(), "db.py", "def q(cur, name):\n    cur.execute(\"SELECT * FROM t WHERE n = %s\" % name)\n")?;

        let mut config = Config::load(dir.path())?;
        let off = Engine::new(config.clone()).scan()?.report;
        assert!(off.findings.is_empty());

        config.scan.security = true;
        let on = Engine::new(config).scan()?.report;
        assert!(!on.findings.is_empty());
        Ok(())
    }
}
