// tests/integration_core.rs
//! End-to-end scans over temporary fixture trees.

use anyhow::Result;
use metricmap_core::analysis::Engine;
use metricmap_core::config::Config;
use metricmap_core::report::Report;
use metricmap_core::reporting::json;
use metricmap_core::types::{Bucket, DiagnosticKind};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// --- Helpers ---

fn write(root: &Path, rel: &str, body: &str) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, body)?;
    Ok(())
}

fn scan(root: &Path) -> Result<Report> {
    Ok(Engine::new(Config::load(root)?).scan()?.report)
}

/// A Python function with `branches` sequential `if`s: cyclomatic `branches + 1`.
fn branchy(name: &str, branches: usize) -> String {
    let mut body = format!("def {name}(x):\n");
    for i in 0..branches {
        let _ = writeln!(body, "    if x == {i}:\n        return {i}");
    }
    body.push_str("    return -1\n");
    body
}

// --- Ranking and buckets ---

#[test]
fn test_two_file_scenario_ranks_and_buckets() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "x.py", &branchy("heavy", 11))?;
    write(dir.path(), "y.py", &branchy("light", 2))?;

    let report = scan(dir.path())?;
    assert_eq!(report.summary.high_complexity_count, 1);
    assert_eq!(report.summary.medium_complexity_count, 0);
    assert_eq!(report.summary.low_complexity_count, 1);

    let ranked: Vec<(&str, usize)> = report
        .functions
        .iter()
        .map(|f| (f.metric.name.as_str(), f.metric.cyclomatic))
        .collect();
    assert_eq!(ranked, vec![("heavy", 12), ("light", 3)]);
    assert_eq!(report.functions[0].bucket, Bucket::High);
    assert!(!report.recommendations.is_empty());
    Ok(())
}

#[test]
fn test_bucket_boundaries_through_full_scan() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "b4.py", &branchy("four", 3))?;
    write(dir.path(), "b5.py", &branchy("five", 4))?;
    write(dir.path(), "b10.py", &branchy("ten", 9))?;
    write(dir.path(), "b11.py", &branchy("eleven", 10))?;

    let report = scan(dir.path())?;
    let bucket_of = |name: &str| {
        report
            .functions
            .iter()
            .find(|f| f.metric.name == name)
            .map(|f| f.bucket)
    };
    assert_eq!(bucket_of("four"), Some(Bucket::Low));
    assert_eq!(bucket_of("five"), Some(Bucket::Medium));
    assert_eq!(bucket_of("ten"), Some(Bucket::Medium));
    assert_eq!(bucket_of("eleven"), Some(Bucket::High));
    Ok(())
}

// --- Graph ---

#[test]
fn test_mutual_relative_imports_form_one_cycle() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "pkg/__init__.py", "")?;
    write(dir.path(), "pkg/a.py", "from .b import helper\n")?;
    write(dir.path(), "pkg/b.py", "from .a import thing\n")?;

    let report = scan(dir.path())?;
    assert_eq!(report.cycles, vec![vec!["pkg/a.py".to_string(), "pkg/b.py".to_string()]]);
    assert_eq!(report.summary.cycles, 1);
    Ok(())
}

#[test]
fn test_mutual_package_imports_form_one_cycle() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "pkg/__init__.py", "")?;
    write(dir.path(), "pkg/a.py", "from . import b\n")?;
    write(dir.path(), "pkg/b.py", "from . import a\n")?;

    let report = scan(dir.path())?;
    let edges: Vec<_> = report
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_deref()))
        .collect();
    assert_eq!(edges, vec![("pkg/a.py", Some("pkg/b.py")), ("pkg/b.py", Some("pkg/a.py"))]);
    assert_eq!(report.cycles, vec![vec!["pkg/a.py".to_string(), "pkg/b.py".to_string()]]);
    Ok(())
}

#[test]
fn test_nonexistent_path_yields_one_dangling_diagnostic() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "main.ts", "import { x } from \"./missing\";\nimport React from \"react\";\n")?;

    let report = scan(dir.path())?;
    let dangling: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnresolvedReference)
        .collect();
    assert_eq!(dangling.len(), 1);
    assert_eq!(dangling[0].path, "main.ts");
    assert_eq!(report.summary.dangling_references, 1);
    assert_eq!(report.summary.external_references, 1);
    assert_eq!(report.summary.edges, 0);
    Ok(())
}

#[test]
fn test_mixed_language_tree() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "project.godot", "")?;
    write(
        dir.path(),
        "scripts/player.gd",
        "extends CharacterBody2D\nsignal died\nconst SPEED = 200\n\nfunc _physics_process(delta):\n    if delta > 0:\n        move_and_slide()\n",
    )?;
    write(
        dir.path(),
        "Scripts/Enemy.cs",
        "using Godot;\npublic partial class Enemy : Node2D\n{\n    public void Hit(int dmg)\n    {\n        if (dmg > 3) { QueueFree(); }\n    }\n}\n",
    )?;
    write(dir.path(), "tools/gen.py", "def main():\n    for i in range(3):\n        print(i)\n")?;

    let report = scan(dir.path())?;
    assert_eq!(report.summary.files_scanned, 3);
    assert_eq!(report.summary.signals, 1);
    assert_eq!(report.summary.languages.get("gdscript"), Some(&1));
    assert_eq!(report.summary.languages.get("csharp"), Some(&1));
    assert_eq!(report.summary.languages.get("python"), Some(&1));
    assert_eq!(report.summary.total_functions, 3);
    assert!(report.summary.external_references >= 2);
    assert!(report.unresolved.is_empty());

    let player = report
        .modules
        .iter()
        .find(|m| m.file == "scripts/player.gd")
        .ok_or_else(|| anyhow::anyhow!("player module missing"))?;
    assert_eq!(player.extends.as_deref(), Some("CharacterBody2D"));
    assert_eq!(player.signals, vec!["died"]);
    assert_eq!(player.functions, vec!["_physics_process"]);
    let enemy = report
        .modules
        .iter()
        .find(|m| m.file == "Scripts/Enemy.cs")
        .ok_or_else(|| anyhow::anyhow!("enemy module missing"))?;
    assert_eq!(enemy.class_name.as_deref(), Some("Enemy"));
    assert_eq!(enemy.functions, vec!["Enemy.Hit"]);
    Ok(())
}

// --- Determinism ---

#[test]
fn test_json_output_is_byte_identical_across_runs() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "a.py", "import b\nimport c\n\ndef f(x):\n    return x and x.y or None\n")?;
    write(dir.path(), "b.py", "import a\n")?;
    write(dir.path(), "c.py", &branchy("g", 6))?;
    write(dir.path(), "web/app.ts", "import { h } from './util';\nexport const go = (n: number) => n > 1 ? h(n) : 0;\n")?;
    write(dir.path(), "web/util.ts", "export function h(n: number) { return n * 2; }\n")?;

    let first = json::render(&scan(dir.path())?)?;
    let second = json::render(&scan(dir.path())?)?;
    assert_eq!(first, second);
    Ok(())
}
