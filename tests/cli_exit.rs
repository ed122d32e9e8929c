// tests/cli_exit.rs - Exit code tests
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn metricmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_metricmap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute metricmap")
}

fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    for (rel, body) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create dir");
        }
        fs::write(path, body).expect("failed to write fixture");
    }
    dir
}

fn heavy_python() -> String {
    let mut body = String::from("def heavy(x):\n");
    for i in 0..12 {
        body.push_str(&format!("    if x == {i}:\n        return {i}\n"));
    }
    body
}

#[test]
fn test_exit_0_clean() {
    let dir = workspace(&[("a.py", "def f():\n    return 1\n")]);
    let out = metricmap(&[dir.path().to_str().expect("utf8 path")]);
    assert_eq!(out.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Summary"));
}

#[test]
fn test_exit_3_gate_tripped() {
    let heavy = heavy_python();
    let dir = workspace(&[("x.py", heavy.as_str())]);
    let out = metricmap(&[dir.path().to_str().expect("utf8 path"), "--format", "json"]);
    assert_eq!(out.status.code(), Some(3));

    let value: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout is not valid JSON");
    assert_eq!(value["summary"]["high_complexity_count"], 1);
}

#[test]
fn test_fail_on_never_disables_gate() {
    let heavy = heavy_python();
    let dir = workspace(&[("x.py", heavy.as_str())]);
    let out = metricmap(&[dir.path().to_str().expect("utf8 path"), "--fail-on", "never"]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn test_cycle_gate_is_opt_in() {
    let dir = workspace(&[("a.py", "import b\n"), ("b.py", "import a\n")]);
    let root = dir.path().to_str().expect("utf8 path");
    assert_eq!(metricmap(&[root]).status.code(), Some(0));
    assert_eq!(metricmap(&[root, "--fail-on-cycles"]).status.code(), Some(3));
}

#[test]
fn test_exit_2_missing_path() {
    let dir = workspace(&[]);
    let missing = dir.path().join("nope");
    let out = metricmap(&[missing.to_str().expect("utf8 path")]);
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("does not exist"));
}

#[test]
fn test_exit_2_invalid_config() {
    let dir = workspace(&[("metricmap.toml", "[rules]\nfail_on = \"sometimes\"\n"), ("a.py", "")]);
    let out = metricmap(&[dir.path().to_str().expect("utf8 path")]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_exit_2_unknown_format() {
    let dir = workspace(&[("a.py", "")]);
    let out = metricmap(&[dir.path().to_str().expect("utf8 path"), "--format", "xml"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn test_output_file_has_no_ansi_codes() {
    let dir = workspace(&[("a.py", "def f(a, b):\n    return a or b\n")]);
    let out_dir = TempDir::new().expect("failed to create temp dir");
    let report = out_dir.path().join("report.txt");
    let out = metricmap(&[
        dir.path().to_str().expect("utf8 path"),
        "--output",
        report.to_str().expect("utf8 path"),
    ]);
    assert_eq!(out.status.code(), Some(0));
    let text = fs::read_to_string(&report).expect("report written");
    assert!(text.contains("Summary"));
    assert!(!text.contains('\u{1b}'));
}
