// src/cli/mod.rs
//! Command-line entry: flag layering, scan, output and exit status.

pub mod args;

pub use args::Cli;

use std::fs;

use anyhow::{Context, Result};

use crate::analysis::Engine;
use crate::config::Config;
use crate::exit::MetricMapExit;
use crate::reporting;

/// Applies CLI flags on top of the loaded configuration.
///
/// # Errors
/// Returns a configuration error for an invalid exclude regex.
pub fn configure(cli: &Cli) -> crate::error::Result<Config> {
    let mut config = Config::load(&cli.path)?;
    if let Some(fail_on) = cli.fail_on {
        config.rules.fail_on = fail_on;
    }
    if cli.fail_on_cycles {
        config.rules.fail_on_cycles = true;
    }
    if let Some(window) = cli.window {
        config.rules.token_scan_window = usize::try_from(window).unwrap_or(usize::MAX);
    }
    if cli.security {
        config.scan.security = true;
    }
    if !cli.exclude.is_empty() {
        let mut patterns = config.scan.exclude.clone();
        patterns.extend(cli.exclude.iter().cloned());
        config.set_excludes(patterns)?;
    }
    Ok(config)
}

/// Runs one scan and reports the exit status.
///
/// # Errors
/// Returns error on configuration problems or when an output sink fails.
pub fn run(cli: &Cli) -> Result<MetricMapExit> {
    let config = configure(cli)?;
    let fail_on = config.rules.fail_on;
    let fail_on_cycles = config.rules.fail_on_cycles;

    let scan = Engine::new(config).scan()?;
    reporting::emit(&scan.report, cli.format, cli.top, cli.output.as_deref())?;

    if let Some(path) = &cli.dot {
        fs::write(path, &scan.dot)
            .with_context(|| format!("failed to write graph to {}", path.display()))?;
    }

    if scan.report.gate(fail_on, fail_on_cycles) {
        tracing::info!("gate tripped (fail_on = {fail_on:?}, fail_on_cycles = {fail_on_cycles})");
        return Ok(MetricMapExit::GateFailed);
    }
    Ok(MetricMapExit::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailOn;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_file() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("metricmap.toml"),
            "[rules]\nfail_on = \"never\"\ntoken_scan_window = 30\n[scan]\nexclude = [\"^a/\"]\n",
        )?;
        let root = dir.path().to_string_lossy().to_string();
        let cli = Cli::try_parse_from(["metricmap", &root, "--fail-on", "medium", "--window", "7", "--exclude", "^b/"])?;

        let config = configure(&cli)?;
        assert_eq!(config.rules.fail_on, FailOn::Medium);
        assert_eq!(config.rules.token_scan_window, 7);
        assert_eq!(config.exclude_patterns.len(), 2);
        Ok(())
    }

    #[test]
    fn test_run_writes_outputs() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.py"), "import b\n")?;
        fs::write(dir.path().join("b.py"), "import a\n")?;
        let out = TempDir::new()?;
        let report_path = out.path().join("report.json");
        let dot_path = out.path().join("graph.dot");

        let cli = Cli::try_parse_from([
            "metricmap".to_string(),
            dir.path().to_string_lossy().to_string(),
            "--format".into(),
            "json".into(),
            "--output".into(),
            report_path.to_string_lossy().to_string(),
            "--dot".into(),
            dot_path.to_string_lossy().to_string(),
            "--fail-on-cycles".into(),
        ])?;
        assert_eq!(run(&cli)?, MetricMapExit::GateFailed);

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path)?)?;
        assert_eq!(json["summary"]["cycles"], 1);
        assert!(fs::read_to_string(&dot_path)?.contains("color=red"));
        Ok(())
    }
}
