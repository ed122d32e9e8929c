// src/config/mod.rs
pub mod io;
pub mod types;

pub use self::types::{Config, FailOn, MetricMapToml, RuleConfig, ScanConfig};

use std::path::{Path, PathBuf};

use crate::analysis::AnalyzerSettings;
use crate::error::{MetricMapError, Result};

impl Config {
    /// Builds the configuration for scanning `target`: defaults, then
    /// `metricmap.toml` from the scan root when present.
    ///
    /// # Errors
    /// Returns a configuration error when the target does not exist, the
    /// config file is unreadable or invalid, or an exclude regex is bad.
    pub fn load(target: &Path) -> Result<Self> {
        if !target.exists() {
            return Err(MetricMapError::RootNotFound(target.to_path_buf()));
        }
        let root = scan_root(target);

        let file = io::load_toml(&root)?.unwrap_or_default();
        if let Some(dir) = file.scan.prune_dirs.iter().find(|d| d.contains(['/', '\\'])) {
            return Err(MetricMapError::Config(format!(
                "prune_dirs entries are directory names, not paths: {dir}"
            )));
        }
        let exclude_patterns = io::compile_patterns(&file.scan.exclude)?;

        Ok(Self {
            target: target.to_path_buf(),
            root,
            rules: file.rules,
            scan: file.scan,
            exclude_patterns,
        })
    }

    /// Replaces the exclude list, recompiling the patterns.
    ///
    /// # Errors
    /// Returns the first invalid regex.
    pub fn set_excludes(&mut self, patterns: Vec<String>) -> Result<()> {
        self.exclude_patterns = io::compile_patterns(&patterns)?;
        self.scan.exclude = patterns;
        Ok(())
    }

    #[must_use]
    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings { token_scan_window: self.rules.token_scan_window }
    }
}

/// A directory target is its own root; a file target uses its parent.
fn scan_root(target: &Path) -> PathBuf {
    if target.is_dir() {
        return target.to_path_buf();
    }
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
