use std::fs;
use std::path::Path;

use regex::Regex;

use crate::constants::CONFIG_FILE;
use crate::error::{MetricMapError, Result};

use super::types::MetricMapToml;

/// Reads `metricmap.toml` from `dir`. A missing file is not an error.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_toml(dir: &Path) -> Result<Option<MetricMapToml>> {
    let path = dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)
        .map_err(|e| MetricMapError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse_toml(&content).map(Some)
}

/// Parses the contents of a config file.
///
/// # Errors
/// Returns an error on malformed TOML or unknown keys.
pub fn parse_toml(content: &str) -> Result<MetricMapToml> {
    let parsed: MetricMapToml = toml::from_str(content)?;
    if parsed.rules.token_scan_window == 0 {
        return Err(MetricMapError::Config("token_scan_window must be at least 1".into()));
    }
    Ok(parsed)
}

/// Compiles exclude patterns.
///
/// # Errors
/// Returns the first invalid regex.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).map_err(MetricMapError::from))
        .collect()
}
