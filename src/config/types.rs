use std::path::PathBuf;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::DEFAULT_TOKEN_SCAN_WINDOW;
use crate::types::Bucket;

/// Lowest bucket that fails the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailOn {
    #[default]
    High,
    Medium,
    Never,
}

impl FailOn {
    #[must_use]
    pub fn trips(self, bucket: Bucket) -> bool {
        match self {
            Self::High => bucket == Bucket::High,
            Self::Medium => bucket >= Bucket::Medium,
            Self::Never => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    #[serde(default)]
    pub fail_on: FailOn,
    #[serde(default)]
    pub fail_on_cycles: bool,
    #[serde(default = "default_window")]
    pub token_scan_window: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            fail_on: FailOn::default(),
            fail_on_cycles: false,
            token_scan_window: default_window(),
        }
    }
}

const fn default_window() -> usize {
    DEFAULT_TOKEN_SCAN_WINDOW
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    /// Regexes over forward-slash paths relative to the root.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Directory names pruned in addition to the built-in list.
    #[serde(default)]
    pub prune_dirs: Vec<String>,
    #[serde(default)]
    pub security: bool,
}

/// On-disk shape of `metricmap.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricMapToml {
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Resolved run configuration: defaults, then the file, then CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory or single file to scan.
    pub target: PathBuf,
    /// Directory unit ids are relative to.
    pub root: PathBuf,
    pub rules: RuleConfig,
    pub scan: ScanConfig,
    pub exclude_patterns: Vec<Regex>,
}
