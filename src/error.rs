// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Everything scoped to a single file or declaration is
/// recorded as a [`crate::types::Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum MetricMapError {
    #[error("Path does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid metricmap.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph rendering failed: {0}")]
    Render(#[from] std::fmt::Error),
}

impl MetricMapError {
    /// Configuration problems abort before any scanning starts.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::RootNotFound(_) | Self::Config(_) | Self::Regex(_) | Self::Toml(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MetricMapError>;
