// src/project.rs
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::constants::{should_prune, GODOT_PROJECT_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Godot,
    Rust,
    Node,
    Python,
    DotNet,
    Unknown,
}

impl ProjectType {
    /// Detects the project type from marker files directly under `root`.
    #[must_use]
    pub fn detect_in(root: &Path) -> Self {
        if root.join(GODOT_PROJECT_FILE).exists() {
            return Self::Godot;
        }
        if root.join("Cargo.toml").exists() {
            return Self::Rust;
        }
        if root.join("package.json").exists() {
            return Self::Node;
        }
        if ["pyproject.toml", "requirements.txt", "setup.py", "Pipfile"]
            .iter()
            .any(|f| root.join(f).exists())
        {
            return Self::Python;
        }
        if has_dotnet_manifest(root) {
            return Self::DotNet;
        }
        Self::Unknown
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Godot => "godot",
            Self::Rust => "rust",
            Self::Node => "node",
            Self::Python => "python",
            Self::DotNet => "dotnet",
            Self::Unknown => "unknown",
        }
    }
}

fn has_dotnet_manifest(root: &Path) -> bool {
    root.read_dir()
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == "csproj" || ext == "sln")
            })
        })
        .unwrap_or(false)
}

/// Directory `res://` maps to: the shallowest directory holding
/// `project.godot`, else `root` itself.
#[must_use]
pub fn godot_root(root: &Path) -> PathBuf {
    let found = WalkDir::new(root)
        .max_depth(4)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_prune(&e.file_name().to_string_lossy(), &[]))
        .flatten()
        .filter(|e| e.file_type().is_file() && e.file_name() == GODOT_PROJECT_FILE)
        .min_by_key(walkdir::DirEntry::depth);

    found
        .and_then(|e| e.path().parent().map(Path::to_path_buf))
        .unwrap_or_else(|| root.to_path_buf())
}
