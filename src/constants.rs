// src/constants.rs

/// Name of the optional per-project configuration file.
pub const CONFIG_FILE: &str = "metricmap.toml";

/// Marks a Godot project root; `res://` paths are relative to it.
pub const GODOT_PROJECT_FILE: &str = "project.godot";

/// Directories never descended into.
pub const PRUNE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "build",
    "dist",
    "vendor",
    "third_party",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".godot",
    ".import",
    ".mypy_cache",
    ".pytest_cache",
];

/// True for built-in pruned names, hidden directories and `extra` names.
#[must_use]
pub fn should_prune(name: &str, extra: &[String]) -> bool {
    (name.starts_with('.') && name.len() > 1 && name != "..")
        || PRUNE_DIRS.contains(&name)
        || extra.iter().any(|e| e == name)
}
