// src/discovery.rs
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::constants::should_prune;
use crate::lang::Lang;
use crate::types::path_id;

/// Files selected for analysis plus walk bookkeeping.
#[derive(Debug, Default)]
pub struct Discovered {
    /// Paths relative to the scan root, sorted.
    pub files: Vec<PathBuf>,
    /// Entries the walk could not visit.
    pub walk_errors: usize,
}

/// Runs the file discovery pipeline.
#[must_use]
pub fn discover(config: &Config) -> Discovered {
    let (raw, walk_errors) = walk_filesystem(config);
    if walk_errors > 0 {
        tracing::warn!("encountered {walk_errors} errors during file walk");
    }

    let mut files: Vec<PathBuf> = raw
        .into_iter()
        .filter(|p| Lang::from_path(p).is_some())
        .filter(|p| !is_excluded(p, config))
        .collect();
    files.sort();
    files.dedup();

    tracing::debug!("discovered {} source files", files.len());
    Discovered { files, walk_errors }
}

fn walk_filesystem(config: &Config) -> (Vec<PathBuf>, usize) {
    let extra = &config.scan.prune_dirs;
    let walker = WalkDir::new(&config.target)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(e.file_type().is_dir() && should_prune(&e.file_name().to_string_lossy(), extra)));

    accumulate_walker(walker, &config.root)
}

fn accumulate_walker<I>(walker: I, root: &Path) -> (Vec<PathBuf>, usize)
where
    I: Iterator<Item = walkdir::Result<walkdir::DirEntry>>,
{
    let mut paths = Vec::new();
    let mut errors = 0;
    for item in walker {
        match item {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    let p = entry.path().strip_prefix(root).unwrap_or(entry.path());
                    paths.push(p.to_path_buf());
                }
            }
            Err(e) => {
                tracing::debug!("walk error: {e}");
                errors += 1;
            }
        }
    }
    (paths, errors)
}

fn is_excluded(path: &Path, config: &Config) -> bool {
    if config.exclude_patterns.is_empty() {
        return false;
    }
    let s = path_id(path);
    config.exclude_patterns.iter().any(|re| re.is_match(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> std::io::Result<()> {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, "")
    }

    #[test]
    fn test_discover_filters_and_sorts() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        for rel in [
            "src/b.py",
            "src/a.rs",
            "README.md",
            "node_modules/pkg/index.js",
            ".git/hooks/x.py",
            "gen/out.ts",
            "scripts/player.gd",
            "vendor/lib.cs",
        ] {
            touch(dir.path(), rel)?;
        }
        let mut config = Config::load(dir.path())?;
        config.set_excludes(vec!["^gen/".to_string()])?;

        let found = discover(&config);
        let ids: Vec<String> = found.files.iter().map(|p| path_id(p)).collect();
        assert_eq!(ids, vec!["scripts/player.gd", "src/a.rs", "src/b.py"]);
        assert_eq!(found.walk_errors, 0);
        Ok(())
    }

    #[test]
    fn test_configured_prune_dirs() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        touch(dir.path(), "fixtures/sample.py")?;
        touch(dir.path(), "app.py")?;
        let mut config = Config::load(dir.path())?;
        config.scan.prune_dirs.push("fixtures".to_string());

        let found = discover(&config);
        assert_eq!(found.files, vec![PathBuf::from("app.py")]);
        Ok(())
    }

    #[test]
    fn test_single_file_target() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        touch(dir.path(), "one.py")?;
        touch(dir.path(), "two.py")?;
        let config = Config::load(&dir.path().join("one.py"))?;

        let found = discover(&config);
        assert_eq!(found.files, vec![PathBuf::from("one.py")]);
        Ok(())
    }
}
