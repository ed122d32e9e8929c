//! Rendering and writing of the final report.

pub mod console;
pub mod json;

use std::fs;
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Text,
}

/// Renders `report` and writes it to `output`, or stdout when `None`.
///
/// # Errors
/// Returns error if serialization fails or the sink cannot be written.
pub fn emit(report: &Report, format: OutputFormat, top: usize, output: Option<&Path>) -> Result<()> {
    if output.is_some() {
        colored::control::set_override(false);
    }
    let rendered = match format {
        OutputFormat::Json => json::render(report)?,
        OutputFormat::Text => console::render(report, top)?,
    };

    match output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(rendered.as_bytes())
                .context("failed to write report to stdout")
        }
    }
}
