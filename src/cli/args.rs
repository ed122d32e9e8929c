use std::path::PathBuf;

use clap::Parser;

use crate::config::FailOn;
use crate::reporting::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "metricmap",
    version,
    about = "Complexity metrics and dependency cycles for mixed-language projects"
)]
pub struct Cli {
    /// Directory or single file to scan
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the report to FILE instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the dependency graph as Graphviz DOT
    #[arg(long, value_name = "FILE")]
    pub dot: Option<PathBuf>,

    /// Run the security pattern scan
    #[arg(long)]
    pub security: bool,

    /// Lowest bucket that fails the run (overrides metricmap.toml)
    #[arg(long, value_enum)]
    pub fail_on: Option<FailOn>,

    /// Fail the run when the graph has a cycle
    #[arg(long)]
    pub fail_on_cycles: bool,

    /// Rows in the text ranking
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Lines the token scan reads after a signature
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub window: Option<u64>,

    /// Exclude paths matching REGEX (repeatable)
    #[arg(long, value_name = "REGEX")]
    pub exclude: Vec<String>,

    #[arg(long, short)]
    pub verbose: bool,
}
