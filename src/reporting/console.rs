use std::fmt::Write;

use anyhow::Result;
use colored::Colorize;

use crate::report::{FunctionEntry, Report};
use crate::security::Severity;
use crate::types::{AnalysisMode, Bucket};

/// Builds the multi-section text report.
///
/// # Errors
/// Returns error if formatting fails.
pub fn render(report: &Report, top: usize) -> Result<String> {
    let mut out = String::new();
    write_summary(&mut out, report)?;
    write_ranking(&mut out, report, top)?;
    write_cycles(&mut out, report)?;
    write_unresolved(&mut out, report)?;
    write_findings(&mut out, report)?;
    write_diagnostics(&mut out, report)?;
    write_recommendations(&mut out, report)?;
    Ok(out)
}

fn heading(out: &mut String, title: &str) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", title.bold().underline())?;
    Ok(())
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn write_summary(out: &mut String, report: &Report) -> Result<()> {
    let s = &report.summary;
    writeln!(
        out,
        "{} {} ({})",
        "metricmap".cyan().bold(),
        report.project.root,
        report.project.kind.label()
    )?;
    heading(out, "Summary")?;

    let languages: Vec<String> = s.languages.iter().map(|(l, n)| format!("{l} {n}")).collect();
    writeln!(
        out,
        "  files      {} scanned, {} skipped  [{}]",
        s.files_scanned,
        s.files_skipped,
        languages.join(", ")
    )?;
    writeln!(
        out,
        "  functions  {} total: {} high, {} medium, {} low",
        s.total_functions,
        s.high_complexity_count.to_string().red(),
        s.medium_complexity_count.to_string().yellow(),
        s.low_complexity_count.to_string().green()
    )?;
    writeln!(
        out,
        "  average    cyclomatic {:.2}, cognitive {:.2}",
        s.average_cyclomatic_complexity, s.average_cognitive_complexity
    )?;
    writeln!(
        out,
        "  symbols    {} {}, {} {}, {} {}, {} {}",
        s.classes,
        if s.classes == 1 { "class" } else { "classes" },
        s.constants,
        pluralize("constant", s.constants),
        s.signals,
        pluralize("signal", s.signals),
        s.exports,
        pluralize("export", s.exports)
    )?;
    writeln!(
        out,
        "  graph      {} {}, {} dangling, {} external, {} {}",
        s.edges,
        pluralize("edge", s.edges),
        s.dangling_references,
        s.external_references,
        s.cycles,
        pluralize("cycle", s.cycles)
    )?;
    if !s.top_dependents.is_empty() {
        let tops: Vec<String> = s
            .top_dependents
            .iter()
            .map(|d| format!("{} ({})", d.file, d.edges))
            .collect();
        writeln!(out, "  fan-out    {}", tops.join(", "))?;
    }
    Ok(())
}

fn bucket_label(bucket: Bucket) -> String {
    match bucket {
        Bucket::High => "HIGH".red().bold().to_string(),
        Bucket::Medium => "MED ".yellow().to_string(),
        Bucket::Low => "LOW ".green().to_string(),
    }
}

fn write_entry(out: &mut String, f: &FunctionEntry) -> Result<()> {
    let m = &f.metric;
    let approx = if m.mode == AnalysisMode::TokenScan { "~" } else { " " };
    writeln!(
        out,
        "  {} {:>4}{approx} {:>5} {:>6} {:>6}  {}:{} {}",
        bucket_label(f.bucket),
        m.cyclomatic,
        m.cognitive,
        m.lines,
        m.parameters,
        m.file,
        m.line,
        m.name.bold()
    )?;
    Ok(())
}

fn write_ranking(out: &mut String, report: &Report, top: usize) -> Result<()> {
    if report.functions.is_empty() {
        return Ok(());
    }
    heading(out, &format!("Top {} by cyclomatic complexity", top.min(report.functions.len())))?;
    writeln!(out, "  {}", "     cyc   cog lines params  location".dimmed())?;
    for entry in report.functions.iter().take(top) {
        write_entry(out, entry)?;
    }
    if report.functions.iter().any(|f| f.metric.mode == AnalysisMode::TokenScan) {
        writeln!(out, "  {}", "~ token scan estimate".dimmed())?;
    }
    Ok(())
}

fn write_cycles(out: &mut String, report: &Report) -> Result<()> {
    if report.cycles.is_empty() {
        return Ok(());
    }
    heading(out, "Dependency cycles")?;
    for cycle in &report.cycles {
        let first = cycle.first().map_or("", String::as_str);
        writeln!(out, "  {} {} -> {first}", "!".red().bold(), cycle.join(" -> "))?;
    }
    Ok(())
}

fn write_unresolved(out: &mut String, report: &Report) -> Result<()> {
    if report.unresolved.is_empty() {
        return Ok(());
    }
    heading(out, "Unresolved references")?;
    for edge in &report.unresolved {
        writeln!(
            out,
            "  {}:{} {} {}",
            edge.source,
            edge.line,
            edge.raw.yellow(),
            edge.note.as_deref().unwrap_or("").dimmed()
        )?;
    }
    Ok(())
}

fn write_findings(out: &mut String, report: &Report) -> Result<()> {
    if report.findings.is_empty() {
        return Ok(());
    }
    heading(out, "Security findings")?;
    for f in &report.findings {
        let label = f.severity.label().to_uppercase();
        let label = match f.severity {
            Severity::Critical | Severity::High => label.red().bold(),
            Severity::Medium => label.yellow(),
            Severity::Low => label.dimmed(),
        };
        writeln!(out, "  {label} {}:{} {}", f.file, f.line, f.message)?;
        writeln!(out, "      {}", f.snippet.dimmed())?;
    }
    Ok(())
}

fn write_diagnostics(out: &mut String, report: &Report) -> Result<()> {
    if report.diagnostics.is_empty() {
        return Ok(());
    }
    heading(out, "Diagnostics")?;
    for d in &report.diagnostics {
        let location = d.line.map_or_else(|| d.path.clone(), |l| format!("{}:{l}", d.path));
        writeln!(out, "  {location} {}", d.message.dimmed())?;
    }
    Ok(())
}

fn write_recommendations(out: &mut String, report: &Report) -> Result<()> {
    writeln!(out)?;
    if report.recommendations.is_empty() {
        writeln!(out, "{} No complexity hotspots found.", "OK".green().bold())?;
        return Ok(());
    }
    for r in &report.recommendations {
        writeln!(out, "{} {r}", "~".yellow().bold())?;
    }
    Ok(())
}
