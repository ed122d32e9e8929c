use crate::error::Result;
use crate::report::Report;

/// Pretty JSON with a trailing newline.
///
/// # Errors
/// Returns error if serialization fails.
pub fn render(report: &Report) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DependencyGraph;
    use crate::project::ProjectType;
    use crate::report::{ProjectInfo, ReportInput};

    #[test]
    fn test_top_level_keys() -> anyhow::Result<()> {
        let report = Report::assemble(ReportInput {
            project: ProjectInfo { root: ".".into(), kind: ProjectType::Unknown },
            units: Vec::new(),
            metrics: Vec::new(),
            diagnostics: Vec::new(),
            graph: DependencyGraph::default(),
            cycles: Vec::new(),
            findings: Vec::new(),
            files_skipped: 0,
        });
        let value: serde_json::Value = serde_json::from_str(&render(&report)?)?;
        for key in [
            "project",
            "summary",
            "functions",
            "modules",
            "cycles",
            "edges",
            "unresolved",
            "findings",
            "diagnostics",
            "recommendations",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["project"]["kind"], "unknown");
        assert_eq!(value["summary"]["total_functions"], 0);
        Ok(())
    }
}
