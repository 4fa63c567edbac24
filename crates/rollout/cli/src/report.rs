//! Markdown rendering of readiness reports

use crate::error::CliResult;
use rollout_types::{ReadinessReport, StageStatus};
use rollout_validator::stages;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Render a report as markdown.
pub fn render_markdown(report: &ReadinessReport) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "# Readiness Report");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "**Overall status:** {}", report.overall_status);
    let _ = writeln!(out, "**Readiness score:** {:.1}/100", report.readiness_score);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Stages");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Stage | Status | Score | Issues |");
    let _ = writeln!(out, "|-------|--------|-------|--------|");
    for (name, _) in stages::STAGE_WEIGHTS {
        let Some(stage) = report.stages.get(name) else {
            continue;
        };
        let score = if stage.status == StageStatus::Error {
            "n/a".to_string()
        } else {
            format!("{:.1}", stage.score)
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            stages::title(name),
            stage.status,
            score,
            stage.issues.len()
        );
    }

    write_list(&mut out, "Critical Issues", &report.critical_issues);
    write_list(&mut out, "Warnings", &report.warnings);
    write_list(&mut out, "Recommendations", &report.recommendations);

    out
}

fn write_list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## {}", title);
    let _ = writeln!(out);
    if items.is_empty() {
        let _ = writeln!(out, "None.");
    }
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}

/// File name for a report generated at the report's timestamp
pub fn report_file_name(report: &ReadinessReport) -> String {
    format!(
        "readiness-report-{}.md",
        report.generated_at.format("%Y%m%d-%H%M%S")
    )
}

/// Write the markdown report into `dir`, creating it if needed.
pub fn write_report(report: &ReadinessReport, dir: &Path) -> CliResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(report_file_name(report));
    std::fs::write(&path, render_markdown(report))?;
    Ok(path)
}
