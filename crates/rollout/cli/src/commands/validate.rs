//! `validate` and `report` commands

use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::output::{self, format_overall, format_stage, print_success, section, OutputFormat};
use crate::report;
use colored::*;
use rollout_types::{ReadinessReport, StageStatus};
use rollout_validator::stages;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

/// Table row for stage display
#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    stage: String,
    status: String,
    score: String,
    weight: String,
    issues: usize,
}

fn stage_rows(report: &ReadinessReport) -> Vec<StageRow> {
    stages::STAGE_WEIGHTS
        .iter()
        .filter_map(|(name, weight)| {
            report.stages.get(*name).map(|stage| StageRow {
                stage: stages::title(name).to_string(),
                status: format_stage(stage.status).to_string(),
                score: if stage.status == StageStatus::Error {
                    "n/a".to_string()
                } else {
                    format!("{:.1}", stage.score)
                },
                weight: format!("{:.0}%", weight),
                issues: stage.issues.len(),
            })
        })
        .collect()
}

/// Print a report in table form
pub fn print_report(report: &ReadinessReport) -> CliResult<()> {
    println!(
        "{} {}  (score {:.1}/100)",
        "Readiness:".bold(),
        format_overall(report.overall_status),
        report.readiness_score
    );
    println!();
    output::print_output(stage_rows(report), OutputFormat::Table)?;

    if !report.critical_issues.is_empty() {
        section("Critical Issues");
        for issue in &report.critical_issues {
            println!("  {} {}", "✗".red(), issue);
        }
    }
    if !report.warnings.is_empty() {
        section("Warnings");
        for warning in &report.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }
    section("Recommendations");
    for recommendation in &report.recommendations {
        println!("  - {}", recommendation);
    }
    Ok(())
}

/// Run the six-stage validation; fails unless the system is ready.
pub async fn execute(ctx: &Context) -> CliResult<()> {
    let report = ctx.validator.validate().await;

    match ctx.output {
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Table => print_report(&report)?,
    }

    if report.is_ready() {
        Ok(())
    } else {
        Err(CliError::Unsuccessful(format!(
            "System is {} (score {:.1})",
            report.overall_status, report.readiness_score
        )))
    }
}

/// Render the report as markdown and persist it.
pub async fn execute_report(ctx: &Context, dir: Option<PathBuf>) -> CliResult<()> {
    let report = ctx.validator.validate().await;
    let dir = dir.unwrap_or_else(|| ctx.config.report_dir.clone());
    let path = report::write_report(&report, &dir)?;

    match ctx.output {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "path": path,
            "report": report,
        }))?,
        OutputFormat::Table => {
            println!("{}", report::render_markdown(&report));
            print_success(&format!("Report saved to {}", path.display()));
        }
    }
    Ok(())
}
