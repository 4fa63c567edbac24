//! `transition` command

use crate::commands::validate::print_report;
use crate::context::Context;
use crate::error::{CliError, CliResult};
use crate::output::{
    self, format_level, percent, print_error, print_info, print_success, print_warning, section,
    OutputFormat,
};
use colored::*;
use rollout_controller::{TransitionError, TransitionReport};
use rollout_types::AuthorityLevel;

pub async fn execute(
    ctx: &Context,
    target: AuthorityLevel,
    reason: Option<String>,
    yes: bool,
) -> CliResult<()> {
    let state = ctx.controller.state().await?;
    let reason = reason.unwrap_or_else(|| "manual operator transition".to_string());

    // Pre-flight diagnostics; the controller's gate decides.
    let preflight = ctx.validator.validate().await;
    if ctx.output == OutputFormat::Table {
        section("Pre-flight Validation");
        print_report(&preflight)?;
        println!();
        if !preflight.is_ready() {
            print_warning("Pre-flight validation is not READY; the readiness gate may block this transition");
        }
    }

    if ctx.config.environment.requires_confirmation() && !yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Move {} authority from {} to {}?",
                ctx.config.environment, state.current_level, target
            ))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            print_error("Aborted");
            return Ok(());
        }
    }

    print_info(&format!(
        "Transitioning {} -> {} (settle period {}s)",
        state.current_level,
        target,
        ctx.controller.config().settle_period_secs
    ));

    match ctx.controller.execute_transition(target, &reason).await {
        Ok(report) => {
            match ctx.output {
                OutputFormat::Json => output::print_json(&report)?,
                OutputFormat::Table => print_outcome(&report),
            }
            Ok(())
        }
        Err(e) => {
            if ctx.output == OutputFormat::Json {
                output::print_json(&serde_json::json!({
                    "error": e.to_string(),
                    "blockers": e.blockers(),
                    "requires_operator": e.requires_operator(),
                }))?;
            } else {
                print_failure(&e);
            }
            Err(CliError::Unsuccessful(format!("Transition to {} failed", target)))
        }
    }
}

fn print_outcome(report: &TransitionReport) {
    print_success(&format!(
        "Authority is now {} (transition #{})",
        format_level(report.record.to_level),
        report.record.id
    ));

    section("Metrics");
    println!("  {:<16} {:>10} {:>10}", "", "before", "after");
    let rows = [
        ("Quality", report.before.quality, report.after.quality),
        ("Coherence", report.before.coherence, report.after.coherence),
        ("Precision", report.before.precision, report.after.precision),
        (
            "Success rate",
            report.before.dependent_success_rate,
            report.after.dependent_success_rate,
        ),
    ];
    for (label, before, after) in rows {
        println!("  {:<16} {:>10} {:>10}", label, percent(before), percent(after));
    }

    let delta = report.quality_delta();
    let text = format!("{:+.1} points", delta);
    println!(
        "  Quality change: {}",
        if delta < 0.0 { text.red() } else { text.green() }
    );
}

fn print_failure(error: &TransitionError) {
    match error {
        TransitionError::Blocked { blockers } => {
            print_error("Transition blocked by the readiness gate:");
            for blocker in blockers {
                println!("  - {}", blocker);
            }
        }
        other => print_error(&other.to_string()),
    }

    match error {
        TransitionError::RollbackFailed { .. } => print_warning(
            "Rollback failed. Verify the governed component's level, then run `rolloutctl recover <level>`",
        ),
        TransitionError::AttemptsExceeded { .. } => {
            print_warning("Attempt limit reached. Run `rolloutctl reset-attempts` once the cause is fixed")
        }
        _ => {}
    }
}
