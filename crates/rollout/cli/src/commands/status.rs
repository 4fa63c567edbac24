//! `status` command

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{self, format_level, format_phase, percent, print_warning, section, OutputFormat};
use colored::*;
use rollout_metrics::MetricsSource;
use rollout_types::{AuthorityLevel, MetricsSnapshot, ModeState, ReadinessGate};
use rollout_validator::LevelRequirements;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct StatusView {
    state: ModeState,
    max_transition_attempts: u32,
    next_level: Option<AuthorityLevel>,
    next_level_requirements: Option<LevelRequirements>,
    metrics: Option<MetricsSnapshot>,
    metrics_error: Option<String>,
    readiness: Option<ReadinessGate>,
}

pub async fn execute(ctx: &Context) -> CliResult<()> {
    let state = ctx.controller.state().await?;
    let max = ctx.controller.config().max_transition_attempts;
    let next_level = state.current_level.next();

    let (metrics, readiness, metrics_error) = match next_level {
        Some(next) => match ctx
            .validator
            .check_readiness(next, state.transition_attempts, max)
            .await
        {
            Ok((metrics, gate)) => (Some(metrics), Some(gate), None),
            Err(e) => (None, None, Some(e.to_string())),
        },
        None => match ctx.metrics.fetch().await {
            Ok(metrics) => (Some(metrics), None, None),
            Err(e) => (None, None, Some(e.to_string())),
        },
    };

    let view = StatusView {
        max_transition_attempts: max,
        next_level,
        next_level_requirements: next_level.and_then(LevelRequirements::for_level),
        metrics,
        metrics_error,
        readiness,
        state,
    };

    match ctx.output {
        OutputFormat::Json => output::print_json(&view),
        OutputFormat::Table => {
            print_view(&view);
            Ok(())
        }
    }
}

fn print_view(view: &StatusView) {
    let state = &view.state;

    section("Authority");
    println!("  Level:     {}", format_level(state.current_level));
    println!("  Phase:     {}", format_phase(state.transition_phase));
    println!(
        "  Attempts:  {}/{}",
        state.transition_attempts, view.max_transition_attempts
    );
    if let Some(at) = state.last_attempt_at {
        println!("  Last attempt: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Updated:   {}", state.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    if let (Some(next), Some(req)) = (view.next_level, &view.next_level_requirements) {
        section(&format!("Requirements for {}", next));
        println!("  Quality:          >= {}", percent(req.min_quality));
        println!("  Success rate:     >= {}", percent(req.min_success_rate));
        println!("  Completed tasks:  >= {}", req.min_completed_tasks);
        println!("  Failure rate:     <= {}", percent(req.max_failure_rate));
    }

    section("Live Metrics");
    match (&view.metrics, &view.metrics_error) {
        (Some(m), _) => {
            println!("  Quality:          {}", percent(m.quality));
            println!("  Coherence:        {}", percent(m.coherence));
            println!("  Precision:        {}", percent(m.precision));
            println!("  Success rate:     {}", percent(m.dependent_success_rate));
            println!(
                "  Tasks:            {} completed, {} failed ({})",
                m.completed_tasks,
                m.failed_tasks,
                percent(m.failure_rate)
            );
            println!("  Avg execution:    {:.0} ms", m.avg_execution_ms);
        }
        (None, Some(error)) => print_warning(&format!("Metrics unavailable: {}", error)),
        (None, None) => {}
    }

    if let (Some(next), Some(gate)) = (view.next_level, &view.readiness) {
        section(&format!("Readiness for {}", next));
        if gate.ready {
            println!("  {}", "Ready".green().bold());
        } else {
            println!("  {}", "Blocked".red().bold());
            for blocker in &gate.blockers {
                println!("  - {}", blocker);
            }
        }
    } else if view.next_level.is_none() {
        println!("\n{}", "Already at the highest authority level".dimmed());
    }
}
