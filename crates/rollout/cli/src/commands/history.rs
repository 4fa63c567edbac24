//! `history` command

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{self, format_transition_status, percent, OutputFormat};
use rollout_types::TransitionRecord;
use serde::Serialize;
use tabled::Tabled;

/// Table row for transition display
#[derive(Debug, Serialize, Tabled)]
struct TransitionRow {
    id: i64,
    from: String,
    to: String,
    kind: String,
    status: String,
    attempt: u32,
    quality: String,
    initiated: String,
    duration: String,
    reason: String,
}

impl From<&TransitionRecord> for TransitionRow {
    fn from(r: &TransitionRecord) -> Self {
        let reason = match &r.rollback_reason {
            Some(rollback) => format!("{} ({})", r.trigger_reason, rollback),
            None => r.trigger_reason.clone(),
        };
        Self {
            id: r.id,
            from: r.from_level.to_string(),
            to: r.to_level.to_string(),
            kind: r.kind.to_string(),
            status: format_transition_status(r.status),
            attempt: r.attempt_number,
            quality: percent(r.quality_score_at_start),
            initiated: r.initiated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration: r
                .duration()
                .map(|d| format!("{}s", d.num_seconds()))
                .unwrap_or_else(|| "-".to_string()),
            reason: truncate(&reason, 60),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

pub async fn execute(ctx: &Context, limit: usize) -> CliResult<()> {
    let records = ctx.controller.history(limit).await?;
    match ctx.output {
        // Full records, untruncated
        OutputFormat::Json => output::print_json(&records),
        OutputFormat::Table => {
            output::print_output(records.iter().map(TransitionRow::from).collect(), ctx.output)
        }
    }
}
