//! Operator commands: `reset-attempts` and `recover`

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{self, format_level, print_success, print_warning, OutputFormat};
use rollout_types::AuthorityLevel;

pub async fn reset_attempts(ctx: &Context) -> CliResult<()> {
    let previous = ctx.controller.reset_attempts().await?;
    match ctx.output {
        OutputFormat::Json => output::print_json(&serde_json::json!({ "previous": previous })),
        OutputFormat::Table => {
            print_success(&format!("Transition attempts reset (was {})", previous));
            Ok(())
        }
    }
}

pub async fn recover(ctx: &Context, level: AuthorityLevel) -> CliResult<()> {
    let state = ctx.controller.recover(level).await?;
    match ctx.output {
        OutputFormat::Json => output::print_json(&state),
        OutputFormat::Table => {
            print_success(&format!(
                "Mode state recovered: {} / {}",
                format_level(state.current_level),
                state.transition_phase
            ));
            print_warning("The authority switch was not called; make sure the component runs at this level");
            Ok(())
        }
    }
}
