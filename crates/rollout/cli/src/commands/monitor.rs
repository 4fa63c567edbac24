//! `monitor` command

use crate::context::Context;
use crate::error::CliResult;
use crate::output::{print_info, print_success, OutputFormat};
use colored::*;
use rollout_monitor::TrendMonitor;
use rollout_types::{EventSeverity, RolloutEventEnvelope};
use tokio::sync::{broadcast, watch};

pub async fn execute(ctx: &Context, auto: bool) -> CliResult<()> {
    let mut config = ctx.config.monitor.clone();
    config.auto_transition |= auto;

    let monitor = TrendMonitor::new(
        config.clone(),
        ctx.controller.clone(),
        ctx.metrics.clone(),
        ctx.store.clone(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, stopping monitor");
            let _ = shutdown_tx.send(true);
        }
    });

    let events = ctx.controller.subscribe();
    let printer = tokio::spawn(print_events(events, ctx.output));

    print_info(&format!(
        "Monitoring every {}s (automatic transitions {}). Press Ctrl+C to stop.",
        config.poll_interval_secs,
        if config.auto_transition { "enabled" } else { "disabled" }
    ));

    monitor.run(shutdown_rx).await;
    printer.abort();

    print_success("Monitor stopped");
    Ok(())
}

async fn print_events(mut rx: broadcast::Receiver<RolloutEventEnvelope>, format: OutputFormat) {
    loop {
        match rx.recv().await {
            Ok(envelope) => print_event(&envelope, format),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_event(envelope: &RolloutEventEnvelope, format: OutputFormat) {
    if envelope.severity == EventSeverity::Debug {
        return;
    }
    match format {
        OutputFormat::Json => {
            if let Ok(line) = serde_json::to_string(envelope) {
                println!("{}", line);
            }
        }
        OutputFormat::Table => {
            let severity = match envelope.severity {
                EventSeverity::Critical | EventSeverity::Error => "ERROR".red().bold(),
                EventSeverity::Warning => "WARN".yellow(),
                _ => "INFO".blue(),
            };
            println!(
                "{} {} {:?}",
                envelope.timestamp.format("%H:%M:%S").to_string().dimmed(),
                severity,
                envelope.event
            );
        }
    }
}
