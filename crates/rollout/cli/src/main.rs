//! rolloutctl - Operator command line for the authority rollout controller
//!
//! This CLI lets operators:
//! - Inspect the current authority level, phase and live metrics
//! - Run the six-stage readiness validation and save reports
//! - Promote or demote the governed component one level at a time
//! - Review the transition audit trail
//! - Recover from failed rollbacks
//! - Run the trend monitor with optional automatic promotion

use clap::{Parser, Subcommand};
use rollout_types::AuthorityLevel;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod context;
mod error;
mod output;
mod report;

use commands::{history, monitor, operator, status, transition, validate};
use config::{LoggingConfig, RolloutConfig};
use context::Context;
use error::CliResult;

/// rolloutctl application
#[derive(Parser)]
#[command(name = "rolloutctl")]
#[command(about = "Quality-gated authority rollout controller", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "ROLLOUT_CONFIG")]
    config: Option<String>,

    /// Output format (table, json)
    #[arg(short, long, value_enum, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Show level, phase, attempts, thresholds and live metrics
    Status,

    /// Run the six-stage readiness validation (exit code 1 unless READY)
    Validate,

    /// Move to an adjacent authority level
    Transition {
        /// Target level (observing, partial, full)
        level: AuthorityLevel,

        /// Reason recorded in the audit trail
        reason: Option<String>,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Render the validation report and save it as markdown
    Report {
        /// Output directory (defaults to `report_dir` from configuration)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Show recent transitions
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Reset the transition attempt counter
    ResetAttempts,

    /// Force the mode state back to stable after a failed rollback
    Recover {
        /// Level the governed component is actually running at
        level: AuthorityLevel,
    },

    /// Poll quality trends until Ctrl+C
    Monitor {
        /// Enable automatic promotion regardless of configuration
        #[arg(long)]
        auto: bool,
    },
}

fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = RolloutConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    let ctx = Context::build(config, cli.output).await?;

    match cli.command {
        Commands::Status => status::execute(&ctx).await,
        Commands::Validate => validate::execute(&ctx).await,
        Commands::Transition { level, reason, yes } => {
            transition::execute(&ctx, level, reason, yes).await
        }
        Commands::Report { dir } => validate::execute_report(&ctx, dir).await,
        Commands::History { limit } => history::execute(&ctx, limit).await,
        Commands::ResetAttempts => operator::reset_attempts(&ctx).await,
        Commands::Recover { level } => operator::recover(&ctx, level).await,
        Commands::Monitor { auto } => monitor::execute(&ctx, auto).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
