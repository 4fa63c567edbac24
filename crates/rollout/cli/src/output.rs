//! Output formatting utilities

use crate::error::CliResult;
use colored::*;
use rollout_types::{AuthorityLevel, OverallStatus, StageStatus, TransitionPhase, TransitionStatus};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or as a JSON array
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                println!("{}", Table::new(data));
            }
        }
        OutputFormat::Json => print_json(&data)?,
    }
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn section(title: &str) {
    println!("\n{}", title.bold().underline());
}

pub fn percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_level(level: AuthorityLevel) -> ColoredString {
    match level {
        AuthorityLevel::Observing => level.as_str().cyan(),
        AuthorityLevel::Partial => level.as_str().yellow(),
        AuthorityLevel::Full => level.as_str().green(),
    }
}

pub fn format_phase(phase: TransitionPhase) -> ColoredString {
    match phase {
        TransitionPhase::Stable => phase.as_str().green(),
        TransitionPhase::Transitioning => phase.as_str().yellow(),
        TransitionPhase::RollingBack => phase.as_str().red().bold(),
    }
}

pub fn format_overall(status: OverallStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        OverallStatus::Ready => text.green().bold(),
        OverallStatus::NeedsImprovement => text.yellow().bold(),
        OverallStatus::NotReady | OverallStatus::Error => text.red().bold(),
    }
}

pub fn format_stage(status: StageStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        StageStatus::Pass => text.green(),
        StageStatus::Warning => text.yellow(),
        StageStatus::Fail => text.red(),
        StageStatus::Error => text.red().dimmed(),
    }
}

pub fn format_transition_status(status: TransitionStatus) -> String {
    let text = status.as_str();
    match status {
        TransitionStatus::Completed => text.green().to_string(),
        TransitionStatus::RolledBack => text.yellow().to_string(),
        TransitionStatus::Failed => text.red().to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Table);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.805), "80.5%");
        assert_eq!(percent(1.0), "100.0%");
    }
}
