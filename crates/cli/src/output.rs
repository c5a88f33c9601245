//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a table, or pretty JSON of `json` when JSON output is selected
pub fn print_table<T: Tabled, J: Serialize + ?Sized>(
    items: &[T],
    json: &J,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No metrics gathered".yellow());
                return Ok(());
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(json).context("Failed to serialize output")?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Format a milli-unit quantity the way kubectl does (`250m`, `1.5`)
pub fn format_milli(milli: i64) -> String {
    if milli % 1000 == 0 {
        format!("{}", milli / 1000)
    } else if milli.abs() >= 1000 {
        format!("{:.1}", milli as f64 / 1000.0)
    } else {
        format!("{}m", milli)
    }
}

/// Format a pod count, highlighting non-zero gaps
pub fn color_gap(count: usize) -> String {
    if count == 0 {
        count.to_string()
    } else {
        count.to_string().yellow().to_string()
    }
}
