//! Output formatting for `maverick` commands.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Print rows as a table, or the underlying records as JSON.
///
/// JSON keeps numeric fields numeric; the table rows are display strings.
pub fn print_rows<T: Serialize, R: Tabled>(
    records: &[T],
    rows: impl FnOnce(&[T]) -> Vec<R>,
    empty: &str,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => {
            if records.is_empty() {
                println!("{empty}");
            } else {
                println!("{}", Table::new(rows(records)));
            }
        }
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
    }
    Ok(())
}

/// Print a single item: `text` in table mode, JSON otherwise.
pub fn print_item<T: Serialize>(item: &T, text: &str, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => println!("{text}"),
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(item)?),
    }
    Ok(())
}

/// Print a Serialize item as pretty JSON regardless of mode.
pub fn print_json<T: Serialize>(item: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(item)?);
    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m{msg}\x1b[0m");
}

pub fn pct(value: f64, dp: usize) -> String {
    format!("{:.*}%", dp, value * 100.0)
}

pub fn signed_pct(value: f64, dp: usize) -> String {
    format!("{:+.*}%", dp, value * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_from_flag() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Table);
    }

    #[test]
    fn test_percent_helpers() {
        assert_eq!(pct(0.3, 0), "30%");
        assert_eq!(pct(0.1234, 1), "12.3%");
        assert_eq!(signed_pct(-0.15, 0), "-15%");
        assert_eq!(signed_pct(0.05, 1), "+5.0%");
    }
}
