//! Output formatting for CLI commands.

use std::collections::BTreeMap;

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
}

/// Allocation written to one sheet of one workbook.
#[derive(Debug, Clone, Serialize)]
pub struct SheetResult {
    pub workbook: String,
    pub sheet: String,
    /// Entry name to its assigned reviewers.
    pub reviewers: BTreeMap<String, Vec<String>>,
}

/// One table line of a [`SheetResult`].
#[derive(Debug, Clone, Tabled)]
struct ReviewerRow {
    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "Reviewers")]
    reviewers: String,
}

impl SheetResult {
    fn rows(&self) -> Vec<ReviewerRow> {
        self.reviewers
            .iter()
            .map(|(name, reviewers)| ReviewerRow {
                name: name.clone(),
                reviewers: if reviewers.is_empty() {
                    "-".to_string()
                } else {
                    reviewers.join(", ")
                },
            })
            .collect()
    }
}

/// Print an allocation result in the specified format.
pub fn print_result(result: &SheetResult, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let sheet = format!("({})", result.sheet);
            println!("{} {}", result.workbook.bold(), sheet.dimmed());
            let rows = result.rows();
            if rows.is_empty() {
                println!("{}", "No entries found.".dimmed());
            } else {
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => println!("{}", format_json(result)),
    }
}

/// Print a single serializable item as JSON.
pub fn print_single<T: Serialize>(data: &T) {
    println!("{}", format_json(data));
}

fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "Success:".green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "Info:".blue().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_join_reviewers() {
        let mut reviewers = BTreeMap::new();
        reviewers.insert("Dev1".to_string(), vec!["Dev2".to_string(), "Dev3".to_string()]);
        reviewers.insert("Dev2".to_string(), Vec::new());
        let result = SheetResult {
            workbook: "team.json".to_string(),
            sheet: "developers".to_string(),
            reviewers,
        };

        let rows = result.rows();
        assert_eq!(rows[0].reviewers, "Dev2, Dev3");
        assert_eq!(rows[1].reviewers, "-");
    }
}
