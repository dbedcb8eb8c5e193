//! Error handling and display for the CLI.

use colored::Colorize;
use rota_allocation::AllocationError;
use rota_sheet::SheetError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("No workbooks configured. Pass --workbook or set ROTA_WORKBOOKS.")]
    NoWorkbooks,

    #[error("{failed} of {total} workbooks failed")]
    WorkbooksFailed { failed: usize, total: usize },
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    if let Some(hint) = hint(err) {
        eprintln!("\n{}", format!("Hint: {hint}").yellow());
    }
}

fn hint(err: &anyhow::Error) -> Option<&'static str> {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::NoWorkbooks => Some("Set ROTA_WORKBOOKS to one workbook path per line."),
            CliError::WorkbooksFailed { .. } => {
                Some("Failed workbooks carry an Exception column with the reason.")
            }
        };
    }

    let allocation = err
        .downcast_ref::<AllocationError>()
        .or_else(|| match err.downcast_ref::<SheetError>() {
            Some(SheetError::Roster(inner)) => Some(inner),
            _ => None,
        });
    if let Some(allocation) = allocation {
        return match allocation {
            AllocationError::Infeasible { .. } => {
                Some("Add experienced developers to the Config sheet or lower reviewer numbers.")
            }
            AllocationError::DuplicateName(_) => Some("Every row needs a unique name."),
            AllocationError::EmptyRoster => Some("Add at least one developer row."),
            _ => None,
        };
    }

    match err.downcast_ref::<SheetError>() {
        Some(SheetError::MissingSheet(_)) | Some(SheetError::UnexpectedHeaders { .. }) => {
            Some("Check the sheet header row against the expected column names.")
        }
        Some(SheetError::Io { .. }) => Some("Check the workbook path and its permissions."),
        Some(SheetError::InvalidDate(_)) => Some("Dates use the dd-mm-yyyy format."),
        _ => None,
    }
}
