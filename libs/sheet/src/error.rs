//! Error types for workbook access.

use std::path::PathBuf;

use rota_allocation::AllocationError;
use thiserror::Error;

use crate::workbook::SheetKind;

/// Errors raised while reading or writing a workbook.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The workbook file could not be read or written.
    #[error("failed to access workbook {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workbook file is not valid workbook JSON.
    #[error("failed to parse workbook {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No worksheet of the requested kind exists.
    #[error("workbook has no {0} sheet")]
    MissingSheet(SheetKind),

    /// The worksheet header row does not match the expected columns.
    #[error("sheet '{sheet}' headers {found:?} do not match {expected:?}")]
    UnexpectedHeaders {
        sheet: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The config sheet has no data rows.
    #[error("config sheet is empty: expected headers in row 1 and data below")]
    EmptyConfig,

    /// A reviewer number cell is not a non-negative integer.
    #[error("row {row}: invalid reviewer number '{value}'")]
    InvalidNumber { row: usize, value: String },

    /// A date header could not be parsed.
    #[error("invalid sheet date '{0}', expected dd-mm-yyyy")]
    InvalidDate(String),

    /// The rows do not form a valid roster.
    #[error(transparent)]
    Roster(#[from] AllocationError),
}

impl SheetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means a worksheet is absent rather than
    /// malformed.
    pub fn is_missing_sheet(&self) -> bool {
        matches!(self, SheetError::MissingSheet(_))
    }
}
