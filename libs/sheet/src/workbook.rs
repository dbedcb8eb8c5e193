//! Workbook and worksheet table model.
//!
//! A workbook is an ordered list of worksheets, each a grid of string cells
//! whose first row holds the headers. It is persisted as pretty-printed JSON.
//!
//! Worksheets are located by their header row. When no sheet carries the
//! expected headers, the conventional position is used instead:
//!
//! - 0: config
//! - 1: developers
//! - 2: teams

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SheetError;

/// Developers sheet columns, in order.
pub const DEVELOPER_COLUMNS: [&str; 3] =
    ["Developer", "Number of Reviewers", "Preferable Reviewers"];

/// Teams sheet columns, in order.
pub const TEAM_COLUMNS: [&str; 3] = ["Team", "Team Developers", "Number of Reviewers"];

/// Rotation index sheet columns, in order.
pub const INDEX_COLUMNS: [&str; 2] = ["Developer", "Reviewer Indexes"];

/// Title of the sheet holding ring positions between rotations.
pub const INDEX_SHEET_TITLE: &str = "Rotation Indexes";

/// Config sheet column A header for an allow-list of experienced developers.
pub const EXPERIENCED_HEADER: &str = "Experienced Developers";

/// Config sheet column A header for a deny-list of unexperienced developers.
pub const UNEXPERIENCED_HEADER: &str = "Unexperienced Developers";

/// The kinds of worksheet a workbook can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Config,
    Developers,
    Teams,
    RotationIndexes,
}

impl SheetKind {
    /// Conventional position of the sheet, if it has one.
    pub fn fallback_index(self) -> Option<usize> {
        match self {
            Self::Config => Some(0),
            Self::Developers => Some(1),
            Self::Teams => Some(2),
            Self::RotationIndexes => None,
        }
    }

    /// Number of leading columns that precede the dated snapshots.
    pub fn fixed_columns(self) -> usize {
        match self {
            Self::Developers => DEVELOPER_COLUMNS.len(),
            Self::Teams => TEAM_COLUMNS.len(),
            Self::RotationIndexes => INDEX_COLUMNS.len(),
            Self::Config => 0,
        }
    }

    fn matches(self, sheet: &Worksheet) -> bool {
        let header = sheet.header();
        let starts_with = |columns: &[&str]| header_starts_with(header, columns);
        match self {
            Self::Config => header.first().is_some_and(|first| {
                let first = first.trim();
                first == EXPERIENCED_HEADER || first == UNEXPERIENCED_HEADER
            }),
            Self::Developers => starts_with(&DEVELOPER_COLUMNS[..]),
            Self::Teams => starts_with(&TEAM_COLUMNS[..]),
            Self::RotationIndexes => {
                sheet.title == INDEX_SHEET_TITLE || starts_with(&INDEX_COLUMNS[..])
            }
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Developers => "developers",
            Self::Teams => "teams",
            Self::RotationIndexes => "rotation indexes",
        };
        f.write_str(name)
    }
}

/// Returns true if `header` starts with `columns`, ignoring surrounding
/// whitespace in the header cells.
fn header_starts_with(header: &[String], columns: &[&str]) -> bool {
    let mut pairs = columns.iter().zip(header);
    header.len() >= columns.len() && pairs.all(|(column, found)| found.trim() == *column)
}

/// A single grid of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worksheet {
    pub title: String,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

impl Worksheet {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Build a worksheet from string slices, mostly for fixtures.
    pub fn from_rows<R, C>(title: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            title: title.into(),
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// The header row, empty if the sheet has no rows.
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Data rows below the header.
    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// Cell content, empty for cells beyond the end of a row.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    /// Overwrite a cell, growing the grid as needed.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= column {
            cells.resize(column + 1, String::new());
        }
        cells[column] = value.into();
    }

    /// Insert a column at `index`, shifting later cells right.
    ///
    /// `values[0]` is the header. Rows shorter than `index` are padded, and
    /// missing values become empty cells.
    pub fn insert_column(&mut self, index: usize, values: Vec<String>) {
        let height = self.rows.len().max(values.len());
        self.rows.resize_with(height, Vec::new);

        let mut values = values.into_iter();
        for row in &mut self.rows {
            if row.len() < index {
                row.resize(index, String::new());
            }
            row.insert(index, values.next().unwrap_or_default());
        }
    }

    /// Check that the header row starts with `expected`.
    pub fn expect_headers(&self, expected: &[&str]) -> Result<(), SheetError> {
        let header = self.header();
        if header_starts_with(header, expected) {
            Ok(())
        } else {
            Err(SheetError::UnexpectedHeaders {
                sheet: self.title.clone(),
                expected: expected.iter().map(|s| s.to_string()).collect(),
                found: header.iter().take(expected.len()).cloned().collect(),
            })
        }
    }
}

/// An ordered set of worksheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub worksheets: Vec<Worksheet>,
}

impl Workbook {
    /// Load a workbook from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SheetError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| SheetError::io(path, e))?;
        let workbook: Self = serde_json::from_str(&contents).map_err(|source| SheetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = ?path, sheets = workbook.worksheets.len(), "Loaded workbook");
        Ok(workbook)
    }

    /// Write the workbook back as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self).map_err(|source| SheetError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, contents + "\n").map_err(|e| SheetError::io(path, e))?;
        debug!(path = ?path, "Saved workbook");
        Ok(())
    }

    /// Position of the first sheet whose headers match `kind`.
    pub fn find_by_headers(&self, kind: SheetKind) -> Option<usize> {
        self.worksheets.iter().position(|sheet| kind.matches(sheet))
    }

    /// Position of the sheet of `kind`, by headers or by conventional
    /// position.
    ///
    /// The positional fallback is skipped when the sheet there is recognised
    /// as a different kind.
    pub fn find(&self, kind: SheetKind) -> Option<usize> {
        if let Some(index) = self.find_by_headers(kind) {
            return Some(index);
        }

        let index = kind.fallback_index()?;
        let sheet = self.worksheets.get(index)?;
        let claimed = [
            SheetKind::Config,
            SheetKind::Developers,
            SheetKind::Teams,
            SheetKind::RotationIndexes,
        ]
        .into_iter()
        .any(|other| other != kind && other.matches(sheet));
        if claimed {
            return None;
        }

        warn!(
            kind = %kind,
            index,
            title = %sheet.title,
            "Sheet not detected by headers, using default position"
        );
        Some(index)
    }

    pub fn sheet(&self, kind: SheetKind) -> Result<&Worksheet, SheetError> {
        self.find(kind)
            .map(|index| &self.worksheets[index])
            .ok_or(SheetError::MissingSheet(kind))
    }

    pub fn sheet_mut(&mut self, kind: SheetKind) -> Result<&mut Worksheet, SheetError> {
        match self.find(kind) {
            Some(index) => Ok(&mut self.worksheets[index]),
            None => Err(SheetError::MissingSheet(kind)),
        }
    }

    /// The rotation index sheet, created at the end when absent.
    pub fn index_sheet_mut(&mut self) -> &mut Worksheet {
        let index = match self.find_by_headers(SheetKind::RotationIndexes) {
            Some(index) => index,
            None => {
                let sheet = Worksheet::from_rows(INDEX_SHEET_TITLE, [INDEX_COLUMNS]);
                self.worksheets.push(sheet);
                self.worksheets.len() - 1
            }
        };
        &mut self.worksheets[index]
    }
}
