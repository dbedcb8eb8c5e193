//! Roster sink: writes allocation results back into a worksheet.
//!
//! Each run leaves a dated column directly after the fixed columns, so the
//! newest snapshot is always the first column after them.
//!
//! - Scheduled run: insert a new column headed `dd-mm-yyyy`
//! - Manual run: overwrite the newest column, headed
//!   `<sprint date> / Manual Run on: dd-mm-yyyy`
//! - Failure: insert a column headed `Exception dd-mm-yyyy` holding the error

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rota_allocation::RingIndexes;
use tracing::{info, warn};

use crate::workbook::{Worksheet, INDEX_COLUMNS};

/// Date format of every dated header.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Separator between the sprint date and the manual run date.
pub const MANUAL_RUN_MARKER: &str = " / Manual Run on:";

/// Header prefix of exception columns.
pub const EXCEPTION_PREFIX: &str = "Exception";

/// Which persistence mode a write used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Scheduled,
    Manual,
}

/// Format a date for a sheet header.
pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Insert a new snapshot column after the fixed columns.
pub fn write_scheduled(
    sheet: &mut Worksheet,
    fixed_columns: usize,
    reviewers: &BTreeMap<String, Vec<String>>,
    today: NaiveDate,
) {
    let header = format_sheet_date(today);
    let column = snapshot_column(sheet, header.clone(), reviewers);
    sheet.insert_column(fixed_columns, column);
    info!(sheet = %sheet.title, header = %header, "Wrote scheduled reviewers column");
}

/// Amend the newest snapshot column in place.
///
/// Falls back to a scheduled write when there is no snapshot yet or the
/// newest column records an exception.
pub fn write_manual(
    sheet: &mut Worksheet,
    fixed_columns: usize,
    reviewers: &BTreeMap<String, Vec<String>>,
    today: NaiveDate,
) -> WriteMode {
    let current = sheet.cell(0, fixed_columns).trim().to_string();
    if current.is_empty() || current.starts_with(EXCEPTION_PREFIX) {
        info!(sheet = %sheet.title, "No current rotation column, creating a new one");
        write_scheduled(sheet, fixed_columns, reviewers, today);
        return WriteMode::Scheduled;
    }

    let sprint_date = sprint_date(&current);
    let today = format_sheet_date(today);
    let header = format!("{sprint_date}{MANUAL_RUN_MARKER} {today}");
    let column = snapshot_column(sheet, header.clone(), reviewers);
    for (row, value) in column.into_iter().enumerate() {
        sheet.set_cell(row, fixed_columns, value);
    }
    info!(sheet = %sheet.title, header = %header, "Updated current reviewers column");
    WriteMode::Manual
}

/// Insert an exception column recording `message`.
pub fn write_exception(
    sheet: &mut Worksheet,
    fixed_columns: usize,
    message: &str,
    today: NaiveDate,
) {
    let header = format!("{EXCEPTION_PREFIX} {}", format_sheet_date(today));
    sheet.insert_column(fixed_columns, vec![header, message.to_string()]);
    warn!(sheet = %sheet.title, error = %message, "Wrote exception column");
}

/// Replace the rotation index sheet contents with `indexes`.
pub fn write_indexes(sheet: &mut Worksheet, indexes: &RingIndexes) {
    sheet.rows.clear();
    let header: Vec<String> = INDEX_COLUMNS.iter().map(|s| s.to_string()).collect();
    sheet.rows.push(header);
    for (name, positions) in indexes {
        let positions: Vec<String> = positions.iter().map(usize::to_string).collect();
        sheet.rows.push(vec![name.clone(), positions.join(", ")]);
    }
}

/// Sprint date part of a snapshot header.
pub fn sprint_date(header: &str) -> &str {
    match header.split_once(MANUAL_RUN_MARKER) {
        Some((date, _)) => date.trim(),
        None => header.trim(),
    }
}

/// Header plus one cell per row, matched by the name in column A.
fn snapshot_column(
    sheet: &Worksheet,
    header: String,
    reviewers: &BTreeMap<String, Vec<String>>,
) -> Vec<String> {
    let mut column = vec![header];
    for cells in sheet.data_rows() {
        let name = cells.first().map_or("", |c| c.trim());
        let value = match reviewers.get(name) {
            Some(list) => list.join(", "),
            None => {
                if !name.is_empty() {
                    warn!(sheet = %sheet.title, name = %name, "Row has no allocation result");
                }
                String::new()
            }
        };
        column.push(value);
    }
    column
}
