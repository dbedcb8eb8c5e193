//! Rotation schedule check.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::SheetError;
use crate::sink::{sprint_date, DATE_FORMAT};
use crate::workbook::Worksheet;

/// Days that must pass between two scheduled rotations.
pub const MINIMUM_DAYS_BETWEEN_ROTATIONS: i64 = 14;

/// Parse a `dd-mm-yyyy` sheet date.
pub fn parse_sheet_date(value: &str) -> Result<NaiveDate, SheetError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| SheetError::InvalidDate(value.to_string()))
}

/// Sprint date of the newest snapshot column.
///
/// Manual run headers yield their original sprint date. Returns `None` when
/// there is no snapshot or its header is not a date.
pub fn last_rotation_date(sheet: &Worksheet, fixed_columns: usize) -> Option<NaiveDate> {
    let header = sheet.cell(0, fixed_columns).trim();
    if header.is_empty() {
        debug!(sheet = %sheet.title, "No previous rotations found");
        return None;
    }

    match parse_sheet_date(sprint_date(header)) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(sheet = %sheet.title, %header, %err, "Assuming no valid previous rotation");
            None
        }
    }
}

/// Whether a rotation is due on `today`. No previous rotation means due.
pub fn rotation_due(last: Option<NaiveDate>, today: NaiveDate, min_days: i64) -> bool {
    let Some(last) = last else {
        info!("No previous rotation, rotation is needed");
        return true;
    };

    let days = (today - last).num_days();
    let due = days >= min_days;
    info!(last = %last, days, min_days, due, "Checked rotation schedule");
    due
}
