//! Configuration source: the config sheet.
//!
//! Layout:
//!
//! - Column A: `Experienced Developers` (allow-list) or
//!   `Unexperienced Developers` (deny-list), names below the header
//! - Cell B2: default reviewer number
//! - Column C (optional): `Rotation Order`, names in ring order

use rota_allocation::ExperienceRule;
use tracing::{info, warn};

use crate::error::SheetError;
use crate::workbook::{Worksheet, UNEXPERIENCED_HEADER};

/// Reviewer number used when B2 is blank or unreadable.
pub const FALLBACK_REVIEWER_NUMBER: usize = 1;

/// Config sheet column C header.
pub const ROTATION_ORDER_HEADER: &str = "Rotation Order";

/// Values read from the config sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub experience: ExperienceRule,
    pub default_reviewer_number: usize,
    /// Names in ring order for the deterministic rotator; empty when the
    /// column is absent.
    pub rotation_order: Vec<String>,
}

/// Read the config sheet.
pub fn read_config(sheet: &Worksheet) -> Result<SheetConfig, SheetError> {
    if sheet.rows.len() < 2 {
        return Err(SheetError::EmptyConfig);
    }

    let default_cell = sheet.cell(1, 1).trim();
    let default_reviewer_number = if default_cell.is_empty() {
        FALLBACK_REVIEWER_NUMBER
    } else {
        default_cell.parse().unwrap_or_else(|_| {
            warn!(
                value = %default_cell,
                fallback = FALLBACK_REVIEWER_NUMBER,
                "Could not read default reviewer number from B2"
            );
            FALLBACK_REVIEWER_NUMBER
        })
    };

    let header = sheet.cell(0, 0).trim();
    let names = column_values(sheet, 0).filter(|name| *name != header);
    let experience = if header == UNEXPERIENCED_HEADER {
        ExperienceRule::unexperienced(names)
    } else {
        ExperienceRule::experienced(names)
    };
    if matches!(&experience, ExperienceRule::Experienced(names) if names.is_empty()) {
        warn!("No experienced developers in config sheet, all treated as non-experienced");
    }

    let rotation_order = if sheet.cell(0, 2).trim() == ROTATION_ORDER_HEADER {
        column_values(sheet, 2).map(str::to_string).collect()
    } else {
        Vec::new()
    };

    info!(
        default_reviewer_number,
        experience = ?experience,
        rotation_order = rotation_order.len(),
        "Config loaded"
    );
    Ok(SheetConfig {
        experience,
        default_reviewer_number,
        rotation_order,
    })
}

/// Trimmed non-empty cells of `column` below the header.
fn column_values(sheet: &Worksheet, column: usize) -> impl Iterator<Item = &str> {
    (1..sheet.rows.len())
        .map(move |row| sheet.cell(row, column).trim())
        .filter(|value| !value.is_empty())
}
