//! # rota-sheet
//!
//! The workbook side of a review rotation: a JSON-persisted grid of
//! worksheets standing in for the shared spreadsheet, plus the readers and
//! writers the allocation engines are fed from and report into.
//!
//! - [`read_config`]: experience rule, default reviewer number and ring order
//! - [`read_developers`], [`read_teams`], [`read_indexes`]: roster source
//! - [`write_scheduled`], [`write_manual`], [`write_exception`],
//!   [`write_indexes`]: roster sink
//! - [`last_rotation_date`], [`rotation_due`]: schedule check

mod config_sheet;
mod error;
mod roster;
mod schedule;
mod sink;
mod workbook;

pub use config_sheet::{read_config, SheetConfig, FALLBACK_REVIEWER_NUMBER, ROTATION_ORDER_HEADER};
pub use error::SheetError;
pub use roster::{apply_rotation_order, read_developers, read_indexes, read_teams, roster_names};
pub use schedule::{
    last_rotation_date, parse_sheet_date, rotation_due, MINIMUM_DAYS_BETWEEN_ROTATIONS,
};
pub use sink::{
    format_sheet_date, sprint_date, write_exception, write_indexes, write_manual, write_scheduled,
    WriteMode, DATE_FORMAT, EXCEPTION_PREFIX, MANUAL_RUN_MARKER,
};
pub use workbook::{
    SheetKind, Workbook, Worksheet, DEVELOPER_COLUMNS, EXPERIENCED_HEADER, INDEX_COLUMNS,
    INDEX_SHEET_TITLE, TEAM_COLUMNS, UNEXPERIENCED_HEADER,
};
