//! Scheduled rotation check.

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use clap::{Args, ValueEnum};
use colored::Colorize;
use rota_sheet::{
    format_sheet_date, last_rotation_date, parse_sheet_date, rotation_due, SheetKind,
    MINIMUM_DAYS_BETWEEN_ROTATIONS,
};
use serde::Serialize;
use tracing::warn;

use crate::error::print_error;
use crate::output::{print_info, print_single, OutputFormat};

use super::{load_workbook, CommandContext, EXIT_SUCCESS};

/// A rotation is not due yet.
pub const EXIT_NOT_DUE: i32 = 1;

/// Sheet whose latest column dates the last rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetType {
    Devs,
    Teams,
}

impl SheetType {
    fn kind(self) -> SheetKind {
        match self {
            Self::Devs => SheetKind::Developers,
            Self::Teams => SheetKind::Teams,
        }
    }
}

/// Check whether a scheduled rotation is due.
///
/// Exits 0 when a rotation is due and 1 when it is not or the check failed.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Sheet to read the last rotation date from.
    #[arg(long, value_enum, default_value_t = SheetType::Devs)]
    sheet_type: SheetType,

    /// Date of the last scheduled rotation (dd-mm-yyyy). Skips reading
    /// workbooks; blank means no rotation has run yet.
    #[arg(long, env = "LAST_SCHEDULED_ROTATION_DATE")]
    last_date: Option<String>,

    /// Days that must pass between rotations.
    #[arg(long, default_value_t = MINIMUM_DAYS_BETWEEN_ROTATIONS)]
    min_days: i64,
}

/// Schedule status of one source.
#[derive(Debug, Clone, Serialize)]
struct CheckStatus {
    source: String,
    last_rotation: Option<String>,
    days_since: Option<i64>,
    min_days: i64,
    next_due: Option<String>,
    due: bool,
}

impl CheckStatus {
    fn new(source: String, last: Option<NaiveDate>, today: NaiveDate, min_days: i64) -> Self {
        Self {
            source,
            last_rotation: last.map(format_sheet_date),
            days_since: last.map(|last| (today - last).num_days()),
            min_days,
            next_due: last.map(|last| format_sheet_date(last + Duration::days(min_days))),
            due: rotation_due(last, today, min_days),
        }
    }

    fn print(&self, format: OutputFormat) {
        if format == OutputFormat::Json {
            print_single(self);
            return;
        }

        match (&self.last_rotation, self.days_since) {
            (Some(last), Some(days)) => print_info(&format!(
                "{}: last rotation {last}, {days} days ago (minimum {})",
                self.source, self.min_days
            )),
            _ => print_info(&format!("{}: no previous rotation found", self.source)),
        }
        if self.due {
            println!("{}", "Rotation needed".green().bold());
        } else if let Some(next) = &self.next_due {
            let label = "Rotation not needed yet, next due on".yellow();
            println!("{label} {next}");
        }
    }
}

impl CheckCommand {
    pub fn run(self, ctx: &CommandContext) -> Result<i32> {
        let statuses = match &self.last_date {
            Some(value) => vec![CheckStatus::new(
                "LAST_SCHEDULED_ROTATION_DATE".to_string(),
                parse_last_date(value),
                ctx.today,
                self.min_days,
            )],
            None => match self.read_workbooks(ctx) {
                Ok(statuses) => statuses,
                Err(err) => {
                    print_error(&err);
                    return Ok(EXIT_NOT_DUE);
                }
            },
        };

        for status in &statuses {
            status.print(ctx.format);
        }
        Ok(if statuses.iter().any(|s| s.due) {
            EXIT_SUCCESS
        } else {
            EXIT_NOT_DUE
        })
    }

    fn read_workbooks(&self, ctx: &CommandContext) -> Result<Vec<CheckStatus>> {
        let kind = self.sheet_type.kind();
        ctx.workbooks()?
            .iter()
            .map(|path| {
                let workbook = load_workbook(path)?;
                let last = last_rotation_date(workbook.sheet(kind)?, kind.fixed_columns());
                Ok(CheckStatus::new(
                    path.display().to_string(),
                    last,
                    ctx.today,
                    self.min_days,
                ))
            })
            .collect()
    }
}

/// Blank or unreadable dates count as no previous rotation.
fn parse_last_date(value: &str) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        return None;
    }
    match parse_sheet_date(value) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(%err, "Treating as first run");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rota_sheet::{Workbook, Worksheet, DEVELOPER_COLUMNS};

    use super::super::tests::context;
    use super::*;

    fn command(last_date: Option<&str>) -> CheckCommand {
        CheckCommand {
            sheet_type: SheetType::Devs,
            last_date: last_date.map(str::to_string),
            min_days: MINIMUM_DAYS_BETWEEN_ROTATIONS,
        }
    }

    #[test]
    fn test_last_date_argument() {
        // context() runs on 02-03-2026
        let ctx = context(Vec::new());
        assert_eq!(command(Some("")).run(&ctx).unwrap(), EXIT_SUCCESS);
        assert_eq!(command(Some("not a date")).run(&ctx).unwrap(), EXIT_SUCCESS);
        assert_eq!(command(Some("16-02-2026")).run(&ctx).unwrap(), EXIT_SUCCESS);
        assert_eq!(command(Some("17-02-2026")).run(&ctx).unwrap(), EXIT_NOT_DUE);
    }

    #[test]
    fn test_reads_latest_sheet_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team.json");
        let mut header = DEVELOPER_COLUMNS.to_vec();
        header.push("25-02-2026 / Manual Run on: 01-03-2026");
        Workbook {
            worksheets: vec![
                Worksheet::from_rows("Config", [vec!["Experienced Developers"], vec!["Dev1"]]),
                Worksheet::from_rows("Devs", [header, vec!["Dev1", "1", "", "Dev2"]]),
            ],
        }
        .save(&path)
        .unwrap();

        let ctx = context(vec![PathBuf::from(&path)]);
        assert_eq!(command(None).run(&ctx).unwrap(), EXIT_NOT_DUE);
    }

    #[test]
    fn test_unreadable_workbook_is_not_due() {
        let ctx = context(vec![PathBuf::from("/nonexistent/rota.json")]);
        assert_eq!(command(None).run(&ctx).unwrap(), EXIT_NOT_DUE);

        let ctx = context(Vec::new());
        assert_eq!(command(None).run(&ctx).unwrap(), EXIT_NOT_DUE);
    }
}
