//! Individual developer allocation.

use anyhow::Result;
use clap::Args;
use rota_allocation::{allocate, allocate_segregated};
use rota_sheet::{read_config, read_developers, SheetKind, Workbook};
use tracing::{info, instrument, warn};

use crate::output::print_warning;

use super::{finish, load_workbook, run_each, run_step, CommandContext, Reviewers};

/// Allocate reviewers to individual developers.
#[derive(Debug, Args)]
pub struct DevsCommand {
    /// Use the balanced rule set without experience segregation.
    #[arg(long)]
    balanced: bool,
}

impl DevsCommand {
    pub fn run(self, ctx: &CommandContext) -> Result<i32> {
        run_each(ctx, |path| {
            let mut workbook = load_workbook(path)?;
            let allocate = |wb: &mut Workbook| allocate_developers(ctx, wb, self.balanced);
            let result = run_step(ctx, &mut workbook, path, SheetKind::Developers, allocate);
            finish(&workbook, path, result.map(|r| vec![r]))
        })
    }
}

/// Read the developers sheet and allocate reviewers.
#[instrument(skip_all, fields(balanced = balanced))]
pub(crate) fn allocate_developers(
    ctx: &CommandContext,
    workbook: &Workbook,
    balanced: bool,
) -> Result<Reviewers> {
    let config = read_config(workbook.sheet(SheetKind::Config)?)?;
    let mut roster = read_developers(
        workbook.sheet(SheetKind::Developers)?,
        config.default_reviewer_number,
    )?;
    let allocation = ctx.allocation_config(config.experience);

    if balanced {
        allocate(&mut roster, &allocation, &mut ctx.rng())?;
        return Ok(roster.reviewer_map());
    }

    let report = allocate_segregated(&mut roster, &allocation)?;
    info!(
        attempts = report.attempts,
        winning_attempt = report.winning_attempt,
        seed = report.seed,
        "Segregated allocation finished"
    );
    if !report.is_clean() {
        warn!(
            violations = report.violations.len(),
            uncovered = report.uncovered.len(),
            "Allocation kept with unmet rules"
        );
        for violation in &report.violations {
            print_warning(&violation.to_string());
        }
        if !report.uncovered.is_empty() {
            print_warning(&format!(
                "No review work for: {}",
                report.uncovered.join(", ")
            ));
        }
    }
    Ok(roster.reviewer_map())
}

#[cfg(test)]
mod tests {
    use rota_sheet::{Worksheet, DEVELOPER_COLUMNS};

    use super::super::tests::context;
    use super::*;

    fn workbook() -> Workbook {
        Workbook {
            worksheets: vec![
                Worksheet::from_rows(
                    "Config",
                    [
                        vec!["Experienced Developers", "Default Number of Reviewers"],
                        vec!["Dev1", "2"],
                        vec!["Dev2", ""],
                    ],
                ),
                Worksheet::from_rows(
                    "Devs",
                    [
                        DEVELOPER_COLUMNS.to_vec(),
                        vec!["Dev1", "", ""],
                        vec!["Dev2", "", ""],
                        vec!["Dev3", "", "Dev4"],
                        vec!["Dev4", "1", ""],
                    ],
                ),
            ],
        }
    }

    #[test]
    fn test_segregated_by_default() {
        let reviewers = allocate_developers(&context(Vec::new()), &workbook(), false).unwrap();
        assert_eq!(reviewers.len(), 4);
        for (name, list) in &reviewers {
            assert!(!list.contains(name));
            assert!(
                list.iter().any(|r| r == "Dev1" || r == "Dev2"),
                "{name} has no senior"
            );
        }
        assert!(reviewers["Dev3"].iter().all(|r| r == "Dev1" || r == "Dev2"));
    }

    #[test]
    fn test_balanced_is_reproducible() {
        let ctx = context(Vec::new());
        let first = allocate_developers(&ctx, &workbook(), true).unwrap();
        let second = allocate_developers(&ctx, &workbook(), true).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_config_sheet() {
        let mut workbook = workbook();
        workbook.worksheets.remove(0);
        assert!(allocate_developers(&context(Vec::new()), &workbook, false).is_err());
    }
}
