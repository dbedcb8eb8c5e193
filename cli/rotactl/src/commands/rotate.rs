//! Deterministic ring rotation.

use anyhow::Result;
use clap::Args;
use rota_allocation::{rotate, RingIndexes, Roster};
use rota_sheet::{
    apply_rotation_order, read_config, read_developers, read_indexes, write_indexes, SheetKind,
    Workbook,
};
use tracing::{debug, instrument};

use super::{finish, load_workbook, run_each, run_step, CommandContext, Reviewers};

/// Walk the fixed-order ring to pick reviewers.
#[derive(Debug, Args)]
pub struct RotateCommand {}

impl RotateCommand {
    pub fn run(self, ctx: &CommandContext) -> Result<i32> {
        run_each(ctx, |path| {
            let mut workbook = load_workbook(path)?;
            let kind = SheetKind::Developers;
            let result = run_step(ctx, &mut workbook, path, kind, rotate_developers);
            finish(&workbook, path, result.map(|r| vec![r]))
        })
    }
}

/// Rotate the developers sheet and store this run's ring positions.
///
/// Positions from the previous run are read from the rotation index sheet,
/// which is created on first use.
#[instrument(skip_all)]
pub(crate) fn rotate_developers(workbook: &mut Workbook) -> Result<Reviewers> {
    let config = read_config(workbook.sheet(SheetKind::Config)?)?;
    let roster = read_developers(
        workbook.sheet(SheetKind::Developers)?,
        config.default_reviewer_number,
    )?;
    let mut developers = roster.into_developers();
    apply_rotation_order(&mut developers, &config.rotation_order);
    let mut roster = Roster::new(developers)?;

    let previous = match workbook.find_by_headers(SheetKind::RotationIndexes) {
        Some(_) => read_indexes(workbook.sheet(SheetKind::RotationIndexes)?)?,
        None => RingIndexes::new(),
    };
    debug!(entries = previous.len(), "Loaded previous ring positions");

    rotate(&mut roster, &config.experience, &previous)?;

    let current: RingIndexes = roster
        .developers()
        .iter()
        .map(|d| (d.name.clone(), d.reviewer_indexes.clone()))
        .collect();
    write_indexes(workbook.index_sheet_mut(), &current);
    Ok(roster.reviewer_map())
}

#[cfg(test)]
mod tests {
    use rota_sheet::{Worksheet, DEVELOPER_COLUMNS, INDEX_SHEET_TITLE};

    use super::*;

    fn workbook() -> Workbook {
        Workbook {
            worksheets: vec![
                Worksheet::from_rows(
                    "Config",
                    [
                        vec![
                            "Unexperienced Developers",
                            "Default Number of Reviewers",
                            "Rotation Order",
                        ],
                        vec!["B", "2", "A"],
                        vec!["", "", "B"],
                        vec!["", "", "C"],
                        vec!["", "", "D"],
                    ],
                ),
                Worksheet::from_rows(
                    "Devs",
                    [
                        DEVELOPER_COLUMNS.to_vec(),
                        vec!["D", "", ""],
                        vec!["C", "", ""],
                        vec!["B", "", ""],
                        vec!["A", "", ""],
                    ],
                ),
            ],
        }
    }

    #[test]
    fn test_first_rotation_creates_index_sheet() {
        let mut workbook = workbook();
        let reviewers = rotate_developers(&mut workbook).unwrap();

        assert_eq!(reviewers.len(), 4);
        for (name, list) in &reviewers {
            assert_eq!(list.len(), 2);
            assert!(!list.contains(name));
        }

        let index_sheet = workbook.sheet(SheetKind::RotationIndexes).unwrap();
        assert_eq!(index_sheet.title, INDEX_SHEET_TITLE);
        assert_eq!(index_sheet.data_rows().len(), 4);
    }

    #[test]
    fn test_rotation_moves_on_between_runs() {
        let mut workbook = workbook();
        let first = rotate_developers(&mut workbook).unwrap();
        let second = rotate_developers(&mut workbook).unwrap();
        assert_ne!(first, second);
        assert_eq!(workbook.worksheets.len(), 3);
    }
}
