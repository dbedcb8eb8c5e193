//! Roster source: developer, team and rotation index rows.

use std::collections::{BTreeMap, BTreeSet};

use rota_allocation::{parse_names, Developer, RingIndexes, Roster};
use tracing::{debug, warn};

use crate::error::SheetError;
use crate::workbook::{Worksheet, DEVELOPER_COLUMNS, INDEX_COLUMNS, TEAM_COLUMNS};

/// Read the developers sheet into a roster.
///
/// Rows with a blank name are skipped. A blank reviewer number falls back to
/// `default_reviewer_number`.
pub fn read_developers(
    sheet: &Worksheet,
    default_reviewer_number: usize,
) -> Result<Roster, SheetError> {
    sheet.expect_headers(&DEVELOPER_COLUMNS)?;
    let developers = read_rows(sheet, |row, cells| {
        let reviewer_number = parse_reviewer_number(row, cell(cells, 1), default_reviewer_number)?;
        let preferences = parse_names(cell(cells, 2));
        Ok(Developer::new(cell(cells, 0), reviewer_number).with_preferences(preferences))
    })?;
    debug!(developers = developers.len(), "Read developers sheet");
    Ok(Roster::new(developers)?)
}

/// Read the teams sheet into a roster of teams.
///
/// Team members land in `preferable_reviewer_names`.
pub fn read_teams(sheet: &Worksheet, default_reviewer_number: usize) -> Result<Roster, SheetError> {
    sheet.expect_headers(&TEAM_COLUMNS)?;
    let teams = read_rows(sheet, |row, cells| {
        let reviewer_number = parse_reviewer_number(row, cell(cells, 2), default_reviewer_number)?;
        let members = parse_names(cell(cells, 1));
        Ok(Developer::new(cell(cells, 0), reviewer_number).with_preferences(members))
    })?;
    debug!(teams = teams.len(), "Read teams sheet");
    Ok(Roster::new(teams)?)
}

/// Names in the first column of a roster sheet, skipping blanks.
pub fn roster_names(sheet: &Worksheet) -> BTreeSet<String> {
    sheet
        .data_rows()
        .iter()
        .map(|cells| cell(cells, 0))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Set each developer's ring rank from `order`.
///
/// Listed names take their list position; unlisted developers follow in
/// roster order.
pub fn apply_rotation_order(developers: &mut [Developer], order: &[String]) {
    let ranks: BTreeMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(rank, name)| (name.as_str(), rank))
        .collect();
    let known: BTreeSet<&str> = developers.iter().map(|d| d.name.as_str()).collect();
    for name in ranks.keys().filter(|name| !known.contains(*name)) {
        warn!(name = %name, "Rotation order lists a developer that is not on the roster");
    }

    let mut next = order.len();
    for developer in developers.iter_mut() {
        developer.order = match ranks.get(developer.name.as_str()) {
            Some(&rank) => rank,
            None => {
                next += 1;
                next - 1
            }
        };
    }
}

/// Read ring positions from the rotation index sheet.
///
/// Unparsable positions are dropped with a warning.
pub fn read_indexes(sheet: &Worksheet) -> Result<RingIndexes, SheetError> {
    sheet.expect_headers(&INDEX_COLUMNS)?;
    let mut indexes = RingIndexes::new();
    for cells in sheet.data_rows() {
        let name = cell(cells, 0);
        if name.is_empty() {
            continue;
        }
        let positions = indexes.entry(name.to_string()).or_default();
        for value in parse_names(cell(cells, 1)) {
            match value.parse::<usize>() {
                Ok(index) => {
                    positions.insert(index);
                }
                Err(_) => warn!(developer = %name, value = %value, "Ignoring invalid ring index"),
            }
        }
    }
    Ok(indexes)
}

fn cell(cells: &[String], column: usize) -> &str {
    cells.get(column).map_or("", |c| c.trim())
}

fn parse_reviewer_number(row: usize, value: &str, default: usize) -> Result<usize, SheetError> {
    if value.is_empty() {
        return Ok(default);
    }
    value.parse().map_err(|_| SheetError::InvalidNumber {
        row,
        value: value.to_string(),
    })
}

/// Map every non-blank data row. `row` is the 1-based sheet row number.
fn read_rows<F>(sheet: &Worksheet, mut map: F) -> Result<Vec<Developer>, SheetError>
where
    F: FnMut(usize, &[String]) -> Result<Developer, SheetError>,
{
    let mut out = Vec::new();
    for (i, cells) in sheet.data_rows().iter().enumerate() {
        if cell(cells, 0).is_empty() {
            continue;
        }
        out.push(map(i + 2, cells)?);
    }
    Ok(out)
}
