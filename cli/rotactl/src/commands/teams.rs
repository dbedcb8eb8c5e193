//! Team allocation.

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use rota_allocation::assign_team_reviewers;
use rota_sheet::{read_config, read_teams, roster_names, SheetKind, Workbook};
use tracing::{debug, instrument};

use super::{finish, load_workbook, run_each, run_step, CommandContext, Reviewers};

/// Allocate reviewers to teams.
#[derive(Debug, Args)]
pub struct TeamsCommand {}

impl TeamsCommand {
    pub fn run(self, ctx: &CommandContext) -> Result<i32> {
        run_each(ctx, |path| {
            let mut workbook = load_workbook(path)?;
            let allocate = |wb: &mut Workbook| allocate_teams(ctx, wb);
            let result = run_step(ctx, &mut workbook, path, SheetKind::Teams, allocate);
            finish(&workbook, path, result.map(|r| vec![r]))
        })
    }
}

/// Read the teams sheet and assign reviewers.
///
/// Developers listed on the developers sheet join the experienced pool even
/// when they belong to no team.
#[instrument(skip_all)]
pub(crate) fn allocate_teams(ctx: &CommandContext, workbook: &Workbook) -> Result<Reviewers> {
    let config = read_config(workbook.sheet(SheetKind::Config)?)?;
    let sheet = workbook.sheet(SheetKind::Teams)?;
    let mut teams = read_teams(sheet, config.default_reviewer_number)?;
    let developers = match workbook.sheet(SheetKind::Developers) {
        Ok(sheet) => roster_names(sheet),
        Err(_) => BTreeSet::new(),
    };

    let mut rng = ctx.rng();
    let counts = assign_team_reviewers(&mut teams, &config.experience, &developers, &mut rng)?;
    debug!(?counts, "Team assignment counts");
    Ok(teams.reviewer_map())
}
