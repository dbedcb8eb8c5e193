//! Developer and team allocation in one pass.

use anyhow::Result;
use clap::Args;
use rota_sheet::{SheetKind, Workbook};
use tracing::info;

use super::devs::allocate_developers;
use super::teams::allocate_teams;
use super::{finish, load_workbook, run_each, run_step, CommandContext};

/// Allocate developers, then teams where a teams sheet exists.
#[derive(Debug, Args)]
pub struct AllCommand {
    /// Use the balanced rule set for developers.
    #[arg(long)]
    balanced: bool,
}

impl AllCommand {
    pub fn run(self, ctx: &CommandContext) -> Result<i32> {
        run_each(ctx, |path| {
            let mut workbook = load_workbook(path)?;
            let mut results = Vec::new();

            let allocate = |wb: &mut Workbook| allocate_developers(ctx, wb, self.balanced);
            let devs = run_step(ctx, &mut workbook, path, SheetKind::Developers, allocate);
            let outcome = devs.and_then(|devs| {
                results.push(devs);
                if workbook.find(SheetKind::Teams).is_none() {
                    info!("No teams sheet, skipping team allocation");
                    return Ok(());
                }
                let allocate = |wb: &mut Workbook| allocate_teams(ctx, wb);
                let teams = run_step(ctx, &mut workbook, path, SheetKind::Teams, allocate)?;
                results.push(teams);
                Ok(())
            });

            finish(&workbook, path, outcome.map(|()| results))
        })
    }
}
