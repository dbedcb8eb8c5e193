//! CLI commands.

mod all;
mod check;
mod devs;
mod rotate;
mod teams;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rota_allocation::{AllocationConfig, ExperienceRule};
use rota_sheet::{write_exception, write_manual, write_scheduled, SheetKind, Workbook, WriteMode};
use tracing::{error, info, info_span, warn};

use crate::config::Config;
use crate::error::{print_error, CliError};
use crate::output::{print_result, print_success, OutputFormat, SheetResult};

/// Every workbook succeeded, or a rotation is due.
pub const EXIT_SUCCESS: i32 = 0;

/// Some workbooks failed.
pub const EXIT_PARTIAL_FAILURE: i32 = 1;

/// Every workbook failed, or none were configured.
pub const EXIT_TOTAL_FAILURE: i32 = 2;

/// rota - Allocate code reviewers across rotation workbooks.
#[derive(Debug, Parser)]
#[command(name = "rota")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Workbook file to process. Repeat for several; defaults to
    /// ROTA_WORKBOOKS.
    #[arg(long = "workbook", global = true)]
    workbooks: Vec<PathBuf>,

    /// Amend the current rotation column instead of adding a new one.
    #[arg(long, global = true)]
    manual: bool,

    /// Seed for the random allocators.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Allocate reviewers to individual developers.
    Devs(devs::DevsCommand),

    /// Allocate reviewers to teams.
    Teams(teams::TeamsCommand),

    /// Allocate developers, then teams where a teams sheet exists.
    All(all::AllCommand),

    /// Walk the fixed-order ring to pick reviewers deterministically.
    Rotate(rotate::RotateCommand),

    /// Check whether a scheduled rotation is due.
    Check(check::CheckCommand),
}

impl Cli {
    /// Run the CLI command, returning the process exit code.
    pub fn run(self, config: Config) -> Result<i32> {
        let ctx = CommandContext {
            workbooks: if self.workbooks.is_empty() {
                config.workbooks
            } else {
                self.workbooks
            },
            manual: self.manual || config.manual,
            seed: self.seed.or(config.seed),
            max_attempts: config.max_attempts,
            format: self.format,
            today: chrono::Local::now().date_naive(),
        };

        match self.command {
            Commands::Devs(cmd) => cmd.run(&ctx),
            Commands::Teams(cmd) => cmd.run(&ctx),
            Commands::All(cmd) => cmd.run(&ctx),
            Commands::Rotate(cmd) => cmd.run(&ctx),
            Commands::Check(cmd) => cmd.run(&ctx),
        }
    }
}

/// Shared command context.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub workbooks: Vec<PathBuf>,
    pub manual: bool,
    pub seed: Option<u64>,
    pub max_attempts: usize,
    pub format: OutputFormat,
    pub today: NaiveDate,
}

/// Reviewer map produced by one allocation step.
pub(crate) type Reviewers = BTreeMap<String, Vec<String>>;

impl CommandContext {
    /// Allocation settings for a workbook's experience rule.
    pub fn allocation_config(&self, experience: ExperienceRule) -> AllocationConfig {
        let config = AllocationConfig::new(experience).with_max_attempts(self.max_attempts);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Random source for the single-pass allocators.
    pub fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or_else(|| rand::rng().random());
        info!(seed, "Seeded allocator");
        StdRng::seed_from_u64(seed)
    }

    /// Configured workbooks, or an error when there are none.
    pub fn workbooks(&self) -> Result<&[PathBuf]> {
        if self.workbooks.is_empty() {
            return Err(CliError::NoWorkbooks.into());
        }
        Ok(&self.workbooks)
    }
}

/// Exit code for a multi-workbook run.
pub(crate) fn exit_code(succeeded: usize, failed: usize) -> i32 {
    match (succeeded, failed) {
        (_, 0) => EXIT_SUCCESS,
        (0, _) => EXIT_TOTAL_FAILURE,
        _ => EXIT_PARTIAL_FAILURE,
    }
}

/// Run `job` against every configured workbook.
///
/// A failing workbook does not stop the others; the result is folded into
/// the exit code.
pub(crate) fn run_each<F>(ctx: &CommandContext, mut job: F) -> Result<i32>
where
    F: FnMut(&Path) -> Result<Vec<SheetResult>>,
{
    let workbooks = ctx.workbooks()?;
    let total = workbooks.len();
    let mut failed = 0;

    for path in workbooks {
        let span = info_span!("workbook", path = %path.display());
        let _enter = span.enter();

        match job(path) {
            Ok(results) => {
                for result in &results {
                    print_result(result, ctx.format);
                }
                info!("Workbook processed");
                if ctx.format == OutputFormat::Table {
                    print_success(&format!("Processed {}", path.display()));
                }
            }
            Err(err) => {
                failed += 1;
                error!(error = %format!("{err:#}"), "Workbook failed");
                print_error(&err);
            }
        }
    }

    if failed > 0 {
        let err = CliError::WorkbooksFailed { failed, total };
        print_error(&anyhow::Error::new(err));
    }
    Ok(exit_code(total - failed, failed))
}

/// Load a workbook with path context.
pub(crate) fn load_workbook(path: &Path) -> Result<Workbook> {
    Workbook::load(path).with_context(|| format!("Failed to load workbook {}", path.display()))
}

/// Run one allocation step and persist its outcome into the `kind` sheet.
///
/// On failure an exception column carrying the error is written instead, so
/// the workbook records why the run produced nothing.
pub(crate) fn run_step<F>(
    ctx: &CommandContext,
    workbook: &mut Workbook,
    path: &Path,
    kind: SheetKind,
    step: F,
) -> Result<SheetResult>
where
    F: FnOnce(&mut Workbook) -> Result<Reviewers>,
{
    let outcome = step(workbook).and_then(|reviewers| {
        let sheet = workbook.sheet_mut(kind)?;
        let fixed = kind.fixed_columns();
        let mode = if ctx.manual {
            write_manual(sheet, fixed, &reviewers, ctx.today)
        } else {
            write_scheduled(sheet, fixed, &reviewers, ctx.today);
            WriteMode::Scheduled
        };
        info!(sheet = %kind, ?mode, entries = reviewers.len(), "Stored reviewers");
        Ok(SheetResult {
            workbook: path.display().to_string(),
            sheet: sheet.title.clone(),
            reviewers,
        })
    });

    if let Err(err) = &outcome {
        let message = format!("{err:#}");
        match workbook.sheet_mut(kind) {
            Ok(sheet) => write_exception(sheet, kind.fixed_columns(), &message, ctx.today),
            Err(_) => warn!(sheet = %kind, "No sheet to record the exception in"),
        }
    }
    outcome
}

/// Save `workbook` and hand back the step results.
///
/// The workbook is saved even when a step failed so its exception column
/// persists; the step error wins over a save error.
pub(crate) fn finish(
    workbook: &Workbook,
    path: &Path,
    results: Result<Vec<SheetResult>>,
) -> Result<Vec<SheetResult>> {
    let saved = workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()));
    match (results, saved) {
        (Ok(results), Ok(())) => Ok(results),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(save_err)) => {
            warn!(error = %format!("{save_err:#}"), "Could not save exception column");
            Err(err)
        }
    }
}
