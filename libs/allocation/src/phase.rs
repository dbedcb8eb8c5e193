//! Selection phases used by the individual allocators.
//!
//! A developer's reviewers are drawn through an ordered plan of phases. Each
//! phase supplies a candidate pool and a count; both are computed by pure
//! functions of the running `chosen` set so no phase captures mutable state.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, warn};

use crate::model::{Developer, Roster};
use crate::selector::pick_least_loaded;

/// One step of a selection plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PhaseKind {
    /// One experienced reviewer from the preference list, if still needed.
    PreferredSenior,
    /// Any preferred reviewer, keeping a slot free for a required senior.
    Preferred,
    /// Experienced preferred reviewers, filling remaining slots.
    PreferredExperienced,
    /// Non-experienced preferred reviewers, at most one overall.
    PreferredUnexperienced,
    /// One experienced reviewer if none has been chosen yet.
    MandatorySenior,
    /// At most one non-experienced reviewer overall.
    CappedUnexperienced,
    /// Experienced reviewers filling remaining slots.
    ExperiencedFill,
    /// Anyone, filling remaining slots.
    General,
}

/// Fixed inputs shared by every phase of one developer.
pub(crate) struct PhaseContext<'a> {
    pub names: &'a BTreeSet<String>,
    pub experienced: &'a BTreeSet<String>,
    pub target: usize,
}

impl PhaseContext<'_> {
    fn senior_available(&self, developer: &str) -> bool {
        self.experienced.iter().any(|name| name != developer)
    }
}

/// Number of names the phase should draw given what is already chosen.
pub(crate) fn phase_count(
    kind: PhaseKind,
    developer: &str,
    chosen: &BTreeSet<String>,
    ctx: &PhaseContext<'_>,
) -> usize {
    let remaining = ctx.target.saturating_sub(chosen.len());
    let has_senior = chosen.iter().any(|name| ctx.experienced.contains(name));
    let needs_senior = ctx.senior_available(developer) && !has_senior;
    let reserve = usize::from(needs_senior);
    let juniors = chosen
        .iter()
        .filter(|name| !ctx.experienced.contains(*name))
        .count();
    let junior_allowance = 1usize.saturating_sub(juniors);

    match kind {
        PhaseKind::PreferredSenior | PhaseKind::MandatorySenior => usize::from(needs_senior),
        PhaseKind::Preferred => remaining.saturating_sub(reserve),
        PhaseKind::PreferredExperienced | PhaseKind::ExperiencedFill | PhaseKind::General => {
            remaining
        }
        PhaseKind::PreferredUnexperienced | PhaseKind::CappedUnexperienced => {
            remaining.saturating_sub(reserve).min(junior_allowance)
        }
    }
}

/// Candidate pool of the phase, excluding the developer and names already
/// chosen.
pub(crate) fn phase_pool(
    kind: PhaseKind,
    developer: &Developer,
    chosen: &BTreeSet<String>,
    ctx: &PhaseContext<'_>,
) -> BTreeSet<String> {
    let preferred = move || {
        developer
            .preferable_reviewer_names
            .iter()
            .filter(move |name| ctx.names.contains(*name))
    };

    let pool: BTreeSet<String> = match kind {
        PhaseKind::Preferred => preferred().cloned().collect(),
        PhaseKind::PreferredSenior | PhaseKind::PreferredExperienced => preferred()
            .filter(|name| ctx.experienced.contains(*name))
            .cloned()
            .collect(),
        PhaseKind::PreferredUnexperienced => preferred()
            .filter(|name| !ctx.experienced.contains(*name))
            .cloned()
            .collect(),
        PhaseKind::MandatorySenior | PhaseKind::ExperiencedFill => ctx.experienced.clone(),
        PhaseKind::CappedUnexperienced => ctx.names.difference(ctx.experienced).cloned().collect(),
        PhaseKind::General => ctx.names.clone(),
    };

    pool.into_iter()
        .filter(|name| name != &developer.name && !chosen.contains(name))
        .collect()
}

/// Run `plan` for `developer` and return the chosen reviewers.
///
/// Loads are read from `roster` as it stands; the caller applies the result.
pub(crate) fn run_plan<R>(
    roster: &Roster,
    developer: &Developer,
    plan: &[PhaseKind],
    ctx: &PhaseContext<'_>,
    rng: &mut R,
) -> BTreeSet<String>
where
    R: Rng + ?Sized,
{
    let unknown: Vec<&String> = developer
        .preferable_reviewer_names
        .iter()
        .filter(|name| !ctx.names.contains(*name))
        .collect();
    if !unknown.is_empty() {
        warn!(
            developer = %developer.name,
            unknown = ?unknown,
            "Ignoring preferred reviewers that are not on the roster"
        );
    }

    let mut chosen = BTreeSet::new();
    for &kind in plan {
        let count = phase_count(kind, &developer.name, &chosen, ctx);
        if count == 0 {
            continue;
        }
        let pool = phase_pool(kind, developer, &chosen, ctx);
        let picked = pick_least_loaded(&pool, count, roster, rng);
        if !picked.is_empty() {
            debug!(
                developer = %developer.name,
                phase = ?kind,
                picked = ?picked,
                "Phase selected reviewers"
            );
        }
        chosen.extend(picked);
    }
    chosen
}
