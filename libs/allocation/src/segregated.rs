//! Experience-segregated allocator with repair, coverage and retry.
//!
//! Rules on top of the balanced allocator:
//!
//! - Non-experienced developers are reviewed by experienced developers only
//! - Experienced developers accept at most one non-experienced reviewer
//! - Every non-experienced developer should review someone
//!
//! The rules can conflict on small rosters, so each attempt runs a blind
//! phase allocation, a repair pass and a coverage pass on its own copy of the
//! roster. Attempts are scored and the best one is adopted; unmet rules are
//! reported, never raised.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::AllocationError;
use crate::experience::AllocationConfig;
use crate::individual::{resolve_experienced, run_phases};
use crate::invariants::{check, RuleSet, Violation};
use crate::model::Roster;
use crate::phase::PhaseKind;
use crate::selector::{pick_by, pick_least_loaded};

const UNEXPERIENCED_PLAN: &[PhaseKind] = &[
    PhaseKind::PreferredExperienced,
    PhaseKind::MandatorySenior,
    PhaseKind::ExperiencedFill,
];

const EXPERIENCED_PLAN: &[PhaseKind] = &[
    PhaseKind::PreferredSenior,
    PhaseKind::PreferredUnexperienced,
    PhaseKind::PreferredExperienced,
    PhaseKind::MandatorySenior,
    PhaseKind::CappedUnexperienced,
    PhaseKind::ExperiencedFill,
];

/// Quality of one allocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttemptScore {
    /// Number of broken rules.
    pub violations: usize,
    /// Non-experienced developers that review someone.
    pub covered: usize,
    /// Non-experienced developers on the roster.
    pub unexperienced: usize,
}

impl AttemptScore {
    fn of(roster: &Roster, experienced: &BTreeSet<String>) -> Self {
        let juniors = roster
            .developers()
            .iter()
            .filter(|d| !experienced.contains(&d.name));
        let (unexperienced, covered) = juniors.fold((0, 0), |(total, covered), d| {
            (total + 1, covered + usize::from(!d.review_for.is_empty()))
        });
        Self {
            violations: check(roster, experienced, RuleSet::Segregated).len(),
            covered,
            unexperienced,
        }
    }

    /// No broken rule and every non-experienced developer reviews someone.
    pub fn is_perfect(&self) -> bool {
        self.violations == 0 && self.covered == self.unexperienced
    }

    /// Lower is better.
    fn rank(&self) -> (usize, Reverse<usize>) {
        (self.violations, Reverse(self.covered))
    }
}

/// Outcome of [`allocate_segregated`].
#[derive(Debug, Clone, Serialize)]
pub struct AllocationReport {
    /// Attempts actually run.
    pub attempts: usize,
    /// Zero-based index of the adopted attempt.
    pub winning_attempt: usize,
    /// Base seed; attempt `i` used `seed + i`.
    pub seed: u64,
    pub score: AttemptScore,
    /// Rules the adopted attempt could not satisfy.
    pub violations: Vec<Violation>,
    /// Non-experienced developers left without anyone to review.
    pub uncovered: Vec<String>,
}

impl AllocationReport {
    pub fn is_clean(&self) -> bool {
        self.score.is_perfect()
    }
}

struct Attempt {
    index: usize,
    score: AttemptScore,
    roster: Roster,
}

impl Attempt {
    fn run(index: usize, seed: u64, base: &Roster, experienced: &BTreeSet<String>) -> Self {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(index as u64));
        let mut roster = base.clone();
        roster.reset_assignments();

        run_phases(
            &mut roster,
            experienced,
            |is_experienced| {
                if is_experienced {
                    EXPERIENCED_PLAN
                } else {
                    UNEXPERIENCED_PLAN
                }
            },
            &mut rng,
        );
        repair(&mut roster, experienced, &mut rng);
        cover(&mut roster, experienced, &mut rng);

        let score = AttemptScore::of(&roster, experienced);
        debug!(
            attempt = index,
            violations = score.violations,
            covered = score.covered,
            unexperienced = score.unexperienced,
            "Allocation attempt finished"
        );
        Self {
            index,
            score,
            roster,
        }
    }
}

/// Assign reviewers under the segregation rules, retrying up to
/// `config.max_attempts` times and adopting the best attempt.
#[instrument(skip_all, fields(developers = roster.len(), max_attempts = config.max_attempts))]
pub fn allocate_segregated(
    roster: &mut Roster,
    config: &AllocationConfig,
) -> Result<AllocationReport, AllocationError> {
    if roster.is_empty() {
        return Err(AllocationError::EmptyRoster);
    }

    let experienced = resolve_experienced(roster, &config.experience);
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let max_attempts = config.max_attempts.max(1);

    let mut best = Attempt::run(0, seed, roster, &experienced);
    let mut attempts = 1;
    while attempts < max_attempts && !best.score.is_perfect() {
        let candidate = Attempt::run(attempts, seed, roster, &experienced);
        attempts += 1;
        if candidate.score.rank() < best.score.rank() {
            best = candidate;
        }
    }

    roster.adopt_assignments(&best.roster);

    let violations = check(roster, &experienced, RuleSet::Segregated);
    let uncovered: Vec<String> = roster
        .developers()
        .iter()
        .filter(|d| !experienced.contains(&d.name) && d.review_for.is_empty())
        .map(|d| d.name.clone())
        .collect();

    if best.score.is_perfect() {
        info!(
            attempts,
            winning_attempt = best.index,
            "Segregated allocation satisfied every rule"
        );
    } else {
        for violation in &violations {
            warn!(%violation, "Unmet allocation rule");
        }
        if !uncovered.is_empty() {
            warn!(uncovered = ?uncovered, "Non-experienced developers review nobody");
        }
        warn!(
            attempts,
            winning_attempt = best.index,
            violations = best.score.violations,
            "Keeping best allocation attempt"
        );
    }

    Ok(AllocationReport {
        attempts,
        winning_attempt: best.index,
        seed,
        score: best.score,
        violations,
        uncovered,
    })
}

fn quota(reviewer_number: usize, total: usize) -> usize {
    reviewer_number.min(total.saturating_sub(1)).max(1)
}

/// Enforce the segregation and mandatory senior rules on one roster.
fn repair<R>(roster: &mut Roster, experienced: &BTreeSet<String>, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let total = roster.len();

    for name in roster.preference_first_order() {
        let Some(developer) = roster.get(&name) else {
            continue;
        };
        let is_senior = experienced.contains(&name);
        let target = quota(developer.reviewer_number, total);
        let juniors: BTreeSet<String> = developer
            .reviewer_names
            .iter()
            .filter(|r| !experienced.contains(*r))
            .cloned()
            .collect();

        // Disallowed non-experienced reviewers.
        let keep: BTreeSet<String> = if is_senior {
            pick_least_loaded(&juniors, 1, roster, rng)
                .into_iter()
                .collect()
        } else {
            BTreeSet::new()
        };
        let evicted: Vec<String> = juniors.difference(&keep).cloned().collect();
        for junior in &evicted {
            roster.unassign(&name, junior);
        }
        if !evicted.is_empty() {
            debug!(developer = %name, evicted = ?evicted, "Removed disallowed reviewers");
            let pool = senior_pool(roster, &name, experienced);
            for reviewer in pick_least_loaded(&pool, evicted.len(), roster, rng) {
                roster.assign(&name, &reviewer);
            }
        }

        // Missing experienced reviewer.
        let Some(developer) = roster.get(&name) else {
            continue;
        };
        let has_senior = developer
            .reviewer_names
            .iter()
            .any(|r| experienced.contains(r));
        if has_senior {
            continue;
        }
        let pool = senior_pool(roster, &name, experienced);
        let Some(senior) = pick_least_loaded(&pool, 1, roster, rng).pop() else {
            continue;
        };
        if developer.reviewer_names.len() >= target {
            let outgoing = developer
                .reviewer_names
                .iter()
                .find(|r| !experienced.contains(*r))
                .cloned();
            if let Some(outgoing) = outgoing {
                roster.unassign(&name, &outgoing);
            }
        }
        debug!(developer = %name, reviewer = %senior, "Inserted experienced reviewer");
        roster.assign(&name, &senior);
    }
}

/// Experienced developers that could still be added as reviewers of `name`.
fn senior_pool(roster: &Roster, name: &str, experienced: &BTreeSet<String>) -> BTreeSet<String> {
    let current = roster.get(name).map(|d| &d.reviewer_names);
    experienced
        .iter()
        .filter(|e| e.as_str() != name && !current.is_some_and(|c| c.contains(*e)))
        .cloned()
        .collect()
}

/// Give every non-experienced developer someone to review.
fn cover<R>(roster: &mut Roster, experienced: &BTreeSet<String>, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let total = roster.len();
    let stranded: Vec<String> = roster
        .developers()
        .iter()
        .filter(|d| !experienced.contains(&d.name) && d.review_for.is_empty())
        .map(|d| d.name.clone())
        .collect();

    for junior in stranded {
        let hosts = roster
            .developers()
            .iter()
            .filter(|d| experienced.contains(&d.name))
            .filter(|d| d.reviewer_names.iter().all(|r| experienced.contains(r)));

        let open: BTreeSet<String> = hosts
            .clone()
            .filter(|d| d.reviewer_names.len() < quota(d.reviewer_number, total))
            .map(|d| d.name.clone())
            .collect();
        let swappable: BTreeSet<String> = hosts
            .filter(|d| d.reviewer_names.len() >= 2)
            .map(|d| d.name.clone())
            .collect();

        let reviewer_count = |name: &str| roster.get(name).map_or(0, |d| d.reviewer_names.len());
        if let Some(host) = pick_by(&open, 1, reviewer_count, rng).pop() {
            debug!(developer = %host, reviewer = %junior, "Placed stranded reviewer");
            roster.assign(&host, &junior);
            continue;
        }

        let Some(host) = pick_by(&swappable, 1, reviewer_count, rng).pop() else {
            debug!(reviewer = %junior, "No experienced developer can take another reviewer");
            continue;
        };
        let outgoing = roster.get(&host).and_then(|d| {
            d.reviewer_names
                .iter()
                .max_by_key(|r| roster.load(r))
                .cloned()
        });
        if let Some(outgoing) = outgoing {
            debug!(
                developer = %host,
                removed = %outgoing,
                reviewer = %junior,
                "Swapped in stranded reviewer"
            );
            roster.unassign(&host, &outgoing);
            roster.assign(&host, &junior);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::ExperienceRule;
    use crate::model::Developer;

    fn team_roster() -> Roster {
        Roster::new(vec![
            Developer::new("Dev1", 2).with_preferences(["Dev2"]),
            Developer::new("Dev2", 2),
            Developer::new("Dev3", 2).with_preferences(["Dev6"]),
            Developer::new("Dev4", 2),
            Developer::new("Dev5", 1),
            Developer::new("Dev6", 2),
        ])
        .unwrap()
    }

    fn config() -> AllocationConfig {
        AllocationConfig::new(ExperienceRule::unexperienced(["Dev5", "Dev6"])).with_seed(42)
    }

    #[test]
    fn test_segregation_rules_hold() {
        let mut roster = team_roster();
        let report = allocate_segregated(&mut roster, &config()).unwrap();

        assert!(report.is_clean(), "{report:?}");
        assert!(report.violations.is_empty());
        assert!(report.uncovered.is_empty());
        assert!(report.attempts >= 1 && report.attempts <= 10);

        for junior in ["Dev5", "Dev6"] {
            let dev = roster.get(junior).unwrap();
            assert!(!dev.reviewer_names.contains("Dev5"));
            assert!(!dev.reviewer_names.contains("Dev6"));
            assert!(!dev.review_for.is_empty(), "{junior} reviews nobody");
        }
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let mut first = team_roster();
        let mut second = team_roster();
        allocate_segregated(&mut first, &config()).unwrap();
        allocate_segregated(&mut second, &config()).unwrap();
        assert_eq!(first.reviewer_map(), second.reviewer_map());
    }

    #[test]
    fn test_unsatisfiable_rules_are_reported() {
        // Two juniors, one senior with a single slot: one junior stays stranded.
        let mut roster = Roster::new(vec![
            Developer::new("Lead", 1),
            Developer::new("J1", 1),
            Developer::new("J2", 1),
        ])
        .unwrap();
        let config = AllocationConfig::new(ExperienceRule::experienced(["Lead"]))
            .with_seed(1)
            .with_max_attempts(4);
        let report = allocate_segregated(&mut roster, &config).unwrap();

        assert!(!report.is_clean());
        assert_eq!(report.attempts, 4);
        assert_eq!(report.uncovered.len(), 1);
        assert!(report.violations.is_empty(), "{:?}", report.violations);
    }

    #[test]
    fn test_repair_inserts_missing_senior() {
        let mut roster = Roster::new(vec![
            Developer::new("A", 1),
            Developer::new("B", 1),
            Developer::new("E", 1),
        ])
        .unwrap();
        roster.assign("A", "B");
        let experienced: BTreeSet<String> = ["E".to_string()].into();
        let mut rng = StdRng::seed_from_u64(0);
        repair(&mut roster, &experienced, &mut rng);

        let a = roster.get("A").unwrap();
        assert_eq!(a.reviewer_names, BTreeSet::from(["E".to_string()]));
        assert_eq!(roster.load("B"), 0);
    }

    #[test]
    fn test_repair_trims_senior_to_one_junior() {
        let mut roster = Roster::new(vec![
            Developer::new("E", 3),
            Developer::new("F", 1),
            Developer::new("A", 1),
            Developer::new("B", 1),
        ])
        .unwrap();
        roster.assign("E", "A");
        roster.assign("E", "B");
        let experienced: BTreeSet<String> = ["E".to_string(), "F".to_string()].into();
        let mut rng = StdRng::seed_from_u64(9);
        repair(&mut roster, &experienced, &mut rng);

        let e = roster.get("E").unwrap();
        let juniors: Vec<&String> = e.reviewer_names.difference(&experienced).collect();
        assert_eq!(juniors.len(), 1);
        assert!(e.reviewer_names.contains("F"));
    }

    #[test]
    fn test_cover_swaps_junior_into_full_host() {
        // Every senior is at quota with experienced reviewers only.
        let mut roster = Roster::new(vec![
            Developer::new("S1", 2),
            Developer::new("S2", 2),
            Developer::new("S3", 2),
            Developer::new("J", 1),
        ])
        .unwrap();
        let edges = [
            ("S1", "S2"),
            ("S1", "S3"),
            ("S2", "S1"),
            ("S2", "S3"),
            ("S3", "S1"),
            ("S3", "S2"),
            ("J", "S1"),
        ];
        for (developer, reviewer) in edges {
            roster.assign(developer, reviewer);
        }
        let experienced: BTreeSet<String> = ["S1", "S2", "S3"].map(String::from).into();
        let mut rng = StdRng::seed_from_u64(5);
        cover(&mut roster, &experienced, &mut rng);

        let junior = roster.get("J").unwrap();
        assert_eq!(junior.review_for.len(), 1);
        let host = roster.get(junior.review_for.first().unwrap()).unwrap();
        let seniors: Vec<&String> = host.reviewer_names.intersection(&experienced).collect();
        assert_eq!(host.reviewer_names.len(), 2);
        assert!(host.reviewer_names.contains("J"));
        assert_eq!(seniors.len(), 1);

        let violations = check(&roster, &experienced, RuleSet::Segregated);
        assert!(violations.is_empty(), "{violations:?}");
    }
}
