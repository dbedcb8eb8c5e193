//! Balanced individual allocator.
//!
//! Each developer draws up to `min(reviewer_number, N-1)` reviewers through
//! the plan Preferred -> Experienced (mandatory) -> General. Developers with
//! preference lists are processed first so their preferred reviewers are not
//! exhausted by earlier entrants.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::error::AllocationError;
use crate::experience::{AllocationConfig, ExperienceRule};
use crate::model::Roster;
use crate::phase::{run_plan, PhaseContext, PhaseKind};

const BALANCED_PLAN: &[PhaseKind] = &[
    PhaseKind::PreferredSenior,
    PhaseKind::Preferred,
    PhaseKind::MandatorySenior,
    PhaseKind::General,
];

/// Assign reviewers to every developer on `roster`, replacing any previous
/// assignment.
#[instrument(skip_all, fields(developers = roster.len()))]
pub fn allocate<R>(
    roster: &mut Roster,
    config: &AllocationConfig,
    rng: &mut R,
) -> Result<(), AllocationError>
where
    R: Rng + ?Sized,
{
    if roster.is_empty() {
        return Err(AllocationError::EmptyRoster);
    }

    let experienced = resolve_experienced(roster, &config.experience);
    roster.reset_assignments();
    run_phases(roster, &experienced, |_| BALANCED_PLAN, rng);

    let assigned: usize = roster
        .developers()
        .iter()
        .map(|d| d.reviewer_names.len())
        .sum();
    info!(
        assigned,
        experienced = experienced.len(),
        "Balanced allocation complete"
    );
    Ok(())
}

/// Experienced names present on the roster.
///
/// Configured names that match nobody are logged with their length and debug
/// form so stray whitespace in the configuration is easy to spot.
pub(crate) fn resolve_experienced(roster: &Roster, rule: &ExperienceRule) -> BTreeSet<String> {
    let names = roster.names();
    for name in rule.unmatched(&names) {
        warn!(
            name = ?name,
            len = name.len(),
            "Configured experience name matches no roster entry"
        );
    }

    let experienced = rule.experienced_within(&names);
    if experienced.is_empty() {
        warn!("No experienced developers on the roster, mandatory senior rule is inactive");
    }
    experienced
}

/// Run a selection plan for every developer and apply the results.
///
/// `plan_for` receives whether the developer is experienced.
pub(crate) fn run_phases<R, P>(
    roster: &mut Roster,
    experienced: &BTreeSet<String>,
    plan_for: P,
    rng: &mut R,
) where
    R: Rng + ?Sized,
    P: Fn(bool) -> &'static [PhaseKind],
{
    let names = roster.names();
    let ceiling = roster.len().saturating_sub(1);

    for name in roster.preference_first_order() {
        let Some(developer) = roster.get(&name) else {
            continue;
        };
        let ctx = PhaseContext {
            names: &names,
            experienced,
            target: developer.reviewer_number.min(ceiling),
        };
        let plan = plan_for(experienced.contains(&name));
        let chosen = run_plan(roster, developer, plan, &ctx, rng);

        debug!(developer = %name, reviewers = ?chosen, "Reviewers chosen");
        for reviewer in &chosen {
            roster.assign(&name, reviewer);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::invariants::{check, RuleSet};
    use crate::model::Developer;

    fn scenario_roster() -> Roster {
        Roster::new(vec![
            Developer::new("A", 1).with_preferences(["B", "C"]),
            Developer::new("B", 1),
            Developer::new("C", 1),
            Developer::new("D", 1),
            Developer::new("E", 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_mandatory_senior_wins_over_preferences() {
        let config = AllocationConfig::new(ExperienceRule::experienced(["E"]));
        let experienced = BTreeSet::from(["E".to_string()]);
        for seed in 0..25 {
            let mut roster = scenario_roster();
            let mut rng = StdRng::seed_from_u64(seed);
            allocate(&mut roster, &config, &mut rng).unwrap();

            let a = roster.get("A").unwrap();
            assert!(a.reviewer_names.contains("E"), "seed {seed}: {a:?}");
            assert!(!a.reviewer_names.is_empty());
            let violations = check(&roster, &experienced, RuleSet::Balanced);
            assert!(violations.is_empty(), "seed {seed}: {violations:?}");
        }
    }

    #[test]
    fn test_preferences_fill_spare_slots() {
        let mut roster = Roster::new(vec![
            Developer::new("A", 2).with_preferences(["B"]),
            Developer::new("B", 1),
            Developer::new("C", 1),
            Developer::new("E", 1),
        ])
        .unwrap();
        let config = AllocationConfig::new(ExperienceRule::experienced(["E"]));
        let mut rng = StdRng::seed_from_u64(3);
        allocate(&mut roster, &config, &mut rng).unwrap();

        let a = roster.get("A").unwrap();
        let expected: BTreeSet<String> = ["B", "E"].iter().map(|s| s.to_string()).collect();
        assert_eq!(a.reviewer_names, expected);
    }

    #[test]
    fn test_target_clamped_to_roster_size() {
        let developers = vec![Developer::new("A", 10), Developer::new("B", 10)];
        let mut roster = Roster::new(developers).unwrap();
        let config = AllocationConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        allocate(&mut roster, &config, &mut rng).unwrap();

        assert_eq!(roster.get("A").unwrap().reviewer_names.len(), 1);
        assert_eq!(roster.get("B").unwrap().reviewer_names.len(), 1);
    }

    #[test]
    fn test_previous_assignments_are_replaced() {
        let mut roster = scenario_roster();
        roster.assign("B", "C");
        roster.assign("B", "D");
        let config = AllocationConfig::new(ExperienceRule::experienced(["E"]));
        let mut rng = StdRng::seed_from_u64(11);
        allocate(&mut roster, &config, &mut rng).unwrap();

        assert_eq!(
            roster.get("B").unwrap().reviewer_names,
            BTreeSet::from(["E".to_string()])
        );
    }

    #[test]
    fn test_empty_roster_is_an_error() {
        let mut roster = Roster::default();
        let mut rng = StdRng::seed_from_u64(0);
        let config = AllocationConfig::default();
        let err = allocate(&mut roster, &config, &mut rng).unwrap_err();
        assert_eq!(err, AllocationError::EmptyRoster);
    }
}
