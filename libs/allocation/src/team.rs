//! Team reviewer allocation.
//!
//! Teams are roster entries whose `preferable_reviewer_names` hold the team
//! members. Reviewers are individual developers, so assignments are tracked
//! in one shared [`AssignmentCount`] across every team in the call rather than
//! through `review_for`.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::error::AllocationError;
use crate::experience::ExperienceRule;
use crate::model::Roster;
use crate::selector::pick_by;

/// Reviews handed to each developer during one team run.
pub type AssignmentCount = BTreeMap<String, usize>;

/// Assign reviewers to every team, balancing load across all teams.
///
/// The experienced pool is every team member plus `all_developers`, filtered
/// by `experience`. Per team:
///
/// - no members: `reviewer_number` experienced developers
/// - fewer members than needed: every member, then experienced non-members
/// - otherwise: `reviewer_number` of the members
///
/// Fails with [`AllocationError::Infeasible`] when the experienced pool is
/// empty and a team without members asks for reviewers.
#[instrument(skip_all, fields(teams = teams.len()))]
pub fn assign_team_reviewers<R>(
    teams: &mut Roster,
    experience: &ExperienceRule,
    all_developers: &BTreeSet<String>,
    rng: &mut R,
) -> Result<AssignmentCount, AllocationError>
where
    R: Rng + ?Sized,
{
    let mut everyone: BTreeSet<String> = all_developers.clone();
    for team in teams.developers() {
        everyone.extend(team.members().iter().cloned());
    }
    let experienced = experience.experienced_within(&everyone);
    if experienced.is_empty() {
        let memberless = teams
            .developers()
            .iter()
            .find(|team| team.members().is_empty() && team.reviewer_number > 0);
        if let Some(team) = memberless {
            return Err(AllocationError::infeasible(
                team.name.clone(),
                "no experienced developers configured for a team without members",
            ));
        }
        warn!("Experienced developer pool is empty");
    }
    debug!(pool = ?experienced, "Experienced developer pool");

    let mut assignment_count = AssignmentCount::new();

    for team in teams.developers_mut() {
        team.reviewer_names.clear();
        team.reviewer_indexes.clear();

        let needed = team.reviewer_number;
        let members = team.members().clone();
        let load = |counts: &AssignmentCount, name: &str| counts.get(name).copied().unwrap_or(0);

        let selected: Vec<String> = if members.is_empty() {
            pick_by(&experienced, needed, |n| load(&assignment_count, n), rng)
        } else if members.len() < needed {
            let outsiders: BTreeSet<String> = experienced.difference(&members).cloned().collect();
            let fill = pick_by(
                &outsiders,
                needed - members.len(),
                |n| load(&assignment_count, n),
                rng,
            );
            members.iter().cloned().chain(fill).collect()
        } else {
            pick_by(&members, needed, |n| load(&assignment_count, n), rng)
        };

        if selected.len() < needed {
            warn!(
                team = %team.name,
                needed,
                selected = selected.len(),
                "Not enough candidates to fill team reviewers"
            );
        }
        for name in &selected {
            *assignment_count.entry(name.clone()).or_default() += 1;
        }
        debug!(team = %team.name, reviewers = ?selected, "Team reviewers chosen");
        team.reviewer_names = selected.into_iter().collect();
    }

    info!(
        total = assignment_count.values().sum::<usize>(),
        reviewers = assignment_count.len(),
        "Team allocation complete"
    );
    Ok(assignment_count)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::model::{parse_names, Developer};

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn rule() -> ExperienceRule {
        ExperienceRule::unexperienced(["Dev1", "Dev7", "Dev8", "Dev9"])
    }

    fn all_devs() -> BTreeSet<String> {
        set(&["Dev2", "Dev3", "Dev4", "Dev5", "Dev6", "Dev7"])
    }

    fn seniors() -> BTreeSet<String> {
        set(&["Dev2", "Dev3", "Dev4", "Dev5", "Dev6"])
    }

    fn teams(list: Vec<Developer>) -> Roster {
        Roster::new(list).unwrap()
    }

    fn run(roster: &mut Roster, all_developers: &BTreeSet<String>, seed: u64) -> AssignmentCount {
        let mut rng = StdRng::seed_from_u64(seed);
        let counts = assign_team_reviewers(roster, &rule(), all_developers, &mut rng);
        counts.unwrap()
    }

    #[test]
    fn test_team_with_no_members() {
        let mut roster = teams(vec![Developer::new("Team8", 2)]);
        run(&mut roster, &all_devs(), 1);

        let team = roster.get("Team8").unwrap();
        assert_eq!(team.reviewer_names.len(), 2);
        assert!(team.reviewer_names.is_subset(&seniors()));
    }

    #[test]
    fn test_team_with_fewer_members_than_needed() {
        let team = Developer::new("Team2", 2).with_preferences(["Dev7"]);
        let mut roster = teams(vec![team]);
        run(&mut roster, &all_devs(), 2);

        let team = roster.get("Team2").unwrap();
        assert_eq!(team.reviewer_names.len(), 2);
        assert!(team.reviewer_names.contains("Dev7"));
        let excluded = set(&["Dev7"]);
        let others: Vec<&String> = team.reviewer_names.difference(&excluded).collect();
        assert_eq!(others.len(), 1);
        assert!(seniors().contains(others[0]));
    }

    #[test]
    fn test_team_with_enough_members() {
        let team = Developer::new("Team1", 2).with_preferences(parse_names("Dev2, Dev3, Dev4"));
        let mut roster = teams(vec![team]);
        run(&mut roster, &all_devs(), 3);

        let members = set(&["Dev2", "Dev3", "Dev4"]);
        let team = roster.get("Team1").unwrap();
        assert_eq!(team.reviewer_names.len(), 2);
        assert!(team.reviewer_names.is_subset(&members));
    }

    #[test]
    fn test_load_is_balanced_across_teams() {
        let members = ["Dev2", "Dev3"];
        let mut roster = teams(vec![
            Developer::new("Team1", 1).with_preferences(members),
            Developer::new("Team2", 1).with_preferences(members),
            Developer::new("Team3", 1).with_preferences(members),
            Developer::new("Team4", 1).with_preferences(members),
        ]);
        let counts = run(&mut roster, &BTreeSet::new(), 4);

        assert_eq!(counts.get("Dev2"), Some(&2));
        assert_eq!(counts.get("Dev3"), Some(&2));
    }

    #[test]
    fn test_previous_assignments_are_reset() {
        let mut team = Developer::new("Team5", 1).with_preferences(["Dev2"]);
        team.reviewer_names = set(&["Dev9"]);
        team.reviewer_indexes = [3].into();
        let mut roster = teams(vec![team]);
        run(&mut roster, &all_devs(), 5);

        let team = roster.get("Team5").unwrap();
        assert_eq!(team.reviewer_names, set(&["Dev2"]));
        assert!(team.reviewer_indexes.is_empty());
    }

    #[test]
    fn test_zero_reviewers_requested() {
        let team = Developer::new("Team6", 0).with_preferences(["Dev2"]);
        let mut roster = teams(vec![team]);
        let counts = run(&mut roster, &all_devs(), 6);
        assert!(roster.get("Team6").unwrap().reviewer_names.is_empty());
        assert!(counts.is_empty());
    }

    #[test]
    fn test_empty_pool_fails_team_without_members() {
        let nobody = ExperienceRule::default();
        let mut rng = StdRng::seed_from_u64(7);

        let mut roster = teams(vec![Developer::new("Team8", 1)]);
        let err = assign_team_reviewers(&mut roster, &nobody, &all_devs(), &mut rng);
        assert_eq!(
            err.unwrap_err(),
            AllocationError::infeasible(
                "Team8",
                "no experienced developers configured for a team without members",
            )
        );

        // Teams with members still get them from an empty pool.
        let team = Developer::new("Team2", 1).with_preferences(["Dev7"]);
        let mut roster = teams(vec![team]);
        let counts = assign_team_reviewers(&mut roster, &nobody, &all_devs(), &mut rng);
        assert_eq!(counts.unwrap().get("Dev7"), Some(&1));
    }
}
