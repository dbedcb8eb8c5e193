//! Deterministic ring rotation.
//!
//! Developers form a ring ordered by `order`. Each developer walks forward
//! from the furthest ring position used in the previous run and takes the
//! first acceptable candidate, so consecutive runs hand out different
//! reviewers without any randomness.
//!
//! # Invariants
//!
//! - A walk inspects at most `N` positions; exhausting them is
//!   [`AllocationError::Infeasible`]
//! - No reviewer exceeds `max(1, ceil(sum(reviewer_number) / N))` reviews
//! - Output `reviewer_indexes` hold only this run's positions

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, instrument};

use crate::error::AllocationError;
use crate::experience::ExperienceRule;
use crate::model::Roster;

/// Ring positions per developer, as persisted between runs.
pub type RingIndexes = BTreeMap<String, BTreeSet<usize>>;

/// An accepted ring position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingSlot {
    /// Position within `0..N`.
    pub safe_index: usize,
    /// Unwrapped position, `start % N + skip`.
    pub raw_index: usize,
    /// Steps taken from the start position.
    pub skip: usize,
}

/// The fixed-order ring walked by the rotator.
#[derive(Debug, Clone)]
pub struct Ring {
    names: Vec<String>,
    experienced: BTreeSet<String>,
    max_assignment: usize,
}

impl Ring {
    /// Build the ring for `roster`. Ties in `order` keep roster order.
    pub fn new(roster: &Roster, experience: &ExperienceRule) -> Result<Self, AllocationError> {
        if roster.is_empty() {
            return Err(AllocationError::EmptyRoster);
        }

        let mut ordered: Vec<_> = roster.developers().iter().collect();
        ordered.sort_by_key(|d| d.order);
        let names: Vec<String> = ordered.into_iter().map(|d| d.name.clone()).collect();

        let requested: usize = roster.developers().iter().map(|d| d.reviewer_number).sum();
        let max_assignment = requested.div_ceil(names.len()).max(1);

        Ok(Self {
            experienced: experience.experienced_within(&roster.names()),
            names,
            max_assignment,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in ring order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Most reviews any developer may take in one run.
    pub fn max_assignment(&self) -> usize {
        self.max_assignment
    }

    /// Walk forward from `start` and return the first position whose
    /// developer can review `developer`.
    ///
    /// Rejects the developer itself, reviewers already assigned to it,
    /// reviewers at `max_assignment`, and non-experienced reviewers when
    /// `must_be_senior` is set. `start` may lie outside the ring (stale
    /// positions from a larger roster) and is reduced modulo `N` first.
    pub fn find_reviewer(
        &self,
        roster: &Roster,
        developer: &str,
        start: usize,
        must_be_senior: bool,
    ) -> Result<RingSlot, AllocationError> {
        let chosen = roster.get(developer).map(|d| &d.reviewer_names);
        let n = self.names.len();
        let start = start % n;

        for skip in 1..=n {
            let raw_index = start + skip;
            let safe_index = raw_index % n;
            let candidate = &self.names[safe_index];

            let rejected = candidate == developer
                || chosen.is_some_and(|c| c.contains(candidate))
                || roster.load(candidate) >= self.max_assignment
                || (must_be_senior && !self.experienced.contains(candidate));
            if !rejected {
                return Ok(RingSlot {
                    safe_index,
                    raw_index,
                    skip,
                });
            }
        }

        let kind = if must_be_senior {
            "experienced reviewer"
        } else {
            "reviewer"
        };
        let max = self.max_assignment;
        Err(AllocationError::infeasible(
            developer,
            format!("no {kind} within {n} positions from index {start} (max {max} reviews each)"),
        ))
    }

    fn senior_available(&self, developer: &str) -> bool {
        self.experienced.iter().any(|name| name != developer)
    }
}

/// Rotate reviewers along the ring, continuing from `previous` positions.
///
/// Every developer first takes one experienced reviewer (when one other than
/// itself exists), then fills up to `min(reviewer_number, N-1)` from the
/// furthest position reached so far this run.
#[instrument(skip_all, fields(developers = roster.len()))]
pub fn rotate(
    roster: &mut Roster,
    experience: &ExperienceRule,
    previous: &RingIndexes,
) -> Result<(), AllocationError> {
    let ring = Ring::new(roster, experience)?;
    let ceiling = ring.len() - 1;
    roster.reset_assignments();

    let mut current = RingIndexes::new();
    let mut furthest: BTreeMap<String, usize> = BTreeMap::new();
    for name in ring.names() {
        let start = previous
            .get(name)
            .and_then(|indexes| indexes.iter().max())
            .copied()
            .unwrap_or(0);
        furthest.insert(name.clone(), start);
    }

    let mut take = |roster: &mut Roster, name: &str, must_be_senior: bool| {
        let start = furthest.get(name).copied().unwrap_or(0);
        let slot = ring.find_reviewer(roster, name, start, must_be_senior)?;
        let reviewer = ring.names()[slot.safe_index].clone();
        debug!(
            developer = %name,
            reviewer = %reviewer,
            index = slot.safe_index,
            skip = slot.skip,
            must_be_senior,
            "Ring position taken"
        );
        roster.assign(name, &reviewer);
        current
            .entry(name.to_string())
            .or_default()
            .insert(slot.safe_index);
        furthest.insert(name.to_string(), slot.raw_index);
        Ok::<(), AllocationError>(())
    };

    for name in ring.names() {
        if ring.senior_available(name) {
            take(roster, name, true)?;
        }
    }

    for name in ring.names() {
        let target = roster
            .get(name)
            .map_or(0, |d| d.reviewer_number.min(ceiling));
        while roster.get(name).map_or(0, |d| d.reviewer_names.len()) < target {
            take(roster, name, false)?;
        }
    }

    for developer in roster.developers_mut() {
        developer.reviewer_indexes = current.remove(&developer.name).unwrap_or_default();
    }

    info!(
        max_assignment = ring.max_assignment(),
        "Ring rotation complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Developer;

    fn ring_roster(list: &[(&str, usize)]) -> Roster {
        Roster::new(
            list.iter()
                .enumerate()
                .map(|(i, (name, rn))| Developer::new(*name, *rn).with_order(i))
                .collect(),
        )
        .unwrap()
    }

    fn everyone_experienced() -> ExperienceRule {
        ExperienceRule::unexperienced(Vec::<String>::new())
    }

    fn reviewers(roster: &Roster) -> BTreeMap<String, Vec<String>> {
        roster.reviewer_map()
    }

    #[test]
    fn test_first_rotation_walks_forward() {
        let mut roster = ring_roster(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)]);
        rotate(&mut roster, &everyone_experienced(), &RingIndexes::new()).unwrap();

        let map = reviewers(&roster);
        assert_eq!(map["A"], vec!["B"]);
        assert_eq!(map["B"], vec!["C"]);
        assert_eq!(map["C"], vec!["D"]);
        assert_eq!(map["D"], vec!["A"]);
        assert_eq!(
            roster.get("A").unwrap().reviewer_indexes,
            BTreeSet::from([1])
        );
        assert_eq!(
            roster.get("D").unwrap().reviewer_indexes,
            BTreeSet::from([0])
        );
    }

    #[test]
    fn test_next_rotation_differs() {
        let mut roster = ring_roster(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)]);
        rotate(&mut roster, &everyone_experienced(), &RingIndexes::new()).unwrap();
        let first = reviewers(&roster);

        let previous: RingIndexes = roster
            .developers()
            .iter()
            .map(|d| (d.name.clone(), d.reviewer_indexes.clone()))
            .collect();
        rotate(&mut roster, &everyone_experienced(), &previous).unwrap();
        let second = reviewers(&roster);

        for name in ["A", "B", "C", "D"] {
            assert_ne!(first[name], second[name], "{name} kept its reviewer");
        }
        assert_eq!(second["A"], vec!["C"]);
    }

    #[test]
    fn test_stale_indexes_wrap_into_ring() {
        // Positions saved when the roster was larger, or edited by hand.
        let mut roster = ring_roster(&[("A", 1), ("B", 1), ("C", 1)]);
        let previous = RingIndexes::from([
            ("A".to_string(), BTreeSet::from([usize::MAX])),
            ("B".to_string(), BTreeSet::from([7])),
        ]);
        rotate(&mut roster, &everyone_experienced(), &previous).unwrap();

        let map = reviewers(&roster);
        assert_eq!(map["A"], vec!["B"]);
        assert_eq!(map["B"], vec!["C"]);
        assert_eq!(map["C"], vec!["A"]);
        for developer in roster.developers() {
            assert!(developer.reviewer_indexes.iter().all(|&i| i < 3));
        }
    }

    #[test]
    fn test_rotation_is_deterministic() {
        let rule = ExperienceRule::unexperienced(["B"]);
        let mut first = ring_roster(&[("A", 2), ("B", 2), ("C", 1), ("D", 1), ("E", 2)]);
        let mut second = first.clone();
        rotate(&mut first, &rule, &RingIndexes::new()).unwrap();
        rotate(&mut second, &rule, &RingIndexes::new()).unwrap();
        assert_eq!(reviewers(&first), reviewers(&second));
    }

    #[test]
    fn test_senior_taken_first() {
        let rule = ExperienceRule::experienced(["B", "C", "D"]);
        let mut roster = ring_roster(&[("A", 2), ("B", 2), ("C", 2), ("D", 2)]);
        rotate(&mut roster, &rule, &RingIndexes::new()).unwrap();

        for developer in roster.developers() {
            assert_eq!(developer.reviewer_names.len(), 2);
            assert!(
                developer.reviewer_names.iter().any(|r| r != "A"),
                "{} has no experienced reviewer",
                developer.name
            );
        }
    }

    #[test]
    fn test_exhausted_ring_is_infeasible() {
        let rule = ExperienceRule::experienced(["E"]);
        let mut roster = ring_roster(&[("A", 1), ("B", 1), ("C", 1), ("E", 1)]);
        let err = rotate(&mut roster, &rule, &RingIndexes::new()).unwrap_err();
        assert!(err.is_infeasible(), "{err}");
    }

    #[test]
    fn test_empty_roster() {
        let mut roster = Roster::default();
        let err = rotate(&mut roster, &everyone_experienced(), &RingIndexes::new()).unwrap_err();
        assert_eq!(err, AllocationError::EmptyRoster);
    }

    #[test]
    fn test_order_defines_the_ring() {
        let roster = Roster::new(vec![
            Developer::new("A", 1).with_order(2),
            Developer::new("B", 1).with_order(0),
            Developer::new("C", 1).with_order(1),
        ])
        .unwrap();
        let ring = Ring::new(&roster, &everyone_experienced()).unwrap();
        assert_eq!(ring.names(), ["B", "C", "A"]);
        assert_eq!(ring.max_assignment(), 1);
    }
}
