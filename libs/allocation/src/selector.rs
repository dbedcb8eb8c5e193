//! Load-balanced random selection of reviewers.
//!
//! Candidates are shuffled before a stable sort by load, so equally loaded
//! candidates are picked uniformly at random instead of in name order.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::Roster;

/// Pick up to `count` names from `candidates`, least loaded first, where load
/// is the candidate's current `review_for` size in `roster`.
pub fn pick_least_loaded<R>(
    candidates: &BTreeSet<String>,
    count: usize,
    roster: &Roster,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
{
    pick_by(candidates, count, |name| roster.load(name), rng)
}

/// Pick up to `count` names from `candidates` using an arbitrary load metric.
pub fn pick_by<R, F>(
    candidates: &BTreeSet<String>,
    count: usize,
    load: F,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
    F: Fn(&str) -> usize,
{
    if count == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let mut names: Vec<String> = candidates.iter().cloned().collect();
    names.shuffle(rng);
    names.sort_by_key(|name| load(name));
    names.truncate(count);
    names
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    use super::*;
    use crate::model::Developer;

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Loads: A:0, B:2, C:2, D:1, E:0.
    fn loaded_roster() -> Roster {
        let mut roster = Roster::new(
            ["A", "B", "C", "D", "E"]
                .iter()
                .map(|n| Developer::new(*n, 1))
                .collect(),
        )
        .unwrap();
        roster.assign("C", "B");
        roster.assign("D", "B");
        roster.assign("A", "C");
        roster.assign("B", "C");
        roster.assign("E", "D");
        roster
    }

    #[rstest]
    #[case(&["A", "B"], 0, &[])]
    #[case(&["A", "B", "C", "D", "E"], 2, &["A", "E"])]
    #[case(&["B", "C", "D"], 1, &["D"])]
    #[case(&[], 3, &[])]
    fn test_pick_least_loaded(
        #[case] candidates: &[&str],
        #[case] count: usize,
        #[case] expected: &[&str],
    ) {
        let roster = loaded_roster();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_least_loaded(&set(candidates), count, &roster, &mut rng);
            let picked: BTreeSet<String> = picked.into_iter().collect();
            assert_eq!(picked, set(expected), "seed {seed}");
        }
    }

    #[test]
    fn test_distinct_loads_are_deterministic() {
        let loads: BTreeMap<&str, usize> = [("A", 0), ("B", 1), ("C", 2)].into_iter().collect();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_by(&set(&["A", "B", "C"]), 2, |n| loads[n], &mut rng);
            assert_eq!(picked, vec!["A".to_string(), "B".to_string()]);
        }
    }

    #[test]
    fn test_saturated_pool_returns_everyone() {
        let roster = loaded_roster();
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = set(&["B", "C", "D"]);
        let picked = pick_least_loaded(&candidates, 5, &roster, &mut rng);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.into_iter().collect::<BTreeSet<_>>(), candidates);
    }

    #[test]
    fn test_ties_are_randomized() {
        let candidates = set(&["A", "B", "C", "D"]);
        let mut seen = BTreeSet::new();
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            seen.extend(pick_by(&candidates, 1, |_| 0, &mut rng));
        }
        // Every equally loaded candidate wins at least once.
        assert_eq!(seen, candidates);
    }
}
