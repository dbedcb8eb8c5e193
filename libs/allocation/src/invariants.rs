//! Roster-wide invariant checks.
//!
//! Used to score allocation attempts, to report unmet constraints, and by
//! tests.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::model::Roster;

/// A single broken constraint.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// A developer reviews themselves.
    SelfReview { developer: String },

    /// `reviewer_names` and `review_for` disagree.
    BrokenInverse { developer: String, reviewer: String },

    /// More reviewers than `min(reviewer_number, N-1)`.
    OverQuota {
        developer: String,
        assigned: usize,
        target: usize,
    },

    /// No experienced reviewer although one was available.
    MissingSenior { developer: String },

    /// A non-experienced developer has a non-experienced reviewer.
    UnexperiencedReviewer { developer: String, reviewer: String },

    /// An experienced developer has more than one non-experienced reviewer.
    TooManyUnexperienced { developer: String, count: usize },
}

impl Violation {
    /// Developer the violation is attached to.
    pub fn developer(&self) -> &str {
        match self {
            Self::SelfReview { developer }
            | Self::BrokenInverse { developer, .. }
            | Self::OverQuota { developer, .. }
            | Self::MissingSenior { developer }
            | Self::UnexperiencedReviewer { developer, .. }
            | Self::TooManyUnexperienced { developer, .. } => developer,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfReview { developer } => write!(f, "{developer} reviews themselves"),
            Self::BrokenInverse { developer, reviewer } => {
                write!(f, "{reviewer} -> {developer} edge is one-sided")
            }
            Self::OverQuota {
                developer,
                assigned,
                target,
            } => write!(f, "{developer} has {assigned} reviewers, target {target}"),
            Self::MissingSenior { developer } => {
                write!(f, "{developer} has no experienced reviewer")
            }
            Self::UnexperiencedReviewer {
                developer,
                reviewer,
            } => write!(f, "{developer} is reviewed by non-experienced {reviewer}"),
            Self::TooManyUnexperienced { developer, count } => {
                write!(f, "{developer} has {count} non-experienced reviewers")
            }
        }
    }
}

/// Which rule set to check on top of the structural invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Mandatory senior only.
    Balanced,
    /// Mandatory senior plus experience segregation.
    Segregated,
}

/// Check every invariant and return the violations found.
///
/// `OverQuota` is only reported for [`RuleSet::Balanced`]; the repair passes of
/// the segregated allocator may exceed the quota to seat a senior reviewer.
pub fn check(roster: &Roster, experienced: &BTreeSet<String>, rules: RuleSet) -> Vec<Violation> {
    let mut violations = Vec::new();
    let total = roster.len();

    for developer in roster.developers() {
        let name = &developer.name;

        if developer.reviewer_names.contains(name) {
            violations.push(Violation::SelfReview {
                developer: name.clone(),
            });
        }

        for reviewer in &developer.reviewer_names {
            let mirrored = roster
                .get(reviewer)
                .is_some_and(|r| r.review_for.contains(name));
            if !mirrored {
                violations.push(Violation::BrokenInverse {
                    developer: name.clone(),
                    reviewer: reviewer.clone(),
                });
            }
        }
        for reviewee in &developer.review_for {
            let mirrored = roster
                .get(reviewee)
                .is_some_and(|r| r.reviewer_names.contains(name));
            if !mirrored {
                violations.push(Violation::BrokenInverse {
                    developer: reviewee.clone(),
                    reviewer: name.clone(),
                });
            }
        }

        let target = developer.reviewer_number.min(total.saturating_sub(1));
        if rules == RuleSet::Balanced && developer.reviewer_names.len() > target.max(1) {
            violations.push(Violation::OverQuota {
                developer: name.clone(),
                assigned: developer.reviewer_names.len(),
                target,
            });
        }

        let senior_available = experienced.iter().any(|e| e != name);
        let has_senior = developer
            .reviewer_names
            .iter()
            .any(|r| experienced.contains(r));
        if senior_available && !has_senior {
            violations.push(Violation::MissingSenior {
                developer: name.clone(),
            });
        }

        if rules == RuleSet::Segregated {
            let juniors: Vec<&String> = developer
                .reviewer_names
                .iter()
                .filter(|r| !experienced.contains(*r))
                .collect();
            if experienced.contains(name) {
                if juniors.len() > 1 {
                    violations.push(Violation::TooManyUnexperienced {
                        developer: name.clone(),
                        count: juniors.len(),
                    });
                }
            } else {
                for reviewer in juniors {
                    violations.push(Violation::UnexperiencedReviewer {
                        developer: name.clone(),
                        reviewer: reviewer.clone(),
                    });
                }
            }
        }
    }

    violations.sort();
    violations.dedup();
    violations
}
