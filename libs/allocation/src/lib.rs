//! # rota-allocation
//!
//! Reviewer allocation engines for recurring code-review rotations.
//!
//! ## Engines
//!
//! - [`allocate`]: balanced random allocation with preferences and a
//!   mandatory experienced reviewer
//! - [`allocate_segregated`]: the balanced engine plus experience
//!   segregation, repair and best-of-N retry
//! - [`assign_team_reviewers`]: team allocation balanced across all teams
//! - [`rotate`]: deterministic walk over a fixed-order ring
//!
//! ## Design Principles
//!
//! - Engines are pure functions of the roster, an [`AllocationConfig`] or
//!   [`ExperienceRule`], and the supplied random source
//! - Assignment edges are only changed through [`Roster::assign`] and
//!   [`Roster::unassign`], keeping `reviewer_names` and `review_for` mutual
//!   inverses
//! - Nothing here touches the workbook; persistence is the caller's concern

mod error;
mod experience;
mod individual;
mod invariants;
mod model;
mod phase;
mod rotator;
mod segregated;
mod selector;
mod team;

pub use error::AllocationError;
pub use experience::{AllocationConfig, ExperienceRule, DEFAULT_MAX_ATTEMPTS};
pub use individual::allocate;
pub use invariants::{check, RuleSet, Violation};
pub use model::{parse_names, Developer, Roster};
pub use rotator::{rotate, Ring, RingIndexes, RingSlot};
pub use segregated::{allocate_segregated, AllocationReport, AttemptScore};
pub use selector::{pick_by, pick_least_loaded};
pub use team::{assign_team_reviewers, AssignmentCount};
