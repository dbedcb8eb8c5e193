//! Experience classification and allocation configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Default number of independent attempts made by the segregated allocator.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// How experienced developers are identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum ExperienceRule {
    /// Allow-list: only the listed names are experienced.
    Experienced(BTreeSet<String>),

    /// Deny-list: everyone except the listed names is experienced.
    Unexperienced(BTreeSet<String>),
}

impl Default for ExperienceRule {
    fn default() -> Self {
        Self::Experienced(BTreeSet::new())
    }
}

impl ExperienceRule {
    /// Allow-list rule from any iterator of names.
    pub fn experienced<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Experienced(names.into_iter().map(Into::into).collect())
    }

    /// Deny-list rule from any iterator of names.
    pub fn unexperienced<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Unexperienced(names.into_iter().map(Into::into).collect())
    }

    /// Experienced names among `names`.
    pub fn experienced_within(&self, names: &BTreeSet<String>) -> BTreeSet<String> {
        match self {
            Self::Experienced(allow) => names.intersection(allow).cloned().collect(),
            Self::Unexperienced(deny) => names.difference(deny).cloned().collect(),
        }
    }

    /// Returns true if `name` is classified as experienced.
    pub fn is_experienced(&self, name: &str) -> bool {
        match self {
            Self::Experienced(allow) => allow.contains(name),
            Self::Unexperienced(deny) => !deny.contains(name),
        }
    }

    /// Configured names that match nobody in `names`.
    pub fn unmatched(&self, names: &BTreeSet<String>) -> BTreeSet<String> {
        let configured = match self {
            Self::Experienced(set) | Self::Unexperienced(set) => set,
        };
        configured.difference(names).cloned().collect()
    }
}

/// Configuration passed into every allocator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationConfig {
    /// Experience classification.
    pub experience: ExperienceRule,

    /// Attempts made by the segregated allocator before settling for the best.
    pub max_attempts: usize,

    /// Base seed for attempt RNGs. `None` draws a seed from the OS.
    pub seed: Option<u64>,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            experience: ExperienceRule::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }
}

impl AllocationConfig {
    /// Create a configuration with default attempt budget.
    pub fn new(experience: ExperienceRule) -> Self {
        Self {
            experience,
            ..Self::default()
        }
    }

    /// Fix the base seed, making the segregated allocator reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}
