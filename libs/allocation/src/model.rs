//! Roster data model shared by every allocation engine.
//!
//! A [`Developer`] record serves both individual developers and teams. For
//! teams, `preferable_reviewer_names` holds the team membership.
//!
//! # Invariants
//!
//! - No entry appears in its own `reviewer_names`
//! - `reviewer_names` and `review_for` are mutual inverses across the roster
//!
//! Both are maintained by [`Roster::assign`] and [`Roster::unassign`]; the
//! allocators never touch the edges directly.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;

/// A developer (or team) taking part in a rotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    /// Unique name.
    pub name: String,

    /// Number of reviewers requested this cycle.
    pub reviewer_number: usize,

    /// Preferred reviewers. For teams: the team members.
    #[serde(default)]
    pub preferable_reviewer_names: BTreeSet<String>,

    /// Reviewers assigned to this entry.
    #[serde(default)]
    pub reviewer_names: BTreeSet<String>,

    /// Entries this developer reviews.
    #[serde(default)]
    pub review_for: BTreeSet<String>,

    /// Ring positions chosen by the deterministic rotator.
    #[serde(default)]
    pub reviewer_indexes: BTreeSet<usize>,

    /// Ring rank used by the deterministic rotator.
    #[serde(default)]
    pub order: usize,
}

impl Developer {
    /// Create a developer with no preferences and no assignments.
    pub fn new(name: impl Into<String>, reviewer_number: usize) -> Self {
        Self {
            name: name.into(),
            reviewer_number,
            ..Self::default()
        }
    }

    /// Set the preferred reviewers (or team members).
    pub fn with_preferences<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferable_reviewer_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ring rank.
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Team members, for entries that represent a team.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.preferable_reviewer_names
    }

    /// Current review load.
    pub fn load(&self) -> usize {
        self.review_for.len()
    }

    /// Drop assignment state from a previous run.
    pub fn clear_assignments(&mut self) {
        self.reviewer_names.clear();
        self.review_for.clear();
    }
}

/// Parse a comma separated list of names, trimming whitespace and dropping
/// empty entries.
pub fn parse_names(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// The set of developers taking part in one allocation run.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    developers: Vec<Developer>,
    index: HashMap<String, usize>,
}

impl Roster {
    /// Build a roster, rejecting blank and duplicate names.
    pub fn new(developers: Vec<Developer>) -> Result<Self, AllocationError> {
        let mut index = HashMap::with_capacity(developers.len());
        for (row, developer) in developers.iter().enumerate() {
            if developer.name.trim().is_empty() {
                return Err(AllocationError::EmptyName { row });
            }
            if index.insert(developer.name.clone(), row).is_some() {
                return Err(AllocationError::DuplicateName(developer.name.clone()));
            }
        }
        Ok(Self { developers, index })
    }

    pub fn len(&self) -> usize {
        self.developers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.developers.is_empty()
    }

    /// Developers in roster (row) order.
    pub fn developers(&self) -> &[Developer] {
        &self.developers
    }

    pub(crate) fn developers_mut(&mut self) -> &mut [Developer] {
        &mut self.developers
    }

    /// Consume the roster, returning the developers in roster order.
    pub fn into_developers(self) -> Vec<Developer> {
        self.developers
    }

    /// All roster names.
    pub fn names(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Developer> {
        self.index.get(name).map(|&i| &self.developers[i])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Developer> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.developers[i]),
            None => None,
        }
    }

    /// Review load of `name`. Names outside the roster count as unloaded.
    pub fn load(&self, name: &str) -> usize {
        self.get(name).map_or(0, Developer::load)
    }

    /// Assign `reviewer` to review `developer`, updating both edges.
    ///
    /// Returns false when either name is unknown or the assignment would be a
    /// self-review.
    pub fn assign(&mut self, developer: &str, reviewer: &str) -> bool {
        if developer == reviewer || !self.contains(developer) || !self.contains(reviewer) {
            return false;
        }
        if let Some(dev) = self.get_mut(developer) {
            dev.reviewer_names.insert(reviewer.to_string());
        }
        if let Some(rev) = self.get_mut(reviewer) {
            rev.review_for.insert(developer.to_string());
        }
        true
    }

    /// Remove an assignment, updating both edges. Returns true if it existed.
    pub fn unassign(&mut self, developer: &str, reviewer: &str) -> bool {
        let removed = self
            .get_mut(developer)
            .is_some_and(|dev| dev.reviewer_names.remove(reviewer));
        if let Some(rev) = self.get_mut(reviewer) {
            rev.review_for.remove(developer);
        }
        removed
    }

    /// Clear every assignment edge. Rotation indexes are kept.
    pub fn reset_assignments(&mut self) {
        for developer in &mut self.developers {
            developer.clear_assignments();
        }
    }

    /// Final `name -> sorted reviewers` mapping handed to the roster sink.
    pub fn reviewer_map(&self) -> BTreeMap<String, Vec<String>> {
        self.developers
            .iter()
            .map(|d| (d.name.clone(), d.reviewer_names.iter().cloned().collect()))
            .collect()
    }

    /// Names ordered so developers with longer preference lists come first.
    ///
    /// The sort is stable, so developers without preferences keep roster order.
    pub fn preference_first_order(&self) -> Vec<String> {
        let mut ordered: Vec<&Developer> = self.developers.iter().collect();
        ordered.sort_by(|a, b| {
            b.preferable_reviewer_names
                .len()
                .cmp(&a.preferable_reviewer_names.len())
        });
        ordered.into_iter().map(|d| d.name.clone()).collect()
    }

    /// Copy assignment state for every developer from `other`.
    ///
    /// Used to adopt the winning attempt of the retrying allocator.
    pub(crate) fn adopt_assignments(&mut self, other: &Roster) {
        for developer in &mut self.developers {
            if let Some(source) = other.get(&developer.name) {
                developer.reviewer_names = source.reviewer_names.clone();
                developer.review_for = source.review_for.clone();
            }
        }
    }
}
