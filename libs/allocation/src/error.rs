//! Error types for reviewer allocation.

use thiserror::Error;

/// Errors raised by the allocation engines.
///
/// Constraint shortfalls in the segregated allocator are not errors; they are
/// reported through [`crate::AllocationReport`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// The roster has no entries where at least one is required.
    #[error("roster is empty")]
    EmptyRoster,

    /// Two roster rows share the same name.
    #[error("duplicate roster name: '{0}'")]
    DuplicateName(String),

    /// A roster name is blank after trimming.
    #[error("roster row {row} has an empty name")]
    EmptyName { row: usize },

    /// No ring position satisfies the rotation constraints.
    #[error("infeasible constraints for '{developer}': {reason}")]
    Infeasible { developer: String, reason: String },
}

impl AllocationError {
    /// Create an infeasibility error.
    pub fn infeasible(developer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Infeasible {
            developer: developer.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error reflects an impossible constraint set
    /// rather than malformed input.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, AllocationError::Infeasible { .. })
    }
}
