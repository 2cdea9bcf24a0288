//! Types for the permission resolver.

use crate::model::ObjectRef;

/// Request for a permission check: can `subject` exercise `relation` on
/// `object`?
#[derive(Debug, Clone)]
pub struct CheckRequest {
    /// The already-authenticated subject (e.g., `user:alice`).
    pub subject: ObjectRef,
    /// The relation to check (e.g., "create_app").
    pub relation: String,
    /// The object the relation is checked on (e.g., `space:eng`).
    pub object: ObjectRef,
}

impl CheckRequest {
    /// Creates a new CheckRequest.
    pub fn new(subject: ObjectRef, relation: impl Into<String>, object: ObjectRef) -> Self {
        Self {
            subject,
            relation: relation.into(),
            object,
        }
    }
}

/// Outcome of a permission check. Absence of a grant is a normal
/// `allowed: false`, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Whether the check is allowed.
    pub allowed: bool,
}

impl CheckOutcome {
    pub(crate) const ALLOWED: CheckOutcome = CheckOutcome { allowed: true };
    pub(crate) const DENIED: CheckOutcome = CheckOutcome { allowed: false };
}
