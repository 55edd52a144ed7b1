//! Service Layer Error Types
//!
//! Every failure a tree or field operation can produce is a distinct
//! variant, so the HTTP layer can map each to its own status code.

use crate::auth::AuthError;
use crate::models::{TreeKind, ValidationError};
use crate::tree::{MoveRejection, SiblingSetMismatch, TreeError};
use thiserror::Error;

/// Service operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Malformed input (empty name, unknown parent, bad field definition)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Submitted reorder ids differ from the current siblings
    #[error("Reorder rejected: {0}")]
    SiblingMismatch(#[from] SiblingSetMismatch),

    /// The move would make a node its own ancestor
    #[error("Move rejected: {0}")]
    CycleRejected(#[from] MoveRejection),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Forbidden: {0}")]
    Forbidden(#[from] AuthError),

    /// The operation conflicts with current state (e.g. deleting a
    /// non-empty node under `DeletePolicy::RequireEmpty`)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored parent references are inconsistent (cycle, runaway depth)
    #[error("Hierarchy is corrupted: {0}")]
    HierarchyCorrupted(#[from] TreeError),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),
}

impl TreeServiceError {
    pub fn not_found(kind: TreeKind, id: i64) -> Self {
        Self::NotFound {
            kind: kind.label(),
            id,
        }
    }

    pub fn field_not_found(id: i64) -> Self {
        Self::NotFound {
            kind: "field",
            id,
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
