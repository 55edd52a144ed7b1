//! Node Data Structures
//!
//! This module defines the `Node` struct shared by the category and location
//! trees, together with the payloads used to create and update nodes.
//!
//! # Architecture
//!
//! - **One shape, two trees**: categories and locations are both `Node`s,
//!   stored in separate tables selected by [`TreeKind`]
//! - **Flat storage**: rows reference their parent through `parent_id`
//! - **Transient children**: `children` is only populated when a tree is
//!   materialized for reading and is never persisted
//!
//! # Examples
//!
//! ```rust
//! use classifieds_core::models::NewNode;
//!
//! let root = NewNode::new("Vehicles", None);
//! let child = NewNode::new("Cars", Some(1));
//! assert!(root.validate().is_ok());
//! assert_eq!(child.parent_id, Some(1));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a node name or field label, in characters
pub const MAX_NAME_LENGTH: usize = 255;

/// Validation errors for node payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("{field} is too long: {length} characters (max {max})")]
    TooLong {
        field: String,
        length: usize,
        max: usize,
    },

    #[error("Invalid parent reference: {0}")]
    InvalidParent(i64),

    #[error("Invalid field definition: {0}")]
    InvalidField(String),

    #[error("Tree would exceed the maximum depth of {max} levels")]
    TooDeep { max: usize },
}

/// Which hierarchy a node belongs to
///
/// Both hierarchies share every algorithm; the kind only selects the
/// backing table and labels log lines and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TreeKind {
    Category,
    Location,
}

impl TreeKind {
    /// Name of the table holding this tree's rows
    pub fn table_name(&self) -> &'static str {
        match self {
            TreeKind::Category => "categories",
            TreeKind::Location => "locations",
        }
    }

    /// Singular label used in user-facing messages
    pub fn label(&self) -> &'static str {
        match self {
            TreeKind::Category => "category",
            TreeKind::Location => "location",
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single category or location in a hierarchy.
///
/// # Fields
///
/// - `id`: Storage-assigned identifier, immutable
/// - `name`: Display name
/// - `parent_id`: Parent node, `None` for roots
/// - `sort_order`: Position among siblings (gaps allowed)
/// - `is_active`: Visibility flag
/// - `children`: Direct children, only populated on materialized reads,
///   always sorted ascending by `sort_order`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Returns true if this node sits at the top of its tree
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Copy of this node without its materialized children
    pub fn detached(&self) -> Node {
        Node {
            id: self.id,
            name: self.name.clone(),
            parent_id: self.parent_id,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            children: Vec::new(),
        }
    }
}

/// Payload for creating a node
///
/// The storage layer assigns `id`, timestamps and `sort_order`
/// (appended after the current last sibling).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNode {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewNode {
    /// Create an active node payload
    pub fn new(name: impl Into<String>, parent_id: Option<i64>) -> Self {
        Self {
            name: name.into(),
            parent_id,
            is_active: true,
        }
    }

    /// Validate and normalize the payload (trims the name)
    pub fn validate(&self) -> Result<NewNode, ValidationError> {
        Ok(NewNode {
            name: validate_name(&self.name)?,
            ..self.clone()
        })
    }
}

/// Partial update for a node
///
/// Only provided fields change. Reparenting is not an update: it goes
/// through the move operation so the cycle guard always runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_active.is_none()
    }

    /// Validate and normalize the update (trims the name if present)
    pub fn validate(&self) -> Result<NodeUpdate, ValidationError> {
        let name = match &self.name {
            Some(name) => Some(validate_name(name)?),
            None => None,
        };
        Ok(NodeUpdate {
            name,
            is_active: self.is_active,
        })
    }
}

/// How a delete treats the subtree under the target node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletePolicy {
    /// Remove the node and every descendant
    #[default]
    Cascade,
    /// Refuse to delete a node that still has children
    RequireEmpty,
}

/// Result of a delete operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Number of rows removed, including the target node
    pub deleted_count: usize,
}

fn validate_name(name: &str) -> Result<String, ValidationError> {
    validate_text("name", name)
}

/// Trim `value` and check it is non-empty and at most [`MAX_NAME_LENGTH`] characters
pub(crate) fn validate_text(field: &str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            length,
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}
