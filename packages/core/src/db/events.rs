//! Tree Change Events
//!
//! `TreeService` emits a [`TreeEvent`] after every successful mutation so
//! other parts of the system (cache layers, websocket fan-out) can react
//! without coupling to the storage layer.
//!
//! # Architecture
//!
//! Events are sent over a tokio broadcast channel, allowing multiple
//! subscribers to receive notifications asynchronously. Sending with no
//! subscribers is not an error.

use crate::models::{Node, TreeKind};
use serde::{Deserialize, Serialize};

/// A committed change to a category or location tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeEvent {
    #[serde(rename = "nodeCreated")]
    NodeCreated { kind: TreeKind, node: Node },

    #[serde(rename = "nodeUpdated")]
    NodeUpdated { kind: TreeKind, node: Node },

    /// A node changed parent; `node` carries the new parent and sort order
    #[serde(rename = "nodeMoved")]
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        kind: TreeKind,
        node: Node,
        old_parent_id: Option<i64>,
    },

    #[serde(rename = "siblingsReordered")]
    #[serde(rename_all = "camelCase")]
    SiblingsReordered {
        kind: TreeKind,
        parent_id: Option<i64>,
        ordered_ids: Vec<i64>,
    },

    /// `deleted_count` includes the node itself
    #[serde(rename = "nodeDeleted")]
    #[serde(rename_all = "camelCase")]
    NodeDeleted {
        kind: TreeKind,
        id: i64,
        deleted_count: usize,
    },
}

impl TreeEvent {
    /// Get a string representation of the event type, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            TreeEvent::NodeCreated { .. } => "node:created",
            TreeEvent::NodeUpdated { .. } => "node:updated",
            TreeEvent::NodeMoved { .. } => "node:moved",
            TreeEvent::SiblingsReordered { .. } => "siblings:reordered",
            TreeEvent::NodeDeleted { .. } => "node:deleted",
        }
    }

    /// Tree the event belongs to
    pub fn kind(&self) -> TreeKind {
        match self {
            TreeEvent::NodeCreated { kind, .. }
            | TreeEvent::NodeUpdated { kind, .. }
            | TreeEvent::NodeMoved { kind, .. }
            | TreeEvent::SiblingsReordered { kind, .. }
            | TreeEvent::NodeDeleted { kind, .. } => *kind,
        }
    }
}
