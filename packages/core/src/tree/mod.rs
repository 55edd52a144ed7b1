//! Hierarchy Algorithms
//!
//! Pure, storage-independent logic shared by the category and location
//! trees:
//!
//! - [`NodeArena`] - Builds the nested view from flat rows
//! - [`cycle_guard`] - Rejects moves that would make a node its own ancestor
//! - [`reorder`] - Validates submitted sibling orders
//! - [`breadcrumbs`] - Resolves the ancestor trail of a node

mod arena;
pub mod breadcrumbs;
pub mod cycle_guard;
pub mod reorder;

pub use arena::{flatten, NodeArena};
pub use cycle_guard::{check_move, is_move_safe, MoveRejection};
pub use reorder::{assign_sort_orders, validate_sibling_order, SiblingSetMismatch};

use thiserror::Error;

/// Deepest a tree may grow, counting levels from 1 at the roots
///
/// Writes that would place a node below this level are rejected, which keeps
/// materialized trees shallow enough to serialize, compare and drop.
pub const MAX_TREE_DEPTH: usize = 100;

/// Errors raised while walking a tree
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("Node {0} is not part of the tree")]
    NodeNotFound(i64),

    #[error("Parent cycle detected at node {node_id}")]
    CycleDetected { node_id: i64 },

    #[error("Ancestor chain exceeds {max} levels")]
    DepthExceeded { max: usize },
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::models::Node;
    use chrono::Utc;

    pub fn node(id: i64, parent_id: Option<i64>, sort_order: i64) -> Node {
        Node {
            id,
            name: format!("node-{}", id),
            parent_id,
            sort_order,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            children: Vec::new(),
        }
    }
}
