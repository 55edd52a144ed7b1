//! Breadcrumb resolution
//!
//! Follows `parent_id` upward from a node and returns its ancestors ordered
//! root first. The node itself is not part of its breadcrumb trail.

use super::arena::NodeArena;
use super::{TreeError, MAX_TREE_DEPTH};
use crate::models::Node;
use std::collections::HashSet;

/// Longest ancestor chain the resolver will follow
///
/// A node at [`MAX_TREE_DEPTH`] has one ancestor fewer than this, so only
/// rows written around the depth check can hit it.
pub const MAX_BREADCRUMB_DEPTH: usize = MAX_TREE_DEPTH;

/// Ancestors of `id`, topmost root first, excluding `id` itself
///
/// An orphan's trail ends at the orphan (its missing parent is skipped).
/// A parent cycle yields [`TreeError::CycleDetected`].
pub fn resolve(arena: &NodeArena, id: i64) -> Result<Vec<Node>, TreeError> {
    let start = arena.get(id).ok_or(TreeError::NodeNotFound(id))?;

    let mut trail = Vec::new();
    let mut visited = HashSet::from([id]);
    let mut current = start;

    while let Some(parent_id) = current.parent_id {
        let Some(parent) = arena.get(parent_id) else {
            break;
        };
        if !visited.insert(parent_id) {
            return Err(TreeError::CycleDetected { node_id: parent_id });
        }
        if trail.len() >= MAX_BREADCRUMB_DEPTH {
            return Err(TreeError::DepthExceeded {
                max: MAX_BREADCRUMB_DEPTH,
            });
        }
        trail.push(parent.clone());
        current = parent;
    }

    trail.reverse();
    Ok(trail)
}
