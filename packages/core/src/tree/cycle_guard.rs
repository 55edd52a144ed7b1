//! Cycle guard for move operations
//!
//! Moving node A under node B is only legal when B is neither A nor one of
//! A's descendants. Anything else would make A its own ancestor.

use super::arena::NodeArena;
use thiserror::Error;

/// Why a proposed move was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("cannot move node {node_id} under itself")]
    SelfParent { node_id: i64 },

    #[error("cannot move node {node_id} under its own descendant {parent_id}")]
    IntoDescendant { node_id: i64, parent_id: i64 },
}

/// Check a move of `node_id` under `new_parent` against the current tree
///
/// Moving to the root level (`None`) can never create a cycle.
pub fn check_move(
    arena: &NodeArena,
    node_id: i64,
    new_parent: Option<i64>,
) -> Result<(), MoveRejection> {
    let Some(parent_id) = new_parent else {
        return Ok(());
    };

    if parent_id == node_id {
        return Err(MoveRejection::SelfParent { node_id });
    }

    if arena.is_descendant(node_id, parent_id) {
        return Err(MoveRejection::IntoDescendant { node_id, parent_id });
    }

    Ok(())
}

/// Boolean form of [`check_move`]
pub fn is_move_safe(arena: &NodeArena, node_id: i64, new_parent: Option<i64>) -> bool {
    check_move(arena, node_id, new_parent).is_ok()
}
