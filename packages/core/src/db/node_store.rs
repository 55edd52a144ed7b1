//! NodeStore Trait - Database Abstraction Layer
//!
//! This module defines the `NodeStore` trait that abstracts persistence of
//! one hierarchy (categories or locations). `TreeService` holds a
//! `dyn NodeStore` and never touches SQL directly.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async; the backing store is reached
//!    through libsql
//! 2. **Outcomes, not errors**: Rule violations detected while writing (a
//!    cycle found inside the move transaction, a stale sibling set during
//!    reorder) come back as [`MoveOutcome`] / [`ReorderOutcome`] values so
//!    the service can map each to its own error kind
//! 3. **Error Handling**: Storage failures use `anyhow::Result` for context
//!
//! # Examples
//!
//! ```rust,no_run
//! use classifieds_core::db::{DatabaseService, NodeStore, TursoStore};
//! use classifieds_core::models::{NewNode, TreeKind};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./classifieds.db")).await?);
//!     let store: Arc<dyn NodeStore> = Arc::new(TursoStore::new(db, TreeKind::Category));
//!
//!     if let Some(vehicles) = store.create_node(NewNode::new("Vehicles", None)).await? {
//!         store.create_node(NewNode::new("Cars", Some(vehicles.id))).await?;
//!     }
//!     Ok(())
//! }
//! ```

use crate::models::{CategoryField, NewCategoryField, NewNode, Node, NodeUpdate, TreeKind};
use crate::tree::SiblingSetMismatch;
use anyhow::Result;
use async_trait::async_trait;

/// Result of a transactional move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Parent changed; the node was appended to its new sibling group
    Moved,
    /// Node already had the requested parent, nothing written
    Unchanged,
    NodeNotFound,
    ParentNotFound,
    /// The new parent is the node itself or one of its descendants
    CycleDetected,
    /// The moved subtree would reach below the maximum tree depth
    DepthExceeded,
}

/// Result of a transactional sibling reorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    Reordered,
    /// Submitted ids differ from the stored sibling set; nothing written
    Mismatch(SiblingSetMismatch),
    ParentNotFound,
}

/// Persistence for a single hierarchy
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so services can be shared across
/// request handlers.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Which tree this store persists
    fn kind(&self) -> TreeKind;

    //
    // CORE CRUD OPERATIONS
    //

    /// Insert a validated node, appended after its last sibling
    ///
    /// Returns `Ok(None)` without writing when the parent already sits at
    /// the maximum tree depth, checked against the state seen by the insert.
    ///
    /// # Errors
    ///
    /// Returns error if the parent doesn't exist (foreign key violation) or
    /// the database fails.
    async fn create_node(&self, node: NewNode) -> Result<Option<Node>>;

    /// Fetch a node without children; `Ok(None)` if it doesn't exist
    async fn get_node(&self, id: i64) -> Result<Option<Node>>;

    /// Every node of the tree as flat rows
    async fn list_nodes(&self) -> Result<Vec<Node>>;

    /// Direct children of `parent_id` (`None` = roots), in sibling order
    async fn get_children(&self, parent_id: Option<i64>) -> Result<Vec<Node>>;

    /// Apply a partial update; `Ok(None)` if the node doesn't exist
    async fn update_node(&self, id: i64, update: NodeUpdate) -> Result<Option<Node>>;

    /// Delete a node and its descendants, returning how many rows went away
    async fn delete_subtree(&self, id: i64) -> Result<usize>;

    //
    // HIERARCHY OPERATIONS
    //

    /// Reparent a node inside a single write transaction
    ///
    /// Implementations must re-check for cycles against the state visible
    /// inside the transaction, not against a snapshot read earlier.
    async fn move_node(&self, id: i64, new_parent_id: Option<i64>) -> Result<MoveOutcome>;

    /// Persist a complete new sibling order atomically
    async fn reorder_siblings(
        &self,
        parent_id: Option<i64>,
        ordered_ids: Vec<i64>,
    ) -> Result<ReorderOutcome>;
}

/// Persistence for category custom fields
#[async_trait]
pub trait FieldStore: Send + Sync {
    async fn create_field(&self, field: NewCategoryField) -> Result<CategoryField>;

    async fn get_field(&self, id: i64) -> Result<Option<CategoryField>>;

    /// Fields of a category in display order
    async fn list_fields(&self, category_id: i64) -> Result<Vec<CategoryField>>;

    /// Returns false if the field didn't exist
    async fn delete_field(&self, id: i64) -> Result<bool>;

    async fn reorder_fields(&self, category_id: i64, ordered_ids: Vec<i64>)
        -> Result<ReorderOutcome>;
}
