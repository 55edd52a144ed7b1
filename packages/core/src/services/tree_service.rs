//! Tree Service - Business Logic Layer
//!
//! `TreeService` implements every read and mutation on one hierarchy. It
//! sits between the HTTP layer and a [`NodeStore`]:
//!
//! - **Authorization**: every operation takes an explicit [`AuthContext`]
//!   and checks it before touching storage
//! - **Validation**: names are trimmed and length-checked, parents must exist
//!   and no write may push a node below [`MAX_TREE_DEPTH`]
//! - **Fresh reads**: each read rebuilds a [`NodeArena`] from storage; there
//!   is no cross-request cache to invalidate
//! - **Two-phase guards**: moves and reorders are checked against the arena
//!   first for a precise error, then re-checked by the store inside the
//!   write transaction
//! - **Events**: each committed mutation is broadcast as a [`TreeEvent`]

use crate::auth::{authorize, AuthContext, Operation};
use crate::db::{MoveOutcome, NodeStore, ReorderOutcome, TreeEvent};
use crate::models::{
    DeletePolicy, DeleteResult, NewNode, Node, NodeUpdate, TreeKind, ValidationError,
};
use crate::services::error::TreeServiceError;
use crate::tree::{
    breadcrumbs, check_move, validate_sibling_order, MoveRejection, NodeArena, TreeError,
    MAX_TREE_DEPTH,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event broadcast channel
const TREE_EVENT_CHANNEL_CAPACITY: usize = 128;

pub type TreeResult<T> = Result<T, TreeServiceError>;

/// Hierarchy operations for categories or locations
///
/// # Examples
///
/// ```no_run
/// # use classifieds_core::auth::AuthContext;
/// # use classifieds_core::db::{DatabaseService, TursoStore};
/// # use classifieds_core::models::{NewNode, TreeKind};
/// # use classifieds_core::services::TreeService;
/// # use std::sync::Arc;
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Arc::new(DatabaseService::new("./data/classifieds.db".into()).await?);
/// let service = TreeService::new(Arc::new(TursoStore::new(db, TreeKind::Category)));
///
/// let admin = AuthContext::admin(1);
/// let vehicles = service.create_node(&admin, NewNode::new("Vehicles", None)).await?;
/// let cars = service.create_node(&admin, NewNode::new("Cars", Some(vehicles.id))).await?;
///
/// let trail = service.breadcrumbs(&AuthContext::guest(), cars.id).await?;
/// assert_eq!(trail[0].id, vehicles.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TreeService {
    store: Arc<dyn NodeStore>,

    /// Broadcast channel for tree events
    event_tx: broadcast::Sender<TreeEvent>,
}

impl TreeService {
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        let (event_tx, _) = broadcast::channel(TREE_EVENT_CHANNEL_CAPACITY);
        Self { store, event_tx }
    }

    /// Which tree this service manages
    pub fn kind(&self) -> TreeKind {
        self.store.kind()
    }

    /// Subscribe to events for committed mutations
    ///
    /// ```no_run
    /// # use classifieds_core::services::TreeService;
    /// # fn demo(service: &TreeService) {
    /// let mut rx = service.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = rx.recv().await {
    ///         println!("{}: {:?}", event.event_type(), event);
    ///     }
    /// });
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores the error returned when nobody is subscribed
    fn emit_event(&self, event: TreeEvent) {
        tracing::debug!("Emitting {} for {}", event.event_type(), event.kind());
        let _ = self.event_tx.send(event);
    }

    async fn load_arena(&self) -> TreeResult<NodeArena> {
        let rows = self.store.list_nodes().await?;
        Ok(NodeArena::build(rows))
    }

    //
    // READS
    //

    /// Nested tree, or the nested children of `parent_id` when given
    ///
    /// Siblings are ordered by `sort_order` (ties by id). Orphans appear
    /// among the roots.
    pub async fn list_tree(
        &self,
        ctx: &AuthContext,
        parent_id: Option<i64>,
    ) -> TreeResult<Vec<Node>> {
        authorize(ctx, Operation::Read)?;
        let arena = self.load_arena().await?;

        match parent_id {
            None => Ok(arena.materialize_forest()),
            Some(id) => arena
                .materialize_children(id)
                .ok_or_else(|| TreeServiceError::not_found(self.kind(), id)),
        }
    }

    /// Flat list of every node, in storage order
    pub async fn list_flat(&self, ctx: &AuthContext) -> TreeResult<Vec<Node>> {
        authorize(ctx, Operation::Read)?;
        Ok(self.store.list_nodes().await?)
    }

    /// A single node, without children
    pub async fn get_node(&self, ctx: &AuthContext, id: i64) -> TreeResult<Node> {
        authorize(ctx, Operation::Read)?;
        self.require_node(id).await
    }

    /// A node with its full subtree materialized
    pub async fn get_subtree(&self, ctx: &AuthContext, id: i64) -> TreeResult<Node> {
        authorize(ctx, Operation::Read)?;
        let arena = self.load_arena().await?;
        arena
            .materialize_subtree(id)
            .ok_or_else(|| TreeServiceError::not_found(self.kind(), id))
    }

    /// Ancestors of `id`, topmost root first, excluding the node itself
    pub async fn breadcrumbs(&self, ctx: &AuthContext, id: i64) -> TreeResult<Vec<Node>> {
        authorize(ctx, Operation::Read)?;
        let arena = self.load_arena().await?;

        breadcrumbs::resolve(&arena, id).map_err(|e| match e {
            TreeError::NodeNotFound(id) => TreeServiceError::not_found(self.kind(), id),
            corrupted => {
                tracing::error!("Breadcrumbs for {} {} failed: {}", self.kind(), id, corrupted);
                TreeServiceError::HierarchyCorrupted(corrupted)
            }
        })
    }

    fn too_deep() -> TreeServiceError {
        ValidationError::TooDeep {
            max: MAX_TREE_DEPTH,
        }
        .into()
    }

    async fn require_node(&self, id: i64) -> TreeResult<Node> {
        self.store
            .get_node(id)
            .await?
            .ok_or_else(|| TreeServiceError::not_found(self.kind(), id))
    }

    //
    // MUTATIONS
    //

    /// Create a node appended after its last sibling
    pub async fn create_node(&self, ctx: &AuthContext, node: NewNode) -> TreeResult<Node> {
        authorize(ctx, Operation::Create)?;
        let node = node.validate()?;

        if let Some(parent_id) = node.parent_id {
            let arena = self.load_arena().await?;
            let parent_depth = arena
                .depth_of(parent_id)
                .ok_or(ValidationError::InvalidParent(parent_id))?;
            if parent_depth >= MAX_TREE_DEPTH {
                return Err(Self::too_deep());
            }
        }

        let created = self.store.create_node(node).await?.ok_or_else(Self::too_deep)?;
        tracing::info!(
            "Created {} {} '{}' under {:?}",
            self.kind(),
            created.id,
            created.name,
            created.parent_id
        );

        self.emit_event(TreeEvent::NodeCreated {
            kind: self.kind(),
            node: created.clone(),
        });
        Ok(created)
    }

    /// Rename and/or toggle visibility
    ///
    /// An empty update returns the node unchanged without writing.
    pub async fn update_node(
        &self,
        ctx: &AuthContext,
        id: i64,
        update: NodeUpdate,
    ) -> TreeResult<Node> {
        authorize(ctx, Operation::Update)?;
        let update = update.validate()?;

        if update.is_empty() {
            return self.require_node(id).await;
        }

        let updated = self
            .store
            .update_node(id, update)
            .await?
            .ok_or_else(|| TreeServiceError::not_found(self.kind(), id))?;
        tracing::info!("Updated {} {}", self.kind(), id);

        self.emit_event(TreeEvent::NodeUpdated {
            kind: self.kind(),
            node: updated.clone(),
        });
        Ok(updated)
    }

    /// Reparent a node, appending it after the last child of its new parent
    ///
    /// The descendant check runs against a freshly built arena and again
    /// inside the store's write transaction, so two concurrent moves cannot
    /// combine into a cycle. Moving a node to its current parent is a no-op.
    pub async fn move_node(
        &self,
        ctx: &AuthContext,
        id: i64,
        new_parent_id: Option<i64>,
    ) -> TreeResult<Node> {
        authorize(ctx, Operation::Move)?;
        let arena = self.load_arena().await?;

        let old_parent_id = arena
            .get(id)
            .ok_or_else(|| TreeServiceError::not_found(self.kind(), id))?
            .parent_id;

        if let Some(parent_id) = new_parent_id {
            if parent_id != id && !arena.contains(parent_id) {
                return Err(ValidationError::InvalidParent(parent_id).into());
            }
        }

        if let Err(rejection) = check_move(&arena, id, new_parent_id) {
            tracing::warn!("Rejected move of {} {}: {}", self.kind(), id, rejection);
            return Err(rejection.into());
        }

        if new_parent_id != old_parent_id {
            let parent_depth = match new_parent_id {
                Some(parent_id) => arena.depth_of(parent_id).unwrap_or_default(),
                None => 0,
            };
            let height = arena.subtree_height(id).unwrap_or(1);
            if parent_depth + height > MAX_TREE_DEPTH {
                tracing::warn!(
                    "Rejected move of {} {}: subtree of {} levels under depth {}",
                    self.kind(),
                    id,
                    height,
                    parent_depth
                );
                return Err(Self::too_deep());
            }
        }

        match self.store.move_node(id, new_parent_id).await? {
            MoveOutcome::Moved => {
                let moved = self.require_node(id).await?;
                tracing::info!(
                    "Moved {} {} from {:?} to {:?}",
                    self.kind(),
                    id,
                    old_parent_id,
                    new_parent_id
                );
                self.emit_event(TreeEvent::NodeMoved {
                    kind: self.kind(),
                    node: moved.clone(),
                    old_parent_id,
                });
                Ok(moved)
            }
            MoveOutcome::Unchanged => self.require_node(id).await,
            MoveOutcome::NodeNotFound => Err(TreeServiceError::not_found(self.kind(), id)),
            MoveOutcome::ParentNotFound => {
                let parent_id = new_parent_id.unwrap_or_default();
                Err(ValidationError::InvalidParent(parent_id).into())
            }
            MoveOutcome::DepthExceeded => Err(Self::too_deep()),
            MoveOutcome::CycleDetected => {
                // Only reachable when a concurrent move changed the tree
                // after the arena was loaded
                let parent_id = new_parent_id.unwrap_or(id);
                tracing::warn!(
                    "Move of {} {} under {} rejected inside transaction",
                    self.kind(),
                    id,
                    parent_id
                );
                let rejection = if parent_id == id {
                    MoveRejection::SelfParent { node_id: id }
                } else {
                    MoveRejection::IntoDescendant {
                        node_id: id,
                        parent_id,
                    }
                };
                Err(rejection.into())
            }
        }
    }

    /// Replace the order of the children of `parent_id` (`None` = roots)
    ///
    /// `ordered_ids` must be exactly the current siblings. Positions are
    /// written as `sort_order = index` in one transaction.
    pub async fn reorder_siblings(
        &self,
        ctx: &AuthContext,
        parent_id: Option<i64>,
        ordered_ids: Vec<i64>,
    ) -> TreeResult<()> {
        authorize(ctx, Operation::Reorder)?;
        let arena = self.load_arena().await?;

        // Orphans sit among the arena's roots but are stored under a
        // parent id, so root siblings are taken from storage
        let current: Vec<i64> = match parent_id {
            None => self
                .store
                .get_children(None)
                .await?
                .iter()
                .map(|n| n.id)
                .collect(),
            Some(id) => arena
                .children_of(Some(id))
                .ok_or(ValidationError::InvalidParent(id))?,
        };
        validate_sibling_order(&current, &ordered_ids)?;

        match self
            .store
            .reorder_siblings(parent_id, ordered_ids.clone())
            .await?
        {
            ReorderOutcome::Reordered => {
                tracing::info!(
                    "Reordered {} children of {:?}: {:?}",
                    self.kind(),
                    parent_id,
                    ordered_ids
                );
                self.emit_event(TreeEvent::SiblingsReordered {
                    kind: self.kind(),
                    parent_id,
                    ordered_ids,
                });
                Ok(())
            }
            ReorderOutcome::Mismatch(mismatch) => Err(mismatch.into()),
            ReorderOutcome::ParentNotFound => {
                let parent_id = parent_id.unwrap_or_default();
                Err(ValidationError::InvalidParent(parent_id).into())
            }
        }
    }

    /// Delete a node; with [`DeletePolicy::Cascade`] its subtree goes too
    pub async fn delete_node(
        &self,
        ctx: &AuthContext,
        id: i64,
        policy: DeletePolicy,
    ) -> TreeResult<DeleteResult> {
        authorize(ctx, Operation::Delete)?;
        self.require_node(id).await?;

        if policy == DeletePolicy::RequireEmpty {
            let children = self.store.get_children(Some(id)).await?;
            if !children.is_empty() {
                return Err(TreeServiceError::conflict(format!(
                    "{} {} still has {} children",
                    self.kind(),
                    id,
                    children.len()
                )));
            }
        }

        let deleted_count = self.store.delete_subtree(id).await?;
        if deleted_count == 0 {
            return Err(TreeServiceError::not_found(self.kind(), id));
        }
        tracing::info!(
            "Deleted {} {} ({} nodes removed)",
            self.kind(),
            id,
            deleted_count
        );

        self.emit_event(TreeEvent::NodeDeleted {
            kind: self.kind(),
            id,
            deleted_count,
        });
        Ok(DeleteResult { deleted_count })
    }
}
