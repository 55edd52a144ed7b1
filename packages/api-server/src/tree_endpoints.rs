//! Tree Endpoints
//!
//! The same router serves both hierarchies; it is mounted once per
//! [`TreeService`] (`/api/categories`, `/api/locations`).
//!
//! # Endpoints
//!
//! - `GET /?parentId=` - Nested tree, or the nested children of a node
//! - `POST /` - Create a node
//! - `POST /reorder` - Replace the order of a sibling group
//! - `GET /:id` - Get a node
//! - `PATCH /:id` - Rename / toggle visibility
//! - `DELETE /:id?requireEmpty=` - Delete a node (cascades unless `requireEmpty`)
//! - `GET /:id/subtree` - A node with its descendants
//! - `GET /:id/breadcrumbs` - Ancestors, root first
//! - `POST /:id/move` - Reparent a node

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::http_error::HttpError;
use classifieds_core::auth::AuthContext;
use classifieds_core::models::{DeletePolicy, DeleteResult, NewNode, Node, NodeUpdate};
use classifieds_core::services::TreeService;

type Service = Arc<TreeService>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub parent_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteQuery {
    #[serde(default)]
    pub require_empty: bool,
}

/// Body of `POST /:id/move`; a missing or null `parentId` moves to the root level
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub ordered_ids: Vec<i64>,
}

async fn list_tree(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Node>>, HttpError> {
    Ok(Json(service.list_tree(&ctx, query.parent_id).await?))
}

async fn create_node(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewNode>,
) -> Result<(StatusCode, Json<Node>), HttpError> {
    let node = service.create_node(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn get_node(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(service.get_node(&ctx, id).await?))
}

async fn get_subtree(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(service.get_subtree(&ctx, id).await?))
}

async fn update_node(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(update): Json<NodeUpdate>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(service.update_node(&ctx, id, update).await?))
}

async fn delete_node(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResult>, HttpError> {
    let policy = if query.require_empty {
        DeletePolicy::RequireEmpty
    } else {
        DeletePolicy::Cascade
    };
    Ok(Json(service.delete_node(&ctx, id, policy).await?))
}

async fn breadcrumbs(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Node>>, HttpError> {
    Ok(Json(service.breadcrumbs(&ctx, id).await?))
}

async fn move_node(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Node>, HttpError> {
    Ok(Json(service.move_node(&ctx, id, request.parent_id).await?))
}

async fn reorder_siblings(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ReorderRequest>,
) -> Result<StatusCode, HttpError> {
    service
        .reorder_siblings(&ctx, request.parent_id, request.ordered_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Router for one hierarchy, to be nested under its mount point
pub fn routes(service: Service) -> Router {
    Router::new()
        .route("/", get(list_tree).post(create_node))
        .route("/reorder", post(reorder_siblings))
        .route(
            "/:id",
            get(get_node).patch(update_node).delete(delete_node),
        )
        .route("/:id/subtree", get(get_subtree))
        .route("/:id/breadcrumbs", get(breadcrumbs))
        .route("/:id/move", post(move_node))
        .with_state(service)
}
