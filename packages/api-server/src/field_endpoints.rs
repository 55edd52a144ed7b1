//! Category Field Endpoints
//!
//! - `GET /api/fields?categoryId=` - Fields of a category in display order
//! - `POST /api/fields` - Create a field
//! - `POST /api/fields/reorder` - Replace the display order
//! - `DELETE /api/fields/:id` - Delete a field

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::http_error::HttpError;
use classifieds_core::auth::AuthContext;
use classifieds_core::models::{CategoryField, NewCategoryField};
use classifieds_core::services::CategoryFieldService;

type Service = Arc<CategoryFieldService>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsQuery {
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderFieldsRequest {
    pub category_id: i64,
    pub ordered_ids: Vec<i64>,
}

async fn list_fields(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<FieldsQuery>,
) -> Result<Json<Vec<CategoryField>>, HttpError> {
    Ok(Json(service.list_fields(&ctx, query.category_id).await?))
}

async fn create_field(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewCategoryField>,
) -> Result<(StatusCode, Json<CategoryField>), HttpError> {
    let field = service.create_field(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

async fn delete_field(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    service.delete_field(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reorder_fields(
    State(service): State<Service>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ReorderFieldsRequest>,
) -> Result<StatusCode, HttpError> {
    service
        .reorder_fields(&ctx, request.category_id, request.ordered_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(service: Service) -> Router {
    Router::new()
        .route("/api/fields", get(list_fields).post(create_field))
        .route("/api/fields/reorder", post(reorder_fields))
        .route("/api/fields/:id", delete(delete_field))
        .with_state(service)
}
