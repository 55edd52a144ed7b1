//! Classifieds HTTP API
//!
//! REST endpoints over the category tree, the location tree and category
//! custom fields.
//!
//! # Architecture
//!
//! The router is assembled from endpoint modules via `.nest()`/`.merge()`:
//! - `tree_endpoints`: mounted once per hierarchy
//! - `field_endpoints`: category custom fields
//!
//! # Security
//!
//! Identity comes from `x-actor-id` / `x-actor-role` headers set by the
//! session layer in front of this server. `actor_middleware` turns them into
//! an `AuthContext` extension for every route. Only admins may mutate.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use classifieds_core::db::{DatabaseService, NodeStore, TursoFieldStore, TursoStore};
use classifieds_core::models::TreeKind;
use classifieds_core::services::{CategoryFieldService, TreeService};

pub mod actor;
pub mod config;
mod field_endpoints;
pub mod http_error;
mod tree_endpoints;

pub use actor::actor_middleware;
pub use config::ServerConfig;
pub use http_error::HttpError;

/// Services shared by all endpoints
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<TreeService>,
    pub locations: Arc<TreeService>,
    pub fields: Arc<CategoryFieldService>,
}

impl AppState {
    /// Open the database at `db_path` and wire up the services
    pub async fn open(db_path: PathBuf) -> anyhow::Result<Self> {
        let db = Arc::new(DatabaseService::new(db_path).await?);

        let category_store: Arc<dyn NodeStore> =
            Arc::new(TursoStore::new(db.clone(), TreeKind::Category));
        let location_store: Arc<dyn NodeStore> =
            Arc::new(TursoStore::new(db.clone(), TreeKind::Location));

        Ok(Self {
            categories: Arc::new(TreeService::new(category_store.clone())),
            locations: Arc::new(TreeService::new(location_store)),
            fields: Arc::new(CategoryFieldService::new(
                Arc::new(TursoFieldStore::new(db)),
                category_store,
            )),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
///
/// ```bash
/// curl http://localhost:3001/api/health
/// ```
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create the application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/categories", tree_endpoints::routes(state.categories))
        .nest("/api/locations", tree_endpoints::routes(state.locations))
        .merge(field_endpoints::routes(state.fields))
        .layer(middleware::from_fn(actor_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Create CORS layer for the configured frontend origins
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| anyhow::anyhow!("Invalid CORS origin '{}'", o))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_TYPE])
        .allow_credentials(false))
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns error if the database cannot be opened or the server fails to
/// bind or start.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::open(config.db_path.clone()).await?;
    let app = create_router(state).layer(cors_layer(&config.cors_allow_origins)?);

    let addr = config.bind_address();
    tracing::info!("HTTP server starting on http://{}", addr);
    tracing::info!("CORS enabled for {:?}", config.cors_allow_origins);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
