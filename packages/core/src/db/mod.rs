//! Database Layer
//!
//! This module handles all database interactions using libsql:
//!
//! - Database initialization and connection management
//! - One self-referencing table per hierarchy (categories, locations)
//! - Transactional move and reorder with in-transaction validation
//! - Category custom field storage
//!
//! # Architecture
//!
//! `DatabaseService` owns the SQL. `TursoStore` and `TursoFieldStore` wrap it
//! behind the [`NodeStore`] and [`FieldStore`] traits that the services
//! depend on.

mod database;
mod error;
pub mod events;
mod node_store;
mod turso_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use events::TreeEvent;
pub use node_store::{FieldStore, MoveOutcome, NodeStore, ReorderOutcome};
pub use turso_store::{TursoFieldStore, TursoStore};
