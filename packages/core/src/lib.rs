//! Classifieds Core Business Logic Layer
//!
//! This crate provides the hierarchy management behind the classifieds
//! marketplace: the category tree, the location tree and the custom form
//! fields attached to categories.
//!
//! # Architecture
//!
//! - **Flat storage, nested reads**: rows reference their parent by id; the
//!   nested `children` view is built per request by an arena
//! - **libsql/Turso**: Embedded SQLite-compatible database
//! - **Explicit authorization**: every service call carries an `AuthContext`
//!
//! # Modules
//!
//! - [`models`] - Data structures (Node, CategoryField, payloads)
//! - [`tree`] - Storage-independent tree algorithms
//! - [`auth`] - Role-based authorization policy
//! - [`db`] - Database layer with libsql integration
//! - [`services`] - Business services (TreeService, CategoryFieldService)

pub mod auth;
pub mod db;
pub mod models;
pub mod services;
pub mod tree;

// Re-export commonly used types
pub use auth::{AuthContext, Role};
pub use models::*;
pub use services::*;
