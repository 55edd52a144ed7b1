//! Business Services
//!
//! - `TreeService` - Reads and mutations on one hierarchy (categories or locations)
//! - `CategoryFieldService` - Custom form fields attached to categories
//!
//! Services check authorization, validate input and coordinate the store
//! layer; they never issue SQL themselves.

pub mod error;
pub mod field_service;
pub mod tree_service;

pub use error::TreeServiceError;
pub use field_service::CategoryFieldService;
pub use tree_service::{TreeResult, TreeService};
