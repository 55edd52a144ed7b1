//! Data Models
//!
//! This module contains the data structures used throughout the marketplace
//! hierarchy core:
//!
//! - `Node` - Shared shape of categories and locations
//! - `CategoryField` - Custom form fields hanging off categories

mod field;
mod node;

pub use field::{CategoryField, FieldType, NewCategoryField};
pub use node::{
    DeletePolicy, DeleteResult, NewNode, Node, NodeUpdate, TreeKind, ValidationError,
    MAX_NAME_LENGTH,
};
