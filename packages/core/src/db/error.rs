//! Database Error Types
//!
//! Failures of the libsql layer behind the category, location and field
//! tables. Rule violations found while writing (cycles, depth, stale sibling
//! sets) are not errors here; the store reports them as outcomes.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The classifieds database file could not be opened
    #[error("Cannot open classifieds database at {path}: {source}")]
    Open {
        path: PathBuf,
        source: libsql::Error,
    },

    /// A hierarchy table, the field table or one of their indexes could not be created
    #[error("Cannot create schema object '{object}': {source}")]
    Schema {
        object: String,
        source: libsql::Error,
    },

    /// The directory that should hold the database file is not writable
    #[error("No write access to the database directory for {path}")]
    ReadOnlyLocation { path: PathBuf },

    #[error("Cannot create the database directory: {0}")]
    CreateDirectory(#[from] std::io::Error),

    #[error("Database operation failed: {0}")]
    Libsql(#[from] libsql::Error),

    /// A node or field statement failed; `context` names the operation and row
    #[error("Statement failed: {context}")]
    Statement { context: String },
}

impl DatabaseError {
    pub fn open(path: PathBuf, source: libsql::Error) -> Self {
        Self::Open { path, source }
    }

    pub fn schema(object: impl Into<String>, source: libsql::Error) -> Self {
        Self::Schema {
            object: object.into(),
            source,
        }
    }

    pub fn read_only_location(path: PathBuf) -> Self {
        Self::ReadOnlyLocation { path }
    }

    pub fn statement(context: impl Into<String>) -> Self {
        Self::Statement {
            context: context.into(),
        }
    }
}
