//! Authorization
//!
//! Every service operation receives an explicit [`AuthContext`] describing
//! the caller. Whether the caller may perform an operation is decided by
//! [`authorize`], a pure function of the actor's role and the operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Role of the calling actor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Marketplace administrators manage categories and locations
    Admin,
    /// Signed-in users posting listings
    Member,
    /// Anonymous visitors
    #[default]
    Guest,
}

impl Role {
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "member" | "user" => Some(Role::Member),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

/// Operations gated by the authorization policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Move,
    Reorder,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Move => "move",
            Operation::Reorder => "reorder",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The caller of an operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub actor_id: Option<i64>,
    pub role: Role,
}

impl AuthContext {
    pub fn new(actor_id: Option<i64>, role: Role) -> Self {
        Self { actor_id, role }
    }

    pub fn admin(actor_id: i64) -> Self {
        Self::new(Some(actor_id), Role::Admin)
    }

    pub fn member(actor_id: i64) -> Self {
        Self::new(Some(actor_id), Role::Member)
    }

    pub fn guest() -> Self {
        Self::default()
    }
}

/// Authorization failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{role:?} may not {operation}")]
pub struct AuthError {
    pub role: Role,
    pub operation: Operation,
}

/// Decide whether `ctx` may perform `operation`
///
/// Admins may do everything; everyone else may only read.
pub fn authorize(ctx: &AuthContext, operation: Operation) -> Result<(), AuthError> {
    let allowed = match ctx.role {
        Role::Admin => true,
        Role::Member | Role::Guest => operation == Operation::Read,
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError {
            role: ctx.role,
            operation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTATIONS: [Operation; 5] = [
        Operation::Create,
        Operation::Update,
        Operation::Move,
        Operation::Reorder,
        Operation::Delete,
    ];

    #[test]
    fn test_admin_may_do_everything() {
        let ctx = AuthContext::admin(1);
        assert!(authorize(&ctx, Operation::Read).is_ok());
        for op in MUTATIONS {
            assert!(authorize(&ctx, op).is_ok());
        }
    }

    #[test]
    fn test_non_admins_are_read_only() {
        for ctx in [AuthContext::member(7), AuthContext::guest()] {
            assert!(authorize(&ctx, Operation::Read).is_ok());
            for op in MUTATIONS {
                assert_eq!(
                    authorize(&ctx, op),
                    Err(AuthError {
                        role: ctx.role,
                        operation: op
                    })
                );
            }
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::Member));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(AuthContext::guest().role, Role::Guest);
    }

    #[test]
    fn test_error_message() {
        let err = authorize(&AuthContext::guest(), Operation::Delete).unwrap_err();
        assert_eq!(err.to_string(), "Guest may not delete");
    }
}
