use thiserror::Error;

use crate::{operation::Operation, role::Role};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("invalid bearer credential")]
    InvalidCredential,

    #[error("bearer credential expired")]
    Expired,

    #[error("role {role} may not {operation}")]
    Forbidden { role: Role, operation: Operation },

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token signing failed: {0}")]
    Signing(String),
}
