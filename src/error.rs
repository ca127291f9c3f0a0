//! Domain errors for libris operations and their HTTP mapping.

use libris_authz::AuthError;
use libris_db::StoreError;
use libris_http::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{0}")]
    Validation(String),

    #[error("{field} already exists")]
    DuplicateKey { field: &'static str },

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The requested transition is not valid from the current state.
    #[error("{0}")]
    Conflict(&'static str),

    #[error("Book not borrowed by this user")]
    Ownership,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("user is already deleted")]
    AccountDeleted,

    #[error("Current password is incorrect")]
    InvalidCurrentPassword,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(StoreError),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for LibraryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { field, .. } => LibraryError::DuplicateKey { field },
            other => LibraryError::Store(other),
        }
    }
}

/// Trimmed, non-empty value of a required field.
pub fn required(field: &str, value: Option<String>) -> Result<String, LibraryError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LibraryError::Validation(format!("{field} is required")))
}

/// Non-empty value of a password field, kept byte for byte. Whitespace is
/// part of the secret.
pub fn secret(field: &str, value: Option<String>) -> Result<String, LibraryError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LibraryError::Validation(format!("{field} is required")))
}

/// Like [`required`], but absent is fine; present-but-blank is not.
pub fn optional(field: &str, value: Option<String>) -> Result<Option<String>, LibraryError> {
    value.map(|v| required(field, Some(v))).transpose()
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        let message = err.to_string();
        match err {
            LibraryError::Validation(_) => AppError::validation(message),
            LibraryError::DuplicateKey { .. } => AppError::duplicate(message),
            LibraryError::NotFound(_) => AppError::not_found(message),
            LibraryError::Conflict(_) => AppError::conflict(message),
            LibraryError::Ownership => AppError::conflict_with_code("ownership_error", message),
            LibraryError::InvalidCredentials => AppError::unauthorized(message),
            LibraryError::AccountDeleted => AppError::forbidden(message),
            LibraryError::InvalidCurrentPassword => AppError::Validation {
                code: "invalid_current_password".to_string(),
                message,
            },
            LibraryError::Auth(auth) => auth.into(),
            LibraryError::Store(StoreError::VersionConflict { .. }) => {
                AppError::conflict_with_code(
                    "concurrent_modification",
                    format!("{message}; retry the request"),
                )
            }
            LibraryError::Store(store) => AppError::Internal(store.into()),
            LibraryError::Internal(_) => AppError::Internal(anyhow::anyhow!(message)),
        }
    }
}
