//! Error handling for the libris HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use libris_authz::AuthError;
use thiserror::Error;
use uuid::Uuid;

use crate::response::Envelope;

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { code: String, message: String },

    #[error("duplicate key: {message}")]
    Duplicate { code: String, message: String },

    /// Rejected state transition (already borrowed, not the borrower, ...)
    #[error("conflict: {message}")]
    Conflict { code: String, message: String },

    #[error("not found: {message}")]
    NotFound { code: String, message: String },

    #[error("unauthorized: {message}")]
    Unauthorized { code: String, message: String },

    #[error("forbidden: {message}")]
    Forbidden { code: String, message: String },

    #[error("method not allowed: {message}")]
    MethodNotAllowed { code: String, message: String },

    #[error("timeout: {message}")]
    Timeout { code: String, message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: "validation_error".to_string(),
            message: message.into(),
        }
    }

    /// Create a unique-constraint error
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            code: "duplicate_key".to_string(),
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            code: "conflict".to_string(),
            message: message.into(),
        }
    }

    /// Create a conflict error with a more specific code
    pub fn conflict_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            code: "not_found".to_string(),
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: "unauthorized".to_string(),
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            code: "forbidden".to_string(),
            message: message.into(),
        }
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::MethodNotAllowed {
            code: "method_not_allowed".to_string(),
            message: message.into(),
        }
    }

    /// Request exceeded the server's time budget
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            code: "timeout".to_string(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::Duplicate { .. } | AppError::Conflict { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential | AuthError::InvalidCredential | AuthError::Expired => {
                AppError::unauthorized(err.to_string())
            }
            AuthError::Forbidden { .. } => AppError::forbidden(err.to_string()),
            AuthError::Hashing(_) | AuthError::Signing(_) => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let (error_code, message) = match self {
            AppError::Validation { code, message }
            | AppError::Duplicate { code, message }
            | AppError::Conflict { code, message }
            | AppError::NotFound { code, message }
            | AppError::Unauthorized { code, message }
            | AppError::Forbidden { code, message }
            | AppError::MethodNotAllowed { code, message }
            | AppError::Timeout { code, message } => (code, message),
            // Echoed to the caller; this is an internal tool.
            AppError::Internal(e) => ("internal_error".to_string(), format!("{e:#}")),
        };

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                error = %message,
                "request failed"
            );
        } else {
            tracing::info!(
                error_id = %error_id,
                error_code = %error_code,
                status_code = %status.as_u16(),
                "request rejected"
            );
        }

        let body: Envelope<()> = Envelope {
            success: false,
            message,
            data: None,
            error: Some(error_code),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_authz::{Operation, Role};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        match AppError::validation("title is required") {
            AppError::Validation { code, message } => {
                assert_eq!(code, "validation_error");
                assert_eq!(message, "title is required");
            }
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn conflicts_and_duplicates_are_bad_requests() {
        assert_eq!(
            AppError::conflict("Book not available").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::duplicate("title already exists").status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            AppError::from(AuthError::Expired).status(),
            StatusCode::UNAUTHORIZED
        );
        let forbidden = AuthError::Forbidden {
            role: Role::Member,
            operation: Operation::AddBook,
        };
        assert_eq!(AppError::from(forbidden).status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::not_found("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Book not found");
        assert_eq!(body["error"], "not_found");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_echoes_message() {
        let error = AppError::Internal(anyhow::anyhow!("Database connection failed"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "Database connection failed");
    }
}
