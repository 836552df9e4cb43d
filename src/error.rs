/// Application Error Handling
///
/// Unified error type for the authentication and authorization layer.
/// Covers:
/// 1. Control flow errors (Result-based, converted with `?`)
/// 2. HTTP response mapping via actix-web's `ResponseError`
/// 3. Structured error logging with tracing
///
/// Authorization failures are reported without detail: `Unauthorized` and
/// `Forbidden` never say which check failed, and reset-state errors are
/// collapsed into a generic "invalid or expired" message.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::validators::ValidationError;

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    /// Missing, invalid, or expired session token; unresolvable principal
    Unauthorized,
    /// Authenticated but insufficient permission, or unregistered route
    Forbidden,
    /// Login password mismatch (or unknown account, indistinguishably)
    InvalidCredential,
    /// Referenced user or reset credential absent
    NotFound(String),
    /// Reset credential already consumed
    AlreadyConsumed,
    /// Reset credential past its expiration
    Expired,
    /// Input rejected before reaching the core
    Validation(ValidationError),
    /// Persistence collaborator failure
    Database(String),
    /// Outbound mail relay failure
    Email(String),
    /// Hashing/signing or other internal computation failure
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthorized => write!(f, "unauthorized"),
            AppError::Forbidden => write!(f, "forbidden"),
            AppError::InvalidCredential => write!(f, "invalid credentials"),
            AppError::NotFound(what) => write!(f, "not found: {}", what),
            AppError::AlreadyConsumed => write!(f, "reset credential already used"),
            AppError::Expired => write!(f, "reset credential expired"),
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(msg) => write!(f, "database error: {}", msg),
            AppError::Email(msg) => write!(f, "email delivery error: {}", msg),
            AppError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("record".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

/// Error response body for HTTP rejections
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(message: String, code: String, status: u16) -> Self {
        Self {
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    /// Map to an HTTP status plus a client-safe body.
    ///
    /// The body deliberately says as little as possible: 401/403 are generic,
    /// and credential/reset-state failures share one "invalid or expired"
    /// wording so a caller cannot probe which account or credential exists.
    fn response_parts(&self) -> (StatusCode, String, String) {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                "unauthorized".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN".to_string(),
                "forbidden".to_string(),
            ),
            AppError::InvalidCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS".to_string(),
                "invalid username or password".to_string(),
            ),
            AppError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                "not found".to_string(),
            ),
            AppError::AlreadyConsumed | AppError::Expired => (
                StatusCode::BAD_REQUEST,
                "RESET_TOKEN_INVALID".to_string(),
                "invalid or expired reset token".to_string(),
            ),
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR".to_string(),
                "internal server error".to_string(),
            ),
            AppError::Email(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "EMAIL_SERVICE_ERROR".to_string(),
                "email service temporarily unavailable".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "internal server error".to_string(),
            ),
        }
    }

    fn log(&self) {
        match self {
            AppError::Unauthorized | AppError::Forbidden => {
                tracing::warn!(error = %self, "request rejected");
            }
            AppError::InvalidCredential => {
                tracing::warn!("invalid credentials attempt");
            }
            AppError::NotFound(what) => {
                tracing::warn!(what = %what, "lookup miss");
            }
            AppError::AlreadyConsumed | AppError::Expired => {
                tracing::warn!(error = %self, "unusable reset credential presented");
            }
            AppError::Validation(e) => {
                tracing::warn!(error = %e, "validation error");
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "database error");
            }
            AppError::Email(msg) => {
                tracing::error!(error = %msg, "email service error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        self.log();
        let (status, code, message) = self.response_parts();
        let body = ErrorResponse::new(message, code, status.as_u16());
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.response_parts().0
    }
}
