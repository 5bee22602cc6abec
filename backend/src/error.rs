//! Error handling for the café inventory server
//!
//! Every rejection a form can recover from (validation, state, duplicate,
//! password) is a structured variant; only storage failures end up as a
//! generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{FieldError, Item};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Input errors
    #[error("Validation failed: {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Duplicate item: {}", .existing.name)]
    DuplicateItem { existing: Box<Item> },

    // Authorization placeholder
    #[error("Invalid password")]
    InvalidPassword,

    // Persistence errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    /// Single-field validation failure
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Whether the request may succeed if the user corrects their input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::NotFound(_)
                | AppError::InvalidState(_)
                | AppError::DuplicateItem { .. }
                | AppError::InvalidPassword
        )
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    /// Existing record that blocked a create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Item>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            errors: Vec::new(),
            conflict: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: errors.first().and_then(|e| e.field.clone()),
                    errors: errors.clone(),
                    ..ErrorDetail::new("VALIDATION_ERROR", "Submitted values are invalid")
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InvalidState(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("INVALID_STATE", msg.clone()),
            ),
            AppError::DuplicateItem { existing } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    conflict: Some((**existing).clone()),
                    ..ErrorDetail::new(
                        "DUPLICATE_ENTRY",
                        format!("An item matching \"{}\" already exists", existing.name),
                    )
                },
            ),
            AppError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    field: Some("password".to_string()),
                    ..ErrorDetail::new("INVALID_PASSWORD", "Invalid password")
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::StorageError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("STORAGE_ERROR", "A storage error occurred"),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        };

        if self.is_recoverable() {
            tracing::debug!("Rejected request: {}", self);
        } else {
            tracing::error!("Error: {:?}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
