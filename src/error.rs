//! Error types for the bookstore server

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes carried in every error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    NoSuchBook = 5,
    Duplicate = 8,
    BadValue = 18,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error on {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Conflict: a book with {field} {value} already exists")]
    Conflict { field: &'static str, value: String },
}

impl AppError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn isbn_conflict(isbn: &str) -> Self {
        AppError::Conflict {
            field: "isbn",
            value: isbn.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::validation("query", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::validation("path", rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Offending field, for validation and conflict errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, field) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, None),
            AppError::Validation { field, .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, Some(field.to_string()))
            }
            AppError::Conflict { field, .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::Duplicate, Some(field.to_string()))
            }
        };

        let message = match &self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation { reason, .. } => reason.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            field,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("Book 4 not found".into()), StatusCode::NOT_FOUND),
            (AppError::validation("title", "Title is required"), StatusCode::BAD_REQUEST),
            (AppError::isbn_conflict("978-0-452-28423-4"), StatusCode::BAD_REQUEST),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_conflict_message_names_isbn() {
        let error = AppError::isbn_conflict("X");
        assert_eq!(error.to_string(), "Conflict: a book with isbn X already exists");
    }
}
