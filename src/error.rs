//! Error types for the toilet review server.
//!
//! This module defines a unified error handling system using `thiserror`.
//! All errors are converted to appropriate HTTP responses automatically.
//!
//! # Error Categories
//!
//! - **Client errors (4xx)**: Invalid input, missing entities, conflicts,
//!   unsupported image types
//! - **Server errors (5xx)**: Internal failures, I/O errors, database errors
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::error::{AppError, Result};
//!
//! fn check_title(title: &str) -> Result<()> {
//!     if title.trim().is_empty() {
//!         return Err(AppError::validation("title must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
///
/// Each variant is mapped to an HTTP status code in [`AppError::status_code`].
#[derive(Debug, Error)]
pub enum AppError {
    // -------------------------------------------------------------------------
    // Client Errors (4xx)
    // -------------------------------------------------------------------------
    /// Invalid request or validation error
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Toilet not found: {0}")]
    ToiletNotFound(Uuid),

    #[error("Comment not found: {0}")]
    CommentNotFound(Uuid),

    #[error("Rating not found: {0}")]
    RatingNotFound(Uuid),

    #[error("Image not found: {0}")]
    ImageNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("No user registered with email {0}")]
    UnknownEmail(String),

    /// Request collides with existing state (duplicate email, second rating)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unsupported image type
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Stored representation does not match the `Accept` header
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// Request payload too large
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    // -------------------------------------------------------------------------
    // Server Errors (5xx)
    // -------------------------------------------------------------------------
    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rocksdb::Error),

    /// Document (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    // -------------------------------------------------------------------------
    // Convenience constructors
    // -------------------------------------------------------------------------

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(msg: S) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an unsupported media type error
    pub fn unsupported_media_type<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    /// Create a not acceptable error
    pub fn not_acceptable<S: Into<String>>(msg: S) -> Self {
        Self::NotAcceptable(msg.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large<S: Into<String>>(msg: S) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::ToiletNotFound(_)
            | Self::CommentNotFound(_)
            | Self::RatingNotFound(_)
            | Self::ImageNotFound(_)
            | Self::UserNotFound(_)
            | Self::UnknownEmail(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            // 5xx Server Errors
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn error_type(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ToiletNotFound(_) => "toilet_not_found",
            Self::CommentNotFound(_) => "comment_not_found",
            Self::RatingNotFound(_) => "rating_not_found",
            Self::ImageNotFound(_) => "image_not_found",
            Self::UserNotFound(_) | Self::UnknownEmail(_) => "user_not_found",
            Self::Conflict(_) => "conflict",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::NotAcceptable(_) => "not_acceptable",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal_error",
            Self::Io(_) => "io_error",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
            Self::Config(_) => "config_error",
        }
    }
}

/// Error response body sent to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Add status code to the response
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, "Server error occurred");
        } else {
            tracing::debug!(error = %self, "Client error occurred");
        }

        // For server errors, don't expose internal details to clients
        let message = if self.is_server_error() {
            "An internal error occurred. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse::new(self.error_type(), message).with_status(status);

        (status, Json(body)).into_response()
    }
}

// -------------------------------------------------------------------------
// Error conversions from external crates
// -------------------------------------------------------------------------

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::Validation(format!("Invalid UUID: {}", err))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        Self::Validation(format!("Invalid image data: {}", err))
    }
}

impl From<crate::config::ConfigError> for AppError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
