//! Error types for Notarium services
//!
//! Provides the error taxonomy shared by the repository, the bootstrapper
//! and the gateway:
//! - Distinct variants for unavailable storage, serialization and store failures
//! - HTTP status code mapping
//! - Structured error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    ReceiptNotFound,
    NoReceipts,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    StorageUnavailable,
    SchemaError,

    // Internal errors (9xxx)
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1003,

            ErrorCode::ReceiptNotFound => 4002,
            ErrorCode::NoReceipts => 4003,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::StorageUnavailable => 7003,
            ErrorCode::SchemaError => 7004,

            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Receipt not found for target hash {hash}")]
    ReceiptNotFound { hash: String },

    /// `list_all` on a store holding no live receipts.
    #[error("No receipts in database")]
    NoReceipts,

    // Storage errors
    #[error("Storage handle unavailable in execution context")]
    StorageUnavailable,

    #[error("Storage operation {operation} failed{}: {source}", hash_suffix(.hash))]
    Storage {
        operation: &'static str,
        hash: Option<String>,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Could not connect to database after {attempts} attempts: {source}")]
    Bootstrap {
        attempts: u32,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Schema reconciliation failed: {source}")]
    SchemaReconciliation {
        #[source]
        source: sea_orm::DbErr,
    },

    // Internal errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Stored proof could not be decoded: {0}")]
    Deserialization(#[source] serde_json::Error),
}

fn hash_suffix(hash: &Option<String>) -> String {
    hash.as_ref()
        .map(|h| format!(" for target hash {}", h))
        .unwrap_or_default()
}

impl AppError {
    /// Wrap a store error with the operation and hash it concerned
    pub fn storage(operation: &'static str, hash: Option<&str>, source: sea_orm::DbErr) -> Self {
        AppError::Storage {
            operation,
            hash: hash.map(str::to_string),
            source,
        }
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::ReceiptNotFound { .. } => ErrorCode::ReceiptNotFound,
            AppError::NoReceipts => ErrorCode::NoReceipts,
            AppError::StorageUnavailable => ErrorCode::StorageUnavailable,
            AppError::Storage { .. } => ErrorCode::DatabaseError,
            AppError::Bootstrap { .. } => ErrorCode::ConnectionError,
            AppError::SchemaReconciliation { .. } => ErrorCode::SchemaError,
            AppError::Configuration(_) => ErrorCode::ConfigurationError,
            AppError::Serialization(_) | AppError::Deserialization(_) => {
                ErrorCode::SerializationError
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } |
            AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::ReceiptNotFound { .. } |
            AppError::NoReceipts => StatusCode::NOT_FOUND,

            // 500 Internal Server Error
            AppError::Storage { .. } |
            AppError::SchemaReconciliation { .. } |
            AppError::Configuration(_) |
            AppError::Serialization(_) |
            AppError::Deserialization(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            AppError::StorageUnavailable |
            AppError::Bootstrap { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();

        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::ReceiptNotFound { hash: "ab12".into() };
        assert_eq!(err.code(), ErrorCode::ReceiptNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_unavailable_is_distinct() {
        let err = AppError::StorageUnavailable;
        assert_eq!(err.code(), ErrorCode::StorageUnavailable);
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(err.is_server_error());
    }

    #[test]
    fn test_storage_error_carries_context() {
        let err = AppError::storage(
            "delete_by_hash",
            Some("cafe"),
            sea_orm::DbErr::Custom("connection reset".into()),
        );
        let message = err.to_string();
        assert!(message.contains("delete_by_hash"));
        assert!(message.contains("cafe"));
        assert!(message.contains("connection reset"));
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn test_storage_error_without_hash() {
        let err = AppError::storage("list_all", None, sea_orm::DbErr::Custom("boom".into()));
        let message = err.to_string();
        assert!(message.starts_with("Storage operation list_all failed: "));
        assert!(!message.contains("target hash"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Invalid filename".into(),
            field: Some("filename".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let response = AppError::NoReceipts.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "NO_RECEIPTS");
        assert_eq!(body["error"]["message"], "No receipts in database");
    }
}
