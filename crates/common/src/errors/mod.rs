//! Error types for Scholar Harvest
//!
//! Provides one error enum for the whole pipeline with:
//! - Distinct variants for each failure mode of a harvest run
//! - Stable machine-readable error codes
//! - Severity classification (fatal to the run, per-record, or warning-only)

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Record errors (1xxx)
    MissingField,
    InvalidFormat,
    UnknownRecord,

    // Relationship errors (4xxx)
    OrganizationNotFound,
    AuthorNotFound,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Records (1xxx)
            ErrorCode::MissingField => 1001,
            ErrorCode::InvalidFormat => 1002,
            ErrorCode::UnknownRecord => 1003,

            // Relationships (4xxx)
            ErrorCode::OrganizationNotFound => 4001,
            ErrorCode::AuthorNotFound => 4002,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Record errors
    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Unrecognized record shape: {message}")]
    UnknownRecord { message: String },

    // Relationship errors
    #[error("Organization not found: {name}")]
    OrganizationNotFound { name: String },

    #[error("No scientist profile matches author fragment: {fragment}")]
    AuthorNotFound { fragment: String },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::UnknownRecord { .. } => ErrorCode::UnknownRecord,
            AppError::OrganizationNotFound { .. } => ErrorCode::OrganizationNotFound,
            AppError::AuthorNotFound { .. } => ErrorCode::AuthorNotFound,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io { .. } => ErrorCode::IoError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Errors that end the whole run: nothing can be stored after them
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseConnection { .. }
                | AppError::Configuration { .. }
                | AppError::Database(sea_orm::DbErr::Conn(_))
                | AppError::Database(sea_orm::DbErr::ConnectionAcquire(_))
        )
    }

    /// Errors reported at warning level; the run and usually the record go on
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AppError::MissingField { .. }
                | AppError::OrganizationNotFound { .. }
                | AppError::AuthorNotFound { .. }
        )
    }

    /// Helper for building an `Io` error with the offending path attached
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    /// Helper for building an `InvalidFormat` error
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidFormat {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
