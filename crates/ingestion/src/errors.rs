//! Ingestion error types

use harvest_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Cannot read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Input {path} is neither a JSON array nor JSON lines: {message}")]
    InputFormat { path: String, message: String },

    #[error("Sink {sink} failed: {source}")]
    Sink {
        sink: &'static str,
        #[source]
        source: AppError,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
