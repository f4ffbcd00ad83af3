//! Scholar Harvest Common Library
//!
//! Shared code for the harvest tools including:
//! - Crawled record types, cleaning and validation
//! - Database models and the reconciliation repository
//! - Error types and handling
//! - Configuration management
//! - Metrics

pub mod config;
pub mod db;
pub mod errors;
pub mod metrics;
pub mod records;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{DbPool, Repository, Upserted};
pub use errors::{AppError, Result};
pub use records::{Record, RecordKind};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
