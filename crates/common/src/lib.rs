//! Notarium Common Library
//!
//! Shared code for Notarium services including:
//! - Receipt entity and hash-keyed repository
//! - Database bootstrap with retry and schema reconciliation
//! - Request-scoped execution context
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod metrics;
pub mod proof;

// Re-export commonly used types
pub use errors::{AppError, Result};
pub use config::AppConfig;
pub use db::{DbPool, ReceiptRepository};
pub use db::models::Receipt;
pub use execution::ExecutionContext;
pub use proof::{AnchoredProof, Chainpoint};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
