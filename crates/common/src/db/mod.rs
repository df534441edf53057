//! Database layer for Notarium
//!
//! Provides:
//! - SeaORM entity models
//! - Connection bootstrap with retry and schema reconciliation
//! - Receipt repository

pub mod models;
mod bootstrap;
mod repository;

pub use bootstrap::{bootstrap, connect_with_retry, reconcile_schema, BootstrapBackoff};
pub use repository::ReceiptRepository;

use crate::config::DatabaseConfig;
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, DatabaseConnection};
use std::time::Duration;

/// Shared database handle
///
/// Cloning is cheap; all clones share the same underlying pool.
#[derive(Clone, Debug)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Wrap an already established connection
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::storage("ping", None, e))?;

        Ok(())
    }

    /// Close every connection in the pool
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| AppError::storage("close", None, e))
    }
}

/// Build sea-orm connect options from configuration
pub(crate) fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut opts = ConnectOptions::new(&config.url);
    opts.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .sqlx_logging(config.sqlx_logging);
    opts
}
