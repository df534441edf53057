//! Startup connection bootstrap
//!
//! Opens the database with a bounded, exponentially backed-off retry loop
//! and reconciles the receipt schema before handing the pool out. The
//! retry exists for databases that come up alongside the service; a
//! failure here is fatal to startup.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use metrics::counter;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::{error, info, warn};

use super::{connect_options, DbPool};
use crate::config::DatabaseConfig;
use crate::db::models::ReceiptEntity;
use crate::errors::{AppError, Result};
use crate::metrics::METRICS_PREFIX;

/// Backoff schedule for bootstrap connection attempts
///
/// After failed attempt `i` (1-based) the loop waits `base^(i+1)` seconds.
/// No wait follows the final attempt.
#[derive(Debug, Clone)]
pub struct BootstrapBackoff {
    max_attempts: u32,
    base_secs: u64,
    failed: u32,
}

impl BootstrapBackoff {
    pub fn new(max_attempts: u32, base_secs: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_secs,
            failed: 0,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(config.connect_attempts, config.retry_base_secs)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait following failed attempt `attempt`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        Duration::from_secs(self.base_secs.saturating_pow(attempt + 1))
    }

    /// Total time spent waiting if the first `failures` attempts fail
    pub fn total_wait(&self, failures: u32) -> Duration {
        (1..=failures.min(self.max_attempts - 1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

impl Default for BootstrapBackoff {
    fn default() -> Self {
        Self::new(10, 2)
    }
}

impl Backoff for BootstrapBackoff {
    fn next_backoff(&mut self) -> Option<Duration> {
        self.failed += 1;
        if self.failed >= self.max_attempts {
            None
        } else {
            Some(self.delay_for_attempt(self.failed))
        }
    }

    fn reset(&mut self) {
        self.failed = 0;
    }
}

/// Run `connect` until it succeeds or the schedule is exhausted
///
/// Returns the last connection error wrapped in [`AppError::Bootstrap`]
/// once every attempt has failed.
pub async fn connect_with_retry<T, F, Fut>(policy: BootstrapBackoff, mut connect: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, DbErr>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempts = 0u32;

    let outcome = backoff::future::retry_notify(
        policy,
        || {
            attempts += 1;
            let attempt = attempts;
            counter!(format!("{}_db_connect_attempts_total", METRICS_PREFIX)).increment(1);
            let pending = connect();

            async move {
                pending.await.map_err(|e| {
                    warn!(attempt, max_attempts, error = %e, "Could not connect to database");
                    backoff::Error::transient(e)
                })
            }
        },
        |_: DbErr, wait: Duration| {
            warn!(wait_secs = wait.as_secs(), "Waiting before retrying database connection");
        },
    )
    .await;

    outcome.map_err(|source| {
        error!(attempts, error = %source, "Giving up on database connection");
        AppError::Bootstrap { attempts, source }
    })
}

/// Create the receipt table and its indexes when missing
pub async fn reconcile_schema(db: &DatabaseConnection) -> std::result::Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(ReceiptEntity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(ReceiptEntity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}

/// Connect with retry, reconcile the schema and return the ready pool
pub async fn bootstrap(config: &DatabaseConfig) -> Result<DbPool> {
    let options = connect_options(config);
    let policy = BootstrapBackoff::from_config(config);

    info!(max_attempts = policy.max_attempts(), "Connecting to database...");
    let conn = connect_with_retry(policy, || Database::connect(options.clone())).await?;
    let pool = DbPool::from_connection(conn);
    info!("Database connection established");

    if let Err(source) = reconcile_schema(pool.conn()).await {
        error!(error = %source, "Schema reconciliation failed, closing connection");
        if let Err(close_err) = pool.close().await {
            warn!(error = %close_err, "Failed to close database after schema error");
        }
        return Err(AppError::SchemaReconciliation { source });
    }

    info!("Receipt schema reconciled");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn refused() -> DbErr {
        DbErr::Custom("connection refused".into())
    }

    #[test]
    fn test_schedule_doubles() {
        let policy = BootstrapBackoff::default();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(8));
        assert_eq!(policy.delay_for_attempt(9), Duration::from_secs(1024));
        assert_eq!(policy.total_wait(3), Duration::from_secs(4 + 8 + 16));
    }

    #[test]
    fn test_backoff_stops_after_last_attempt() {
        let mut policy = BootstrapBackoff::default();
        let waits: Vec<_> = std::iter::from_fn(|| policy.next_backoff()).collect();
        assert_eq!(waits.len(), 9);
        assert_eq!(waits.last(), Some(&Duration::from_secs(1024)));

        policy.reset();
        assert_eq!(policy.next_backoff(), Some(Duration::from_secs(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = connect_with_retry(BootstrapBackoff::default(), || {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if call <= 3 { Err(refused()) } else { Ok(call) }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            start.elapsed().as_secs(),
            BootstrapBackoff::default().total_wait(3).as_secs()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_wait() {
        let start = Instant::now();
        let result = connect_with_retry(BootstrapBackoff::default(), || async { Ok::<_, DbErr>(()) }).await;

        tokio_test::assert_ok!(result);
        assert_eq!(start.elapsed().as_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_ten_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = connect_with_retry(BootstrapBackoff::default(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(refused()) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 10);
        match result {
            Err(AppError::Bootstrap { attempts, source }) => {
                assert_eq!(attempts, 10);
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("expected bootstrap error, got {:?}", other),
        }
        // 4 + 8 + ... + 1024, nothing after the tenth attempt
        assert_eq!(start.elapsed().as_secs(), 2044);
    }

    #[tokio::test]
    async fn test_bootstrap_creates_schema() {
        let pool = crate::db::test_support::memory_pool().await;

        // Reconciling an existing schema is a no-op
        tokio_test::assert_ok!(reconcile_schema(pool.conn()).await);
        tokio_test::assert_ok!(pool.ping().await);
    }

    #[tokio::test]
    async fn test_schema_failure_is_reported() {
        // An empty file is a valid SQLite database; opening it read-only
        // lets the connection succeed while table creation fails.
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut config =
            DatabaseConfig::with_url(format!("sqlite://{}?mode=ro", file.path().display()));
        config.max_connections = 1;
        config.connect_attempts = 1;

        let result = bootstrap(&config).await;
        assert!(matches!(result, Err(AppError::SchemaReconciliation { .. })));
    }
}
