//! Asset store backed by pre-registered named queries
//!
//! The checker never composes SQL of its own: it asks the store to run one
//! of two well-known named selections, and the store maps the name to a
//! registered query. The queries are the single source of truth for
//! membership in a transition class; keeping the two predicates disjoint is
//! their contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use media_expiry_core::{Asset, ExpiryError};
use sqlx::{Executor, PgPool, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Named query selecting assets whose expiration just became observable
pub const EXPIRING_ASSETS: &str = "expiring_assets";

/// Named query selecting assets that returned to a valid state
pub const UNEXPIRING_ASSETS: &str = "unexpiring_assets";

/// Registered SQL for a named query, or `None` for an unknown name
///
/// `$1` is the run's clock. Selecting against the caller's timestamp rather
/// than the transaction's `NOW()` keeps selection and predicate verification
/// on one clock, so an asset expiring between the two cannot be selected and
/// then fail its predicate check.
fn sql_for(query: &str) -> Option<&'static str> {
    match query {
        EXPIRING_ASSETS => Some(
            r#"
            SELECT id, title, expires_at, expired
            FROM assets
            WHERE expired = FALSE
              AND expires_at IS NOT NULL
              AND expires_at <= $1
            ORDER BY expires_at ASC
            "#,
        ),
        UNEXPIRING_ASSETS => Some(
            r#"
            SELECT id, title, expires_at, expired
            FROM assets
            WHERE expired = TRUE
              AND (expires_at IS NULL OR expires_at > $1)
            ORDER BY id ASC
            "#,
        ),
        _ => None,
    }
}

/// Store capability consumed by the checker
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Resolve a named query, failing with a configuration error when the
    /// name is unknown or the query definition is malformed. Read-only.
    async fn resolve(&self, query: &str) -> Result<(), ExpiryError>;

    /// Open the unit of work for one reconciliation run
    async fn begin(&self) -> Result<Box<dyn AssetSession>, ExpiryError>;
}

/// One transaction scope: both selections of a run execute here
#[async_trait]
pub trait AssetSession: Send {
    /// Run a named selection against the given clock and return the assets
    /// in store order
    async fn list(&mut self, query: &str, now: DateTime<Utc>) -> Result<Vec<Asset>, ExpiryError>;

    /// Commit the unit of work
    async fn commit(self: Box<Self>) -> Result<(), ExpiryError>;

    /// Roll back the unit of work
    async fn rollback(self: Box<Self>) -> Result<(), ExpiryError>;
}

/// PostgreSQL implementation of the asset store
pub struct PostgresAssetStore {
    pool: PgPool,
}

impl PostgresAssetStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the assets table if it doesn't exist
    pub async fn initialize_schema(&self) -> Result<(), ExpiryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS assets (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                title VARCHAR(255) NOT NULL,
                expires_at TIMESTAMPTZ,
                expired BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ExpiryError::Transaction(format!("Failed to create assets table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_assets_expired_expires_at
            ON assets(expired, expires_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ExpiryError::Transaction(format!("Failed to create assets index: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl AssetStore for PostgresAssetStore {
    async fn resolve(&self, query: &str) -> Result<(), ExpiryError> {
        debug!(query = query, "Resolving named query");

        let sql = sql_for(query).ok_or_else(|| {
            ExpiryError::configuration_for(query, format!("Named query '{}' is not registered", query))
        })?;

        // Server-side prepare validates the query definition without
        // executing it.
        self.pool.prepare(sql).await.map_err(|e| {
            ExpiryError::configuration_for(
                query,
                format!("Named query '{}' failed to prepare: {}", query, e),
            )
        })?;

        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn AssetSession>, ExpiryError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ExpiryError::Transaction(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresAssetSession { tx }))
    }
}

/// One Postgres transaction wrapping a reconciliation run
struct PostgresAssetSession {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AssetSession for PostgresAssetSession {
    async fn list(&mut self, query: &str, now: DateTime<Utc>) -> Result<Vec<Asset>, ExpiryError> {
        let sql = sql_for(query)
            .ok_or_else(|| ExpiryError::query(query, "named query is not registered"))?;

        let assets = sqlx::query_as::<_, Asset>(sql)
            .bind(now)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| ExpiryError::query(query, e.to_string()))?;

        Ok(assets)
    }

    async fn commit(self: Box<Self>) -> Result<(), ExpiryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| ExpiryError::Transaction(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<(), ExpiryError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| ExpiryError::Transaction(format!("Failed to roll back transaction: {}", e)))
    }
}

/// Scriptable in-memory store for tests and local development
///
/// Results are registered per named query; `fail_query` and `drop_query`
/// simulate execution and resolution failures.
#[derive(Default)]
pub struct InMemoryAssetStore {
    inner: Arc<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    results: tokio::sync::Mutex<HashMap<String, Vec<Asset>>>,
    failing: tokio::sync::Mutex<HashSet<String>>,
    dropped: tokio::sync::Mutex<HashSet<String>>,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl InMemoryAssetStore {
    /// Store with both well-known queries registered and empty
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the assets a named query returns, in order
    pub async fn set_assets(&self, query: &str, assets: Vec<Asset>) {
        self.inner
            .results
            .lock()
            .await
            .insert(query.to_string(), assets);
    }

    /// Make a named query fail at execution time
    pub async fn fail_query(&self, query: &str) {
        self.inner.failing.lock().await.insert(query.to_string());
    }

    /// Make a named query unresolvable, as if it were never registered
    pub async fn drop_query(&self, query: &str) {
        self.inner.dropped.lock().await.insert(query.to_string());
    }

    /// Number of committed sessions
    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Number of rolled back sessions
    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn resolve(&self, query: &str) -> Result<(), ExpiryError> {
        if sql_for(query).is_none() || self.inner.dropped.lock().await.contains(query) {
            return Err(ExpiryError::configuration_for(
                query,
                format!("Named query '{}' is not registered", query),
            ));
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn AssetSession>, ExpiryError> {
        // Snapshot at session start: repeatable reads within one run
        let results = self.inner.results.lock().await.clone();
        let failing = self.inner.failing.lock().await.clone();

        Ok(Box::new(InMemoryAssetSession {
            results,
            failing,
            state: self.inner.clone(),
        }))
    }
}

struct InMemoryAssetSession {
    results: HashMap<String, Vec<Asset>>,
    failing: HashSet<String>,
    state: Arc<InMemoryState>,
}

#[async_trait]
impl AssetSession for InMemoryAssetSession {
    async fn list(&mut self, query: &str, _now: DateTime<Utc>) -> Result<Vec<Asset>, ExpiryError> {
        if self.failing.contains(query) {
            return Err(ExpiryError::query(query, "simulated query failure"));
        }

        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn commit(self: Box<Self>) -> Result<(), ExpiryError> {
        self.state.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), ExpiryError> {
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
