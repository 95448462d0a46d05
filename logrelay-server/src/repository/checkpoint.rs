//! Checkpoint repository
//!
//! Persists the last acknowledged checkpoint together with a short history
//! of run statuses (read back by the daily report).

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::run::RunStatus;
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Mutex;

/// Run statuses older than this are pruned on every save
const HISTORY_RETENTION_DAYS: i64 = 7;

/// Repository trait for checkpoint persistence
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Loads the last stored checkpoint, if any
    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>>;

    /// Stores the checkpoint of a batch the collector has accepted
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Stores the checkpoint reached by a run along with its status
    async fn save_run(&self, checkpoint: Option<&Checkpoint>, status: &RunStatus) -> Result<()>;

    /// Returns the run statuses that ended within `[start, end]`
    async fn runs_between(&self, start: DateTime<Utc>, end: DateTime<Utc>)
    -> Result<Vec<RunStatus>>;
}

// =============================================================================
// In-memory store
// =============================================================================

#[derive(Debug, Default)]
struct MemoryState {
    checkpoint: Option<Checkpoint>,
    runs: Vec<RunStatus>,
}

/// Process-local store; progress is lost on restart
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    state: Mutex<MemoryState>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        Ok(self.lock().checkpoint.clone())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.lock().checkpoint = Some(checkpoint.clone());
        Ok(())
    }

    async fn save_run(&self, checkpoint: Option<&Checkpoint>, status: &RunStatus) -> Result<()> {
        let cutoff = Utc::now() - Duration::days(HISTORY_RETENTION_DAYS);
        let mut state = self.lock();

        state.checkpoint = checkpoint.cloned();
        state.runs.push(status.clone());
        state
            .runs
            .retain(|run| run.end.unwrap_or(run.start) >= cutoff);

        Ok(())
    }

    async fn runs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RunStatus>> {
        Ok(self
            .lock()
            .runs
            .iter()
            .filter(|run| run.end.is_some_and(|ended| ended >= start && ended <= end))
            .cloned()
            .collect())
    }
}

// =============================================================================
// Postgres store
// =============================================================================

/// Postgres-backed store (tables created by `db::run_migrations`)
#[derive(Debug, Clone)]
pub struct PgCheckpointStore {
    pool: PgPool,
}

impl PgCheckpointStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT checkpoint FROM relay_checkpoint WHERE id = 1")
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load checkpoint")?;

        Ok(row.and_then(|(checkpoint,)| checkpoint).map(Checkpoint::new))
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        upsert_checkpoint(&self.pool, Some(checkpoint))
            .await
            .context("Failed to store checkpoint")
    }

    async fn save_run(&self, checkpoint: Option<&Checkpoint>, status: &RunStatus) -> Result<()> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        upsert_checkpoint(&mut *tx, checkpoint)
            .await
            .context("Failed to store checkpoint")?;

        sqlx::query(
            r#"
            INSERT INTO relay_runs (started_at, ended_at, status)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(status.start)
        .bind(status.end.unwrap_or(now))
        .bind(Json(status))
        .execute(&mut *tx)
        .await
        .context("Failed to store run status")?;

        sqlx::query("DELETE FROM relay_runs WHERE ended_at < $1")
            .bind(now - Duration::days(HISTORY_RETENTION_DAYS))
            .execute(&mut *tx)
            .await
            .context("Failed to prune run history")?;

        tx.commit().await.context("Failed to commit run")?;

        Ok(())
    }

    async fn runs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RunStatus>> {
        let rows: Vec<(Json<RunStatus>,)> = sqlx::query_as(
            r#"
            SELECT status
            FROM relay_runs
            WHERE ended_at >= $1 AND ended_at <= $2
            ORDER BY ended_at ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load run history")?;

        Ok(rows.into_iter().map(|(Json(status),)| status).collect())
    }
}

async fn upsert_checkpoint<'e, E>(executor: E, checkpoint: Option<&Checkpoint>) -> sqlx::Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO relay_checkpoint (id, checkpoint, updated_at)
        VALUES (1, $1, $2)
        ON CONFLICT (id) DO UPDATE
        SET checkpoint = EXCLUDED.checkpoint, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(checkpoint.map(Checkpoint::as_str))
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(())
}
