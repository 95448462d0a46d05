//! Relay service
//!
//! Drives one fetch-and-forward cycle. Pages are pulled lazily from the log
//! source, filtered, forwarded, and only then acknowledged; the checkpoint
//! stored at the end never runs ahead of what the collector accepted.

use chrono::{DateTime, Utc};
use logrelay_client::ClientError;
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::log::LogEntry;
use logrelay_core::domain::report::Report;
use logrelay_core::domain::run::{RunResult, RunStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::repository::{CheckpointStore, LogSource};
use crate::service::filter::LogFilter;
use crate::service::forwarder::LogForwarder;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum RunError {
    /// Identity provider could not be reached or refused the request
    #[error("Failed to fetch logs: {0}")]
    Fetch(#[from] ClientError),

    /// Checkpoint store could not be read or written
    #[error("Checkpoint store error: {0:#}")]
    Store(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RunError>;

/// One page of entries together with the checkpoint that acknowledges it
#[derive(Debug)]
pub struct Batch {
    pub entries: Vec<LogEntry>,
    /// Checkpoint to commit once this batch is forwarded
    pub checkpoint: Option<Checkpoint>,
    /// Whether the source returned a short page (nothing more to read)
    pub last: bool,
}

/// Lazy, finite sequence of pages starting at a checkpoint
///
/// The cursor only advances its read position; committing a checkpoint is
/// the caller's job once a batch has been delivered.
pub struct PageCursor<'a> {
    source: &'a dyn LogSource,
    position: Option<Checkpoint>,
    take: usize,
    exhausted: bool,
}

impl<'a> PageCursor<'a> {
    pub fn new(source: &'a dyn LogSource, from: Option<Checkpoint>, take: usize) -> Self {
        Self {
            source,
            position: from,
            take,
            exhausted: false,
        }
    }

    /// Fetches the next page, `None` once the source is drained
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.exhausted {
            return Ok(None);
        }

        let entries = self
            .source
            .fetch_page(self.position.as_ref(), self.take)
            .await?;

        if entries.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        let last = entries.len() < self.take;
        let checkpoint = entries
            .iter()
            .rev()
            .find_map(LogEntry::checkpoint)
            .or_else(|| self.position.clone());

        self.position = checkpoint.clone();
        self.exhausted = last;

        Ok(Some(Batch {
            entries,
            checkpoint,
            last,
        }))
    }
}

/// Relay settings taken from [`crate::config::Config`]
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub batch_size: usize,
    pub start_from: Option<Checkpoint>,
    pub max_run_time: Duration,
}

/// Runs fetch-and-forward cycles and builds reports from their history
pub struct LogRelay {
    source: Arc<dyn LogSource>,
    forwarder: LogForwarder,
    store: Arc<dyn CheckpointStore>,
    filter: LogFilter,
    settings: RelaySettings,
}

impl LogRelay {
    pub fn new(
        source: Arc<dyn LogSource>,
        forwarder: LogForwarder,
        store: Arc<dyn CheckpointStore>,
        filter: LogFilter,
        settings: RelaySettings,
    ) -> Self {
        Self {
            source,
            forwarder,
            store,
            filter,
            settings,
        }
    }

    /// Performs one cycle
    ///
    /// Forwarding failures end the cycle early but still produce a result
    /// (with `status.error` set). Only source and store failures are fatal.
    pub async fn run(&self) -> Result<RunResult> {
        let started = Instant::now();
        let mut status = RunStatus::started(Utc::now());

        let stored = self
            .store
            .load_checkpoint()
            .await
            .map_err(RunError::Store)?;
        let mut committed = stored.or_else(|| self.settings.start_from.clone());

        info!(
            "Starting log relay from checkpoint {}",
            committed.as_ref().map(Checkpoint::as_str).unwrap_or("<none>")
        );

        let mut cursor = PageCursor::new(
            self.source.as_ref(),
            committed.clone(),
            self.settings.batch_size,
        );

        loop {
            if started.elapsed() >= self.settings.max_run_time {
                warn!(
                    "Run time limit of {:?} reached, stopping early",
                    self.settings.max_run_time
                );
                status.warning = Some(format!(
                    "Run time limit of {}s reached, remaining logs will be processed on the next run",
                    self.settings.max_run_time.as_secs()
                ));
                break;
            }

            let Some(batch) = cursor.next_batch().await? else {
                debug!("No more logs available");
                break;
            };

            let forwardable = self.filter.apply(&batch.entries);
            debug!(
                "Page of {} entries, {} after filtering",
                batch.entries.len(),
                forwardable.len()
            );

            if let Err(failure) = self.forwarder.forward(&forwardable).await {
                warn!("Forwarding failed, stopping run: {}", failure);
                status.error = Some(failure.into_error_info());
                break;
            }

            status.logs_processed += forwardable.len() as u64;
            committed = batch.checkpoint;

            // Persist now so a fatal error on a later page keeps this progress
            if let Some(checkpoint) = &committed {
                self.store
                    .save_checkpoint(checkpoint)
                    .await
                    .map_err(RunError::Store)?;
            }

            if batch.last {
                break;
            }
        }

        status.end = Some(Utc::now());
        status.checkpoint = committed.clone();

        self.store
            .save_run(committed.as_ref(), &status)
            .await
            .map_err(RunError::Store)?;

        info!(
            "Run finished: {} logs processed, checkpoint {}",
            status.logs_processed,
            committed.as_ref().map(Checkpoint::as_str).unwrap_or("<none>")
        );

        Ok(RunResult {
            status,
            checkpoint: committed,
        })
    }

    /// Aggregates the runs that ended in `[start, end]`
    pub async fn report(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Report> {
        let runs = self
            .store
            .runs_between(start, end)
            .await
            .map_err(RunError::Store)?;
        let checkpoint = self
            .store
            .load_checkpoint()
            .await
            .map_err(RunError::Store)?;

        Ok(Report::aggregate(start, end, &runs, checkpoint))
    }
}
