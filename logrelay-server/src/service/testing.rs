//! Test doubles for the repository traits

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use logrelay_client::{ClientError, SlackMessage};
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::log::LogEntry;
use logrelay_core::domain::run::RunStatus;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::{Config, test_config};
use crate::repository::{ChatWebhook, CheckpointStore, EventCollector, LogSource};
use crate::service::filter::LogFilter;
use crate::service::forwarder::LogForwarder;
use crate::service::notifier::{Notifier, NotifyPolicy};
use crate::service::relay::{LogRelay, RelaySettings};
use crate::service::report::{DailyReport, ReportTime};
use crate::service::scheduled::{Collaborators, ScheduledRun};

pub fn entries(ids: &[&str]) -> Vec<LogEntry> {
    ids.iter()
        .map(|id| LogEntry::new(json!({ "log_id": id, "type": "s" })))
        .collect()
}

pub fn typed_entries(pairs: &[(&str, &str)]) -> Vec<LogEntry> {
    pairs
        .iter()
        .map(|(id, log_type)| LogEntry::new(json!({ "log_id": id, "type": log_type })))
        .collect()
}

/// A fixed local wall-clock time on an ordinary winter day
pub fn at_local(hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 1, 15, hour, minute, 0)
        .earliest()
        .expect("valid local time")
}

// =============================================================================
// Log source
// =============================================================================

#[derive(Default)]
pub struct MockSource {
    pages: Mutex<VecDeque<Result<Vec<LogEntry>, ClientError>>>,
    calls: Mutex<Vec<(Option<Checkpoint>, usize)>>,
    delay: Mutex<Option<Duration>>,
}

impl MockSource {
    pub fn with_pages(pages: Vec<Vec<LogEntry>>) -> Self {
        let source = Self::default();
        for page in pages {
            source.push_page(page);
        }
        source
    }

    pub fn push_page(&self, page: Vec<LogEntry>) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_error(&self, error: ClientError) {
        self.pages.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<(Option<Checkpoint>, usize)> {
        self.calls.lock().unwrap().clone()
    }

    /// Every fetch sleeps this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl LogSource for MockSource {
    async fn fetch_page(
        &self,
        from: Option<&Checkpoint>,
        take: usize,
    ) -> Result<Vec<LogEntry>, ClientError> {
        self.calls.lock().unwrap().push((from.cloned(), take));
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.pages.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }
}

// =============================================================================
// Collector
// =============================================================================

#[derive(Default)]
pub struct MockCollector {
    queue: Mutex<Vec<LogEntry>>,
    sent: Mutex<Vec<LogEntry>>,
    flushes: Mutex<usize>,
    /// Number of flushes that succeed before every further flush fails
    fail_after: Mutex<Option<usize>>,
}

impl MockCollector {
    pub fn failing() -> Self {
        let collector = Self::default();
        collector.fail_after(0);
        collector
    }

    pub fn fail_after(&self, successes: usize) {
        *self.fail_after.lock().unwrap() = Some(successes);
    }

    /// Entries queued across all flushes, in order
    pub fn sent(&self) -> Vec<LogEntry> {
        self.sent.lock().unwrap().clone()
    }

    pub fn flushes(&self) -> usize {
        *self.flushes.lock().unwrap()
    }
}

#[async_trait]
impl EventCollector for MockCollector {
    fn send(&self, entry: &LogEntry) {
        self.queue.lock().unwrap().push(entry.clone());
        self.sent.lock().unwrap().push(entry.clone());
    }

    async fn flush(&self) -> Result<String, ClientError> {
        let queued = std::mem::take(&mut *self.queue.lock().unwrap());
        let mut flushes = self.flushes.lock().unwrap();
        let previous = *flushes;
        *flushes += 1;

        match *self.fail_after.lock().unwrap() {
            Some(successes) if previous >= successes => {
                Err(ClientError::api_error(503, "Service Unavailable"))
            }
            _ => Ok(format!(r#"{{"text":"Success","code":0,"events":{}}}"#, queued.len())),
        }
    }
}

// =============================================================================
// Chat
// =============================================================================

#[derive(Default)]
pub struct MockChat {
    messages: Mutex<Vec<SlackMessage>>,
    attempts: Mutex<usize>,
    fail: AtomicBool,
}

impl MockChat {
    pub fn failing() -> Self {
        let chat = Self::default();
        chat.fail.store(true, Ordering::SeqCst);
        chat
    }

    pub fn messages(&self) -> Vec<SlackMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Messages other than daily reports
    pub fn status_messages(&self) -> Vec<SlackMessage> {
        self.messages()
            .into_iter()
            .filter(|m| !m.attachments.iter().any(|a| a.text.contains("Daily Report")))
            .collect()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ChatWebhook for MockChat {
    async fn post(&self, message: &SlackMessage) -> Result<(), ClientError> {
        *self.attempts.lock().unwrap() += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::api_error(500, "rollup_error"));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// Checkpoint store
// =============================================================================

#[derive(Default)]
pub struct MockStore {
    checkpoint: Mutex<Option<Checkpoint>>,
    runs: Mutex<Vec<RunStatus>>,
    fail_reads: AtomicBool,
}

impl MockStore {
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.checkpoint.lock().unwrap().clone()
    }

    pub fn set_checkpoint(&self, checkpoint: Checkpoint) {
        *self.checkpoint.lock().unwrap() = Some(checkpoint);
    }

    pub fn runs(&self) -> Vec<RunStatus> {
        self.runs.lock().unwrap().clone()
    }

    pub fn push_run(&self, status: RunStatus) {
        self.runs.lock().unwrap().push(status);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> anyhow::Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("connection to checkpoint store lost"));
        }
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MockStore {
    async fn load_checkpoint(&self) -> anyhow::Result<Option<Checkpoint>> {
        self.check_reads()?;
        Ok(self.checkpoint())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        self.set_checkpoint(checkpoint.clone());
        Ok(())
    }

    async fn save_run(
        &self,
        checkpoint: Option<&Checkpoint>,
        status: &RunStatus,
    ) -> anyhow::Result<()> {
        *self.checkpoint.lock().unwrap() = checkpoint.cloned();
        self.push_run(status.clone());
        Ok(())
    }

    async fn runs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<RunStatus>> {
        self.check_reads()?;
        Ok(self
            .runs()
            .into_iter()
            .filter(|run| run.end.is_some_and(|e| e >= start && e <= end))
            .collect())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Mocks plus a mutable config, wired into real services on demand
pub struct Harness {
    pub config: Config,
    pub source: Arc<MockSource>,
    pub collector: Arc<MockCollector>,
    pub chat: Arc<MockChat>,
    pub store: Arc<MockStore>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            config: test_config(),
            source: Arc::new(MockSource::default()),
            collector: Arc::new(MockCollector::default()),
            chat: Arc::new(MockChat::default()),
            store: Arc::new(MockStore::default()),
        }
    }

    pub fn relay(&self) -> LogRelay {
        LogRelay::new(
            self.source.clone(),
            LogForwarder::new(self.collector.clone()),
            self.store.clone(),
            LogFilter::new(self.config.log_types.iter().cloned(), self.config.log_level),
            RelaySettings {
                batch_size: self.config.batch_size,
                start_from: self.config.start_from.clone(),
                max_run_time: self.config.max_run_time,
            },
        )
    }

    pub fn relay_with_batch_size(&self, batch_size: usize) -> LogRelay {
        let mut harness = self.clone_handles();
        harness.config.batch_size = batch_size;
        harness.relay()
    }

    pub fn notifier(&self) -> Notifier {
        Notifier::new(
            Some(self.chat.clone() as Arc<dyn ChatWebhook>),
            NotifyPolicy {
                notify_on_success: self.config.slack_send_success,
            },
        )
    }

    pub fn daily_report(&self, report_time: Option<ReportTime>) -> DailyReport {
        DailyReport::new(
            report_time,
            Arc::new(self.relay()),
            Arc::new(self.notifier()),
        )
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            source: self.source.clone(),
            collector: self.collector.clone(),
            chat: Some(self.chat.clone() as Arc<dyn ChatWebhook>),
            store: self.store.clone(),
        }
    }

    pub fn scheduled(&self) -> ScheduledRun {
        ScheduledRun::new(&self.config, self.collaborators())
    }

    fn clone_handles(&self) -> Self {
        Self {
            config: self.config.clone(),
            source: Arc::clone(&self.source),
            collector: Arc::clone(&self.collector),
            chat: Arc::clone(&self.chat),
            store: Arc::clone(&self.store),
        }
    }
}
