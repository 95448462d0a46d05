//! Scheduled run service
//!
//! Everything a scheduled invocation does: run the relay, notify according
//! to the outcome, and give the daily report a chance to fire.

use chrono::Local;
use logrelay_core::domain::run::{ErrorInfo, RunResult, RunStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::config::Config;
use crate::repository::{ChatWebhook, CheckpointStore, EventCollector, LogSource};
use crate::service::filter::LogFilter;
use crate::service::forwarder::LogForwarder;
use crate::service::notifier::{Notifier, NotifyPolicy};
use crate::service::relay::{LogRelay, RelaySettings, RunError};
use crate::service::report::DailyReport;

/// Remote systems a scheduled run talks to
pub struct Collaborators {
    pub source: Arc<dyn LogSource>,
    pub collector: Arc<dyn EventCollector>,
    pub chat: Option<Arc<dyn ChatWebhook>>,
    pub store: Arc<dyn CheckpointStore>,
}

/// Handles scheduled invocations
pub struct ScheduledRun {
    relay: Arc<LogRelay>,
    notifier: Arc<Notifier>,
    report: Arc<DailyReport>,
    /// Held for the whole cycle so overlapping triggers run one after another
    running: Mutex<()>,
}

impl ScheduledRun {
    pub fn new(config: &Config, collaborators: Collaborators) -> Self {
        let relay = Arc::new(LogRelay::new(
            collaborators.source,
            LogForwarder::new(collaborators.collector),
            collaborators.store,
            LogFilter::new(config.log_types.iter().cloned(), config.log_level),
            RelaySettings {
                batch_size: config.batch_size,
                start_from: config.start_from.clone(),
                max_run_time: config.max_run_time,
            },
        ));

        let notifier = Arc::new(Notifier::new(
            collaborators.chat,
            NotifyPolicy {
                notify_on_success: config.slack_send_success,
            },
        ));

        let report = Arc::new(DailyReport::new(
            config.daily_report_time,
            Arc::clone(&relay),
            Arc::clone(&notifier),
        ));

        Self {
            relay,
            notifier,
            report,
            running: Mutex::new(()),
        }
    }

    /// Runs one cycle; the daily report check is detached
    pub async fn execute(&self) -> Result<RunResult, RunError> {
        let outcome = self.run_cycle().await;
        Arc::clone(&self.report).spawn();
        outcome
    }

    /// Runs one cycle and waits for the daily report check
    pub async fn execute_and_report(&self) -> Result<RunResult, RunError> {
        let outcome = self.run_cycle().await;
        self.report.send_if_due(Local::now()).await;
        outcome
    }

    async fn run_cycle(&self) -> Result<RunResult, RunError> {
        let _running = self.running.lock().await;

        info!("Scheduled run started");

        match self.relay.run().await {
            Ok(result) => {
                self.notifier
                    .notify_finished(&result.status, result.checkpoint.as_ref())
                    .await;
                Ok(result)
            }
            Err(e) => {
                error!("Scheduled run failed: {:#}", e);
                let status = RunStatus::failed(ErrorInfo::new(e.to_string()));
                self.notifier.notify_status(&status, None).await;
                Err(e)
            }
        }
    }
}
