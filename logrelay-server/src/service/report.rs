//! Daily report service
//!
//! Once a day, inside a five-minute slot, summarises the previous 24 hours
//! of runs and posts the summary to chat. The slot is wide so a scheduler
//! that does not fire exactly on the minute still hits it.

use chrono::{DateTime, Duration, Local, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::service::notifier::Notifier;
use crate::service::relay::LogRelay;

/// Width of the trigger slot in minutes
const REPORT_WINDOW_MINUTES: u32 = 5;

/// Configured `HH:MM` slot for the daily report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTime {
    pub hour: u32,
    pub minute: u32,
}

impl Default for ReportTime {
    fn default() -> Self {
        Self {
            hour: 16,
            minute: 0,
        }
    }
}

impl ReportTime {
    /// Parses `H:M` / `HH:MM`; anything else yields `None`
    pub fn parse(value: &str) -> Option<Self> {
        let (hour, minute) = value.trim().split_once(':')?;
        if hour.is_empty()
            || minute.is_empty()
            || !hour.bytes().all(|b| b.is_ascii_digit())
            || !minute.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        Some(Self {
            hour: hour.parse().ok()?,
            minute: minute.parse().ok()?,
        })
    }

    /// Whether a wall-clock `hour:minute` falls in `[HH:MM, HH:MM+5)`
    ///
    /// The slot does not carry over into the next hour.
    pub fn contains(&self, hour: u32, minute: u32) -> bool {
        hour == self.hour && minute >= self.minute && minute < self.minute + REPORT_WINDOW_MINUTES
    }
}

/// Sends the daily report when an invocation lands in the report slot
pub struct DailyReport {
    report_time: Option<ReportTime>,
    relay: Arc<LogRelay>,
    notifier: Arc<Notifier>,
}

impl DailyReport {
    pub fn new(report_time: Option<ReportTime>, relay: Arc<LogRelay>, notifier: Arc<Notifier>) -> Self {
        Self {
            report_time,
            relay,
            notifier,
        }
    }

    /// Whether the local time `now` is inside the configured slot
    pub fn is_due(&self, now: &DateTime<Local>) -> bool {
        self.report_time
            .is_some_and(|slot| slot.contains(now.hour(), now.minute()))
    }

    /// Sends the report if `now` is inside the slot
    ///
    /// Returns whether a report was attempted. Failures are logged and never
    /// reach the caller.
    pub async fn send_if_due(&self, now: DateTime<Local>) -> bool {
        if !self.is_due(&now) {
            debug!("Outside daily report window");
            return false;
        }

        let end = now.with_timezone(&Utc);
        let start = end - Duration::hours(24);

        info!("Sending daily report for {} - {}", start, end);

        match self.relay.report(start, end).await {
            Ok(report) => self.notifier.notify_report(&report).await,
            Err(e) => warn!("Failed to build daily report: {:#}", e),
        }

        true
    }

    /// Runs the check on a detached task so the caller is never delayed
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<bool> {
        tokio::spawn(async move { self.send_if_due(Local::now()).await })
    }
}
