//! Report domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::checkpoint::Checkpoint;
use crate::domain::run::RunStatus;

/// Aggregate of the runs that ended inside a time range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub processed: u64,
    pub warnings: u64,
    pub errors: u64,
    pub checkpoint: Option<Checkpoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Report,
}

impl Report {
    /// Folds stored run statuses into a report
    ///
    /// Only statuses whose `end` falls inside `[start, end]` are counted.
    pub fn aggregate<'a>(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: impl IntoIterator<Item = &'a RunStatus>,
        checkpoint: Option<Checkpoint>,
    ) -> Self {
        let mut report = Self {
            kind: ReportKind::Report,
            start,
            end,
            processed: 0,
            warnings: 0,
            errors: 0,
            checkpoint,
        };

        for status in statuses {
            let Some(ended) = status.end else {
                continue;
            };
            if ended < start || ended > end {
                continue;
            }

            report.processed += status.logs_processed;
            if status.warning.is_some() {
                report.warnings += 1;
            }
            if status.error.is_some() {
                report.errors += 1;
            }
        }

        report
    }
}
