//! Notifier service
//!
//! Renders run statuses and daily reports as Slack messages. Delivery is
//! best-effort: failures are logged and never surface to the caller.

use chrono::{DateTime, Utc};
use logrelay_client::{SlackAttachment, SlackField, SlackMessage};
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::report::Report;
use logrelay_core::domain::run::RunStatus;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::repository::ChatWebhook;

const USERNAME: &str = "auth0-logs-to-splunk";
const TITLE: &str = "Logs To Splunk";
const COLOR_SUCCESS: &str = "#7CD197";
const COLOR_ERROR: &str = "#F35A00";

/// When a finished run deserves a message
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyPolicy {
    pub notify_on_success: bool,
}

impl NotifyPolicy {
    /// Errors always notify; successes only when opted in
    pub fn should_notify(&self, status: &RunStatus) -> bool {
        status.is_error() || self.notify_on_success
    }
}

/// Posts status and report messages to the team channel
pub struct Notifier {
    webhook: Option<Arc<dyn ChatWebhook>>,
    policy: NotifyPolicy,
}

impl Notifier {
    pub fn new(webhook: Option<Arc<dyn ChatWebhook>>, policy: NotifyPolicy) -> Self {
        Self { webhook, policy }
    }

    /// Posts a run status unconditionally
    pub async fn notify_status(&self, status: &RunStatus, checkpoint: Option<&Checkpoint>) {
        self.post(&status_message(status, checkpoint)).await;
    }

    /// Posts a run status if the policy asks for it
    pub async fn notify_finished(&self, status: &RunStatus, checkpoint: Option<&Checkpoint>) {
        if self.policy.should_notify(status) {
            self.notify_status(status, checkpoint).await;
        } else {
            debug!("Run succeeded, success notifications are disabled");
        }
    }

    /// Posts a daily report
    pub async fn notify_report(&self, report: &Report) {
        self.post(&report_message(report)).await;
    }

    async fn post(&self, message: &SlackMessage) {
        let Some(webhook) = &self.webhook else {
            debug!("No chat webhook configured, dropping notification");
            return;
        };

        if let Err(e) = webhook.post(message).await {
            warn!("Failed to send chat notification: {}", e);
        }
    }
}

// =============================================================================
// Message rendering
// =============================================================================

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "n/a".to_string())
}

fn format_checkpoint(checkpoint: Option<&Checkpoint>) -> String {
    checkpoint
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string())
}

pub fn status_message(status: &RunStatus, checkpoint: Option<&Checkpoint>) -> SlackMessage {
    let (outcome, color) = if status.is_error() {
        ("Error", COLOR_ERROR)
    } else {
        ("Success", COLOR_SUCCESS)
    };
    let text = format!("{} - {}", TITLE, outcome);

    let mut fields = vec![
        SlackField::new("Start", status.start.to_rfc3339(), true),
        SlackField::new("End", format_time(status.end), true),
        SlackField::new("Logs processed", status.logs_processed.to_string(), true),
        SlackField::new("Next checkpoint", format_checkpoint(checkpoint), true),
    ];

    if let Some(warning) = &status.warning {
        fields.push(SlackField::new("Warning", warning.clone(), false));
    }
    if let Some(error) = &status.error {
        fields.push(SlackField::new("Error", error.to_string(), false));
    }

    SlackMessage {
        username: USERNAME.to_string(),
        text: TITLE.to_string(),
        attachments: vec![SlackAttachment {
            color: color.to_string(),
            fallback: text.clone(),
            text,
            fields,
        }],
    }
}

pub fn report_message(report: &Report) -> SlackMessage {
    let text = format!("{} - Daily Report", TITLE);
    let color = if report.errors > 0 {
        COLOR_ERROR
    } else {
        COLOR_SUCCESS
    };

    SlackMessage {
        username: USERNAME.to_string(),
        text: TITLE.to_string(),
        attachments: vec![SlackAttachment {
            color: color.to_string(),
            fallback: text.clone(),
            text,
            fields: vec![
                SlackField::new("Logs processed", report.processed.to_string(), true),
                SlackField::new("Warnings", report.warnings.to_string(), true),
                SlackField::new("Errors", report.errors.to_string(), true),
                SlackField::new(
                    "Next checkpoint",
                    format_checkpoint(report.checkpoint.as_ref()),
                    true,
                ),
            ],
        }],
    }
}
