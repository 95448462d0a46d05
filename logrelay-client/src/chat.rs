//! Slack incoming-webhook client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::handle_text_response;

/// Default webhook timeout.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Message posted to an incoming webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub username: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackAttachment {
    pub color: String,
    pub fallback: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SlackField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

impl SlackField {
    pub fn new(title: impl Into<String>, value: impl Into<String>, short: bool) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            short,
        }
    }
}

/// HTTP client for a single Slack incoming webhook
#[derive(Debug, Clone)]
pub struct SlackClient {
    hook_url: String,
    client: Client,
}

impl SlackClient {
    pub fn new(hook_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            hook_url: hook_url.into(),
            client,
        }
    }

    /// Post one message to the webhook
    pub async fn send(&self, message: &SlackMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.hook_url)
            .json(message)
            .send()
            .await?;

        handle_text_response(response).await.map(|_| ())
    }
}
