//! Chat webhook repository

use async_trait::async_trait;
use logrelay_client::{ClientError, SlackClient, SlackMessage};

/// Repository trait for posting messages to the team channel
#[async_trait]
pub trait ChatWebhook: Send + Sync {
    async fn post(&self, message: &SlackMessage) -> Result<(), ClientError>;
}

#[async_trait]
impl ChatWebhook for SlackClient {
    async fn post(&self, message: &SlackMessage) -> Result<(), ClientError> {
        self.send(message).await
    }
}
