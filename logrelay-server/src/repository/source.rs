//! Log source repository
//!
//! Where pages of tenant logs come from.

use async_trait::async_trait;
use logrelay_client::{ClientError, IdentityClient};
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::log::LogEntry;

/// Repository trait for paginated log retrieval
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetches up to `take` entries logged after `from`, oldest first
    ///
    /// # Arguments
    /// * `from` - Last acknowledged checkpoint, `None` to start from the oldest entry
    /// * `take` - Maximum page size
    async fn fetch_page(
        &self,
        from: Option<&Checkpoint>,
        take: usize,
    ) -> Result<Vec<LogEntry>, ClientError>;
}

#[async_trait]
impl LogSource for IdentityClient {
    async fn fetch_page(
        &self,
        from: Option<&Checkpoint>,
        take: usize,
    ) -> Result<Vec<LogEntry>, ClientError> {
        self.fetch_logs(from, take).await
    }
}
