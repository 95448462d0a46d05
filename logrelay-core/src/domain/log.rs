//! Log domain types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::checkpoint::Checkpoint;

/// A tenant log entry as returned by the identity provider
///
/// The record is forwarded verbatim; only a couple of read-only accessors
/// are needed locally (checkpointing and type filtering).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry(Value);

impl LogEntry {
    pub fn new(record: Value) -> Self {
        Self(record)
    }

    /// Id used as the checkpoint once this entry is acknowledged
    pub fn id(&self) -> Option<&str> {
        self.0
            .get("log_id")
            .or_else(|| self.0.get("_id"))
            .and_then(Value::as_str)
    }

    /// Identity provider event type code (e.g. "s", "f", "sapi")
    pub fn log_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn checkpoint(&self) -> Option<Checkpoint> {
        self.id().map(Checkpoint::new)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}
