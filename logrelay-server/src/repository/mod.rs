//! Repository layer
//!
//! Thin trait seams over everything the relay reads from or writes to:
//! the identity provider's log API, the log collector, the chat webhook and
//! the checkpoint store. Services depend on the traits only, so each remote
//! system can be replaced by a test double.

mod chat;
mod checkpoint;
mod collector;
mod source;

// Re-export traits
pub use chat::ChatWebhook;
pub use checkpoint::CheckpointStore;
pub use collector::EventCollector;
pub use source::LogSource;

// Re-export implementations
pub use checkpoint::{MemoryCheckpointStore, PgCheckpointStore};
