//! Storage traits - Abstract interface for checkpoint persistence
//!
//! The verification engine reads checkpoints and writes submission logs and
//! progress through [`CheckpointStore`]. Implementations:
//! - `PgCheckpointStore`: PostgreSQL via sqlx
//! - `InMemoryCheckpointStore`: process-local, for tests and offline runs

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::types::{Checkpoint, UserCheckpointLog, UserCheckpointProgress};
use crate::error::Result;

/// Persistence seam of the verification engine
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Get the backend ID
    fn id(&self) -> &str;

    /// Look up a checkpoint by ID
    async fn get_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>>;

    /// All checkpoints of a chapter
    async fn list_checkpoints(&self, chapter_id: &str) -> Result<Vec<Checkpoint>>;

    /// Insert or replace a checkpoint
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()>;

    /// Append one submission record
    async fn append_log(
        &self,
        user_id: &str,
        checkpoint_id: &str,
        answer: &str,
        is_correct: bool,
    ) -> Result<UserCheckpointLog>;

    /// Submission records for a pair, oldest first
    async fn list_logs(&self, user_id: &str, checkpoint_id: &str) -> Result<Vec<UserCheckpointLog>>;

    /// Progress row for a pair, if any
    async fn get_progress(&self, user_id: &str, checkpoint_id: &str) -> Result<Option<UserCheckpointProgress>>;

    /// Atomically mark a pair completed unless it already is.
    ///
    /// Returns `true` when this call flipped the flag.
    async fn mark_completed(&self, user_id: &str, checkpoint_id: &str, at: DateTime<Utc>) -> Result<bool>;

    /// Whether the user completed any checkpoint of the chapter
    async fn chapter_has_completion(&self, user_id: &str, chapter_id: &str) -> Result<bool>;

    /// Health check
    async fn health_check(&self) -> Result<bool>;
}
