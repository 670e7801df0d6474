//! Completion tracker
//!
//! Records per-user, per-checkpoint pass state. Completion is monotonic: once a
//! pair is marked passed, nothing here ever clears it.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::core::CheckpointStore;
use crate::error::Result;

#[derive(Clone)]
pub struct CompletionTracker {
    store: Arc<dyn CheckpointStore>,
}

impl CompletionTracker {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Mark the pair passed. Returns `true` when this call completed it.
    pub async fn mark_passed(&self, user_id: &str, checkpoint_id: &str) -> Result<bool> {
        let flipped = self.store.mark_completed(user_id, checkpoint_id, Utc::now()).await?;
        if flipped {
            debug!(user_id, checkpoint_id, "Checkpoint completed");
        } else {
            debug!(user_id, checkpoint_id, "Checkpoint was already completed");
        }
        Ok(flipped)
    }

    pub async fn has_passed(&self, user_id: &str, checkpoint_id: &str) -> Result<bool> {
        Ok(self
            .store
            .get_progress(user_id, checkpoint_id)
            .await?
            .is_some_and(|p| p.completed))
    }

    /// Whether any checkpoint of the chapter is completed by the user
    pub async fn has_passed_chapter(&self, user_id: &str, chapter_id: &str) -> Result<bool> {
        self.store.chapter_has_completion(user_id, chapter_id).await
    }
}
