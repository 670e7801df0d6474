//! In-memory checkpoint store
//!
//! Process-local implementation of [`CheckpointStore`], used by tests and by
//! the CLI when no database is configured. Nothing survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::{Checkpoint, CheckpointStore, UserCheckpointLog, UserCheckpointProgress};
use crate::error::Result;

type PairKey = (String, String);

#[derive(Default)]
struct State {
    checkpoints: HashMap<String, Checkpoint>,
    /// Insertion order of checkpoint IDs
    order: Vec<String>,
    logs: Vec<UserCheckpointLog>,
    progress: HashMap<PairKey, UserCheckpointProgress>,
}

/// Checkpoint store kept in process memory
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    state: RwLock<State>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `checkpoints`
    pub fn with_checkpoints(checkpoints: impl IntoIterator<Item = Checkpoint>) -> Self {
        let mut state = State::default();
        for checkpoint in checkpoints {
            if !state.checkpoints.contains_key(&checkpoint.id) {
                state.order.push(checkpoint.id.clone());
            }
            state.checkpoints.insert(checkpoint.id.clone(), checkpoint);
        }
        InMemoryCheckpointStore {
            state: RwLock::new(state),
        }
    }
}

fn pair(user_id: &str, checkpoint_id: &str) -> PairKey {
    (user_id.to_string(), checkpoint_id.to_string())
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn get_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>> {
        Ok(self.state.read().await.checkpoints.get(id).cloned())
    }

    async fn list_checkpoints(&self, chapter_id: &str) -> Result<Vec<Checkpoint>> {
        let state = self.state.read().await;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.checkpoints.get(id))
            .filter(|cp| cp.chapter_id == chapter_id)
            .cloned()
            .collect())
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.checkpoints.contains_key(&checkpoint.id) {
            state.order.push(checkpoint.id.clone());
        }
        state.checkpoints.insert(checkpoint.id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn append_log(
        &self,
        user_id: &str,
        checkpoint_id: &str,
        answer: &str,
        is_correct: bool,
    ) -> Result<UserCheckpointLog> {
        let log = UserCheckpointLog {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            checkpoint_id: checkpoint_id.to_string(),
            answer: answer.to_string(),
            is_correct,
            created_at: Utc::now(),
        };
        self.state.write().await.logs.push(log.clone());
        Ok(log)
    }

    async fn list_logs(&self, user_id: &str, checkpoint_id: &str) -> Result<Vec<UserCheckpointLog>> {
        Ok(self
            .state
            .read()
            .await
            .logs
            .iter()
            .filter(|log| log.user_id == user_id && log.checkpoint_id == checkpoint_id)
            .cloned()
            .collect())
    }

    async fn get_progress(&self, user_id: &str, checkpoint_id: &str) -> Result<Option<UserCheckpointProgress>> {
        Ok(self
            .state
            .read()
            .await
            .progress
            .get(&pair(user_id, checkpoint_id))
            .cloned())
    }

    async fn mark_completed(&self, user_id: &str, checkpoint_id: &str, at: DateTime<Utc>) -> Result<bool> {
        // Check and set under one write guard
        let mut state = self.state.write().await;
        let entry = state
            .progress
            .entry(pair(user_id, checkpoint_id))
            .or_insert_with(|| UserCheckpointProgress {
                user_id: user_id.to_string(),
                checkpoint_id: checkpoint_id.to_string(),
                completed: false,
                completed_at: None,
            });

        if entry.completed {
            return Ok(false);
        }
        entry.completed = true;
        entry.completed_at = Some(at);
        Ok(true)
    }

    async fn chapter_has_completion(&self, user_id: &str, chapter_id: &str) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state.progress.values().any(|p| {
            p.completed
                && p.user_id == user_id
                && state
                    .checkpoints
                    .get(&p.checkpoint_id)
                    .is_some_and(|cp| cp.chapter_id == chapter_id)
        }))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_checkpoint_crud() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.get_checkpoint("cp-1").await.unwrap().is_none());

        store.save_checkpoint(&Checkpoint::choice("cp-1", "ch-1", "A")).await.unwrap();
        store.save_checkpoint(&Checkpoint::choice("cp-2", "ch-2", "B")).await.unwrap();
        store.save_checkpoint(&Checkpoint::choice("cp-3", "ch-1", "C")).await.unwrap();
        store.save_checkpoint(&Checkpoint::choice("cp-1", "ch-1", "D")).await.unwrap();

        assert_eq!(store.get_checkpoint("cp-1").await.unwrap().unwrap().answer, "D");
        let ids: Vec<String> = store
            .list_checkpoints("ch-1")
            .await
            .unwrap()
            .into_iter()
            .map(|cp| cp.id)
            .collect();
        assert_eq!(ids, vec!["cp-1", "cp-3"]);
    }

    #[tokio::test]
    async fn test_logs_are_scoped_to_pair() {
        let store = InMemoryCheckpointStore::new();
        store.append_log("alice", "cp-1", "A", false).await.unwrap();
        store.append_log("alice", "cp-1", "B", true).await.unwrap();
        store.append_log("bob", "cp-1", "B", true).await.unwrap();

        let logs = store.list_logs("alice", "cp-1").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].answer, "A");
        assert!(logs[1].is_correct);
        assert_ne!(logs[0].id, logs[1].id);
    }

    #[tokio::test]
    async fn test_mark_completed_first_call_wins() {
        let store = InMemoryCheckpointStore::new();
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(60);

        assert!(store.mark_completed("alice", "cp-1", first).await.unwrap());
        assert!(!store.mark_completed("alice", "cp-1", later).await.unwrap());

        let progress = store.get_progress("alice", "cp-1").await.unwrap().unwrap();
        assert!(progress.completed);
        assert_eq!(progress.completed_at, Some(first));
        assert!(store.get_progress("bob", "cp-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_mark_completed_flips_once() {
        let store = Arc::new(InMemoryCheckpointStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.mark_completed("alice", "cp-1", Utc::now()).await.unwrap() })
            })
            .collect();

        let mut flipped = 0;
        for handle in handles {
            if handle.await.unwrap() {
                flipped += 1;
            }
        }
        assert_eq!(flipped, 1);
    }

    #[tokio::test]
    async fn test_chapter_has_completion() {
        let store = InMemoryCheckpointStore::with_checkpoints(vec![
            Checkpoint::choice("cp-1", "ch-1", "A"),
            Checkpoint::choice("cp-2", "ch-2", "B"),
        ]);

        assert!(!store.chapter_has_completion("alice", "ch-1").await.unwrap());
        store.mark_completed("alice", "cp-1", Utc::now()).await.unwrap();
        assert!(store.chapter_has_completion("alice", "ch-1").await.unwrap());
        assert!(!store.chapter_has_completion("alice", "ch-2").await.unwrap());
        assert!(!store.chapter_has_completion("bob", "ch-1").await.unwrap());
    }
}
