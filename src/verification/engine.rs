//! Verification engine
//!
//! Scores one submission against a checkpoint, appends the submission log and
//! records completion on a pass. Choice and fill checkpoints are judged by
//! exact match; code checkpoints go through the [`SandboxRunner`].

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::tracker::CompletionTracker;
use crate::core::{Checkpoint, CheckpointKind, CheckpointStore};
use crate::error::{Error, Result};
use crate::sandbox::SandboxRunner;

/// Feedback for a correct answer on a checkpoint passed earlier
pub const ALREADY_PASSED_CORRECT: &str = "You have already passed this checkpoint, and this answer is correct";
/// Feedback for a wrong answer on a checkpoint passed earlier
pub const ALREADY_PASSED_INCORRECT: &str = "You have already passed this checkpoint, but this answer is incorrect";
/// Feedback for every submission on a checkpoint not passed before it
pub const INCORRECT_TRY_AGAIN: &str = "Incorrect answer, please try again";

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Completion state read before this submission was scored
    pub was_already_passed: bool,
    pub is_correct: bool,
    pub message: String,
    /// Text shown to the learner: the answer for choice/fill, toolchain output for code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Pick the feedback line for a submission
pub fn feedback_message(is_correct: bool, was_already_passed: bool) -> &'static str {
    match (is_correct, was_already_passed) {
        (true, true) => ALREADY_PASSED_CORRECT,
        (false, true) => ALREADY_PASSED_INCORRECT,
        _ => INCORRECT_TRY_AGAIN,
    }
}

struct Evaluation {
    passed: bool,
    output: Option<String>,
}

#[derive(Clone)]
pub struct VerificationEngine {
    runner: SandboxRunner,
    store: Arc<dyn CheckpointStore>,
    tracker: CompletionTracker,
}

impl VerificationEngine {
    pub fn new(runner: SandboxRunner, store: Arc<dyn CheckpointStore>) -> Self {
        let tracker = CompletionTracker::new(store.clone());
        Self { runner, store, tracker }
    }

    pub fn tracker(&self) -> &CompletionTracker {
        &self.tracker
    }

    /// Score `content` against the checkpoint and record the attempt.
    ///
    /// Sandbox failures are part of the verdict. `Err` means the checkpoint does
    /// not exist or the store failed.
    pub async fn submit(&self, user_id: &str, checkpoint_id: &str, content: &str) -> Result<Verdict> {
        let checkpoint = self
            .store
            .get_checkpoint(checkpoint_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Checkpoint {}", checkpoint_id)))?;

        let was_already_passed = self.tracker.has_passed(user_id, checkpoint_id).await?;
        let evaluation = self.evaluate(&checkpoint, content).await;

        self.store
            .append_log(user_id, checkpoint_id, content, evaluation.passed)
            .await?;
        if evaluation.passed {
            self.tracker.mark_passed(user_id, checkpoint_id).await?;
        }

        info!(
            user_id,
            checkpoint_id,
            kind = %checkpoint.kind,
            is_correct = evaluation.passed,
            was_already_passed,
            "Submission scored"
        );

        Ok(Verdict {
            was_already_passed,
            is_correct: evaluation.passed,
            message: feedback_message(evaluation.passed, was_already_passed).to_string(),
            output: evaluation.output,
        })
    }

    async fn evaluate(&self, checkpoint: &Checkpoint, content: &str) -> Evaluation {
        match checkpoint.kind {
            CheckpointKind::Choice | CheckpointKind::Fill => {
                let passed = content == checkpoint.answer;
                Evaluation {
                    passed,
                    output: passed.then(|| content.to_string()),
                }
            }
            CheckpointKind::Code => self.evaluate_code(checkpoint, content).await,
        }
    }

    async fn evaluate_code(&self, checkpoint: &Checkpoint, content: &str) -> Evaluation {
        let commands = checkpoint.interactive_commands();
        let outcome = if commands.is_empty() {
            self.runner.run_tests(content).await
        } else {
            self.runner.interact(content, &commands).await
        };

        // Failure text is matched as well as success output
        let text = match outcome.text() {
            Some(text) if !text.is_empty() => text.to_string(),
            other => {
                debug!(checkpoint_id = %checkpoint.id, "Sandbox produced no output");
                return Evaluation {
                    passed: false,
                    output: other.map(str::to_string),
                };
            }
        };

        let passed = checkpoint
            .expected_outputs()
            .iter()
            .all(|expected| text.contains(expected));
        Evaluation {
            passed,
            output: Some(text),
        }
    }
}
