//! Core types used across the application
//!
//! Checkpoints as authored by instructors, and the per-user records kept for
//! every submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Separator used by the interactive-command and expected-output fields
pub const FIELD_SEPARATOR: char = ';';

/// How a checkpoint is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointKind {
    /// Multiple choice, judged by exact answer match
    Choice,
    /// Fill in the blank, judged by exact answer match
    Fill,
    /// Move code, judged by running the toolchain
    Code,
}

impl CheckpointKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointKind::Choice => "choice",
            CheckpointKind::Fill => "fill",
            CheckpointKind::Code => "code",
        }
    }

    /// Whether judging needs the sandbox
    pub fn is_code(&self) -> bool {
        matches!(self, CheckpointKind::Code)
    }
}

impl std::str::FromStr for CheckpointKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "choice" => Ok(CheckpointKind::Choice),
            "fill" => Ok(CheckpointKind::Fill),
            "code" => Ok(CheckpointKind::Code),
            _ => Err(crate::Error::InvalidInput(format!(
                "Unknown checkpoint type: {}",
                s
            ))),
        }
    }
}

impl std::fmt::Display for CheckpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An instructor-authored checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    pub chapter_id: String,
    #[serde(rename = "type")]
    pub kind: CheckpointKind,
    pub question: String,
    /// Canonical answer for choice/fill checkpoints
    pub answer: String,
    /// Ordered options for choice checkpoints
    #[serde(default)]
    pub options: Vec<String>,
    /// Scaffold shown to the learner for code checkpoints
    #[serde(default)]
    pub base_code: Option<String>,
    /// `;`-delimited toolchain command lines
    #[serde(default)]
    pub interactive_command: Option<String>,
    /// `;`-delimited substrings the output must contain
    #[serde(default)]
    pub expected_output: Option<String>,
}

impl Checkpoint {
    /// A choice checkpoint with the given canonical answer
    pub fn choice(id: impl Into<String>, chapter_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Checkpoint {
            id: id.into(),
            chapter_id: chapter_id.into(),
            kind: CheckpointKind::Choice,
            question: String::new(),
            answer: answer.into(),
            options: Vec::new(),
            base_code: None,
            interactive_command: None,
            expected_output: None,
        }
    }

    /// A code checkpoint expecting `expected_output`
    pub fn code(id: impl Into<String>, chapter_id: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Checkpoint {
            id: id.into(),
            chapter_id: chapter_id.into(),
            kind: CheckpointKind::Code,
            question: String::new(),
            answer: String::new(),
            options: Vec::new(),
            base_code: None,
            interactive_command: None,
            expected_output: Some(expected_output.into()),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = question.into();
        self
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    pub fn with_base_code(mut self, base_code: impl Into<String>) -> Self {
        self.base_code = Some(base_code.into());
        self
    }

    pub fn with_interactive_command(mut self, commands: impl Into<String>) -> Self {
        self.interactive_command = Some(commands.into());
        self
    }

    /// Interactive command lines in order. Blank segments are skipped.
    pub fn interactive_commands(&self) -> Vec<String> {
        self.interactive_command
            .as_deref()
            .map(|raw| {
                raw.split(FIELD_SEPARATOR)
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Required output substrings, verbatim (no trimming).
    ///
    /// A missing field behaves like an empty one: a single empty substring,
    /// which every output contains.
    pub fn expected_outputs(&self) -> Vec<&str> {
        self.expected_output
            .as_deref()
            .unwrap_or("")
            .split(FIELD_SEPARATOR)
            .collect()
    }
}

/// Append-only record of one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCheckpointLog {
    pub id: Uuid,
    pub user_id: String,
    pub checkpoint_id: String,
    pub answer: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Completion state of one (user, checkpoint) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCheckpointProgress {
    pub user_id: String,
    pub checkpoint_id: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}
