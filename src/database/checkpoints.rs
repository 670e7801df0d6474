//! Checkpoint storage backed by PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{Checkpoint, CheckpointStore, UserCheckpointLog, UserCheckpointProgress};
use crate::database::PostgresPool;
use crate::error::Result;

#[derive(Debug, FromRow)]
struct CheckpointRow {
    id: String,
    chapter_id: String,
    kind: String,
    question: String,
    answer: String,
    options: Vec<String>,
    base_code: Option<String>,
    interactive_command: Option<String>,
    expected_output: Option<String>,
}

impl TryFrom<CheckpointRow> for Checkpoint {
    type Error = crate::Error;

    fn try_from(row: CheckpointRow) -> Result<Self> {
        Ok(Checkpoint {
            kind: row.kind.parse()?,
            id: row.id,
            chapter_id: row.chapter_id,
            question: row.question,
            answer: row.answer,
            options: row.options,
            base_code: row.base_code,
            interactive_command: row.interactive_command,
            expected_output: row.expected_output,
        })
    }
}

#[derive(Debug, FromRow)]
struct LogRow {
    id: Uuid,
    user_id: String,
    checkpoint_id: String,
    answer: String,
    is_correct: bool,
    created_at: DateTime<Utc>,
}

impl From<LogRow> for UserCheckpointLog {
    fn from(row: LogRow) -> Self {
        UserCheckpointLog {
            id: row.id,
            user_id: row.user_id,
            checkpoint_id: row.checkpoint_id,
            answer: row.answer,
            is_correct: row.is_correct,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProgressRow {
    user_id: String,
    checkpoint_id: String,
    completed: bool,
    completed_at: Option<DateTime<Utc>>,
}

const CHECKPOINT_COLUMNS: &str =
    "id, chapter_id, kind, question, answer, options, base_code, interactive_command, expected_output";

/// Checkpoint store backed by PostgreSQL
#[derive(Clone)]
pub struct PgCheckpointStore {
    pool: PostgresPool,
}

impl PgCheckpointStore {
    pub fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for PgCheckpointStore {
    fn id(&self) -> &str {
        "postgres"
    }

    async fn get_checkpoint(&self, id: &str) -> Result<Option<Checkpoint>> {
        let row: Option<CheckpointRow> = sqlx::query_as(&format!(
            "SELECT {} FROM checkpoints WHERE id = $1",
            CHECKPOINT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Checkpoint::try_from).transpose()
    }

    async fn list_checkpoints(&self, chapter_id: &str) -> Result<Vec<Checkpoint>> {
        let rows: Vec<CheckpointRow> = sqlx::query_as(&format!(
            "SELECT {} FROM checkpoints WHERE chapter_id = $1 ORDER BY created_at ASC",
            CHECKPOINT_COLUMNS
        ))
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Checkpoint::try_from).collect()
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> Result<()> {
        sqlx::query(r#"
            INSERT INTO checkpoints
                (id, chapter_id, kind, question, answer, options, base_code, interactive_command, expected_output)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                chapter_id = EXCLUDED.chapter_id,
                kind = EXCLUDED.kind,
                question = EXCLUDED.question,
                answer = EXCLUDED.answer,
                options = EXCLUDED.options,
                base_code = EXCLUDED.base_code,
                interactive_command = EXCLUDED.interactive_command,
                expected_output = EXCLUDED.expected_output,
                updated_at = NOW()
        "#)
        .bind(&checkpoint.id)
        .bind(&checkpoint.chapter_id)
        .bind(checkpoint.kind.as_str())
        .bind(&checkpoint.question)
        .bind(&checkpoint.answer)
        .bind(&checkpoint.options)
        .bind(&checkpoint.base_code)
        .bind(&checkpoint.interactive_command)
        .bind(&checkpoint.expected_output)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_log(
        &self,
        user_id: &str,
        checkpoint_id: &str,
        answer: &str,
        is_correct: bool,
    ) -> Result<UserCheckpointLog> {
        let row: LogRow = sqlx::query_as(r#"
            INSERT INTO user_checkpoint_logs (id, user_id, checkpoint_id, answer, is_correct)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, checkpoint_id, answer, is_correct, created_at
        "#)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(checkpoint_id)
        .bind(answer)
        .bind(is_correct)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_logs(&self, user_id: &str, checkpoint_id: &str) -> Result<Vec<UserCheckpointLog>> {
        let rows: Vec<LogRow> = sqlx::query_as(r#"
            SELECT id, user_id, checkpoint_id, answer, is_correct, created_at
            FROM user_checkpoint_logs
            WHERE user_id = $1 AND checkpoint_id = $2
            ORDER BY created_at ASC
        "#)
        .bind(user_id)
        .bind(checkpoint_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_progress(&self, user_id: &str, checkpoint_id: &str) -> Result<Option<UserCheckpointProgress>> {
        let row: Option<ProgressRow> = sqlx::query_as(r#"
            SELECT user_id, checkpoint_id, completed, completed_at
            FROM user_checkpoint_progress
            WHERE user_id = $1 AND checkpoint_id = $2
        "#)
        .bind(user_id)
        .bind(checkpoint_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserCheckpointProgress {
            user_id: r.user_id,
            checkpoint_id: r.checkpoint_id,
            completed: r.completed,
            completed_at: r.completed_at,
        }))
    }

    async fn mark_completed(&self, user_id: &str, checkpoint_id: &str, at: DateTime<Utc>) -> Result<bool> {
        // Single statement: racing submissions cannot both flip the flag, and a
        // completed row is never touched again.
        let result = sqlx::query(r#"
            INSERT INTO user_checkpoint_progress (user_id, checkpoint_id, completed, completed_at)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT (user_id, checkpoint_id) DO UPDATE SET
                completed = TRUE,
                completed_at = EXCLUDED.completed_at
            WHERE user_checkpoint_progress.completed = FALSE
        "#)
        .bind(user_id)
        .bind(checkpoint_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn chapter_has_completion(&self, user_id: &str, chapter_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(r#"
            SELECT EXISTS (
                SELECT 1
                FROM user_checkpoint_progress p
                JOIN checkpoints c ON c.id = p.checkpoint_id
                WHERE p.user_id = $1 AND c.chapter_id = $2 AND p.completed
            )
        "#)
        .bind(user_id)
        .bind(chapter_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(true)
    }
}
