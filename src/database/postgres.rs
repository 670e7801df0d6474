//! PostgreSQL database connection and migrations

use crate::config::PostgresConfig;
use crate::error::Result;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

/// Initialize the PostgreSQL connection pool
pub async fn init_pool(config: &PostgresConfig) -> Result<PostgresPool> {
    info!("Initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(config.url.expose_secret())
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;

    info!("PostgreSQL connection pool initialized successfully");
    Ok(pool)
}

/// Database migrations
pub mod migrations {
    use super::*;

    /// Run all migrations
    pub async fn run(pool: &PgPool) -> Result<()> {
        info!("Running database migrations");

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                id TEXT PRIMARY KEY,
                chapter_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                question TEXT NOT NULL DEFAULT '',
                answer TEXT NOT NULL DEFAULT '',
                options TEXT[] NOT NULL DEFAULT '{}',
                base_code TEXT,
                interactive_command TEXT,
                expected_output TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(pool)
        .await?;

        // Append-only: rows are never updated or deleted
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS user_checkpoint_logs (
                id UUID PRIMARY KEY,
                user_id TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL REFERENCES checkpoints(id),
                answer TEXT NOT NULL,
                is_correct BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(pool)
        .await?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS user_checkpoint_progress (
                user_id TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL REFERENCES checkpoints(id),
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                completed_at TIMESTAMPTZ,
                PRIMARY KEY (user_id, checkpoint_id)
            )
        "#)
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_checkpoints_chapter_id ON checkpoints(chapter_id)")
            .execute(pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_user_checkpoint_logs_pair ON user_checkpoint_logs(user_id, checkpoint_id)",
        )
        .execute(pool)
        .await?;

        info!("Database migrations completed");
        Ok(())
    }
}
