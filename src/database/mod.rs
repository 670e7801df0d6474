//! Database module - checkpoint persistence
//!
//! Provides storage for:
//! - PostgreSQL: checkpoints, submission logs and completion progress
//! - In-memory: the same data for tests and database-less runs

mod checkpoints;
mod in_memory;
mod postgres;

pub use checkpoints::PgCheckpointStore;
pub use in_memory::InMemoryCheckpointStore;
pub use postgres::{init_pool, migrations, PostgresPool};
