//! Core module - Shared types and the storage seam
//!
//! - types: checkpoints and per-user records
//! - storage: the `CheckpointStore` trait implemented by `database`

pub mod storage;
pub mod types;

pub use storage::CheckpointStore;
pub use types::*;
