//! # Move Playground
//!
//! Sandboxed execution of learner-submitted Move code and checkpoint verification.
//!
//! ## Features
//!
//! - **Isolated Workspaces:** Every run gets a throwaway Move project that is removed on every exit path
//! - **Bounded Execution:** Toolchain commands run with per-command timeouts and are killed and reaped on expiry
//! - **Checkpoint Verification:** Choice, fill and code checkpoints scored into a verdict with feedback
//! - **Monotonic Progress:** Append-only submission logs and atomic first-pass completion in PostgreSQL

pub mod config;
pub mod core;
pub mod database;
pub mod error;
pub mod sandbox;
pub mod verification;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
