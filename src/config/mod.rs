//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, LogConfig)
//! - types/sandbox.rs: Toolchain and workspace configuration
//! - types/storage.rs: Checkpoint store configuration
//! - io.rs: Configuration loading and saving
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{Config, LogConfig, LogFormat};

pub use types::sandbox::{SandboxConfig, ToolchainConfig};

pub use types::storage::{PostgresConfig, StorageBackendType, StorageConfig};

pub use io::{apply_env_overrides, load_config, load_config_from_path, save_config};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
