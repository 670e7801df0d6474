//! Configuration validation
//!
//! Validates configuration and reports issues.

use std::time::Duration;

use super::types::storage::StorageBackendType;
use super::types::Config;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_sandbox_config(config, result);
    result = validate_storage_config(config, result);

    result
}

fn validate_sandbox_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    let toolchain = &config.sandbox.toolchain;

    if toolchain.program.trim().is_empty() {
        result = result.with_error(
            ValidationIssue::new("sandbox.toolchain.program", "Toolchain program is empty")
                .with_suggestion("Set MOVE_TOOLCHAIN or sandbox.toolchain.program (e.g. \"aptos\")"),
        );
    }

    let timeouts = [
        ("sandbox.toolchain.probe_timeout", toolchain.probe_timeout),
        ("sandbox.toolchain.init_timeout", toolchain.init_timeout),
        ("sandbox.toolchain.command_timeout", toolchain.command_timeout),
    ];
    for (path, timeout) in timeouts {
        if timeout == Duration::ZERO {
            result = result.with_error(
                ValidationIssue::new(path, "Timeout must be greater than zero")
                    .with_suggestion("Use a humantime value such as \"30s\""),
            );
        }
    }

    if toolchain.source_file.contains('/') || toolchain.source_file.contains('\\') {
        result = result.with_error(ValidationIssue::new(
            "sandbox.toolchain.source_file",
            "Source file must be a plain file name",
        ));
    }

    if let Some(root) = &config.sandbox.workspace_root {
        if !root.exists() {
            result = result.with_warning(
                ValidationIssue::new(
                    "sandbox.workspace_root",
                    format!("Workspace root does not exist: {}", root.display()),
                )
                .with_suggestion("Create the directory or unset sandbox.workspace_root"),
            );
        }
    }

    result
}

fn validate_storage_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    match config.storage.backend {
        StorageBackendType::Postgres if config.storage.postgres.is_none() => {
            result = result.with_error(
                ValidationIssue::new(
                    "storage.postgres",
                    "PostgreSQL backend selected but not configured",
                )
                .with_suggestion("Set DATABASE_URL environment variable or configure storage.postgres"),
            );
        }
        StorageBackendType::Memory => {
            result = result.with_warning(ValidationIssue::new(
                "storage.backend",
                "In-memory storage selected; checkpoint progress is lost on exit",
            ));
        }
        _ => {}
    }

    result
}
