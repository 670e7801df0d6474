//! Sandbox runner
//!
//! Facade over workspaces and the command pipeline. Each call validates the
//! submission, probes the toolchain, builds a throwaway Move project, runs the
//! requested commands in it and tears the project down again. Failures are
//! reported as [`RunOutcome`] values tagged with a [`RunFailure`] category.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::pipeline::{run_pipeline, CommandSpec};
use super::process::run_command;
use super::workspace::{Workspace, WorkspaceManager};
use crate::config::{SandboxConfig, ToolchainConfig};

/// Why a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunFailure {
    /// Blank submission, rejected before any work
    EmptyInput,
    /// Toolchain probe failed
    ToolchainUnavailable,
    /// Workspace or project skeleton could not be prepared
    ProjectInitFailed,
    /// A pipeline command exited non-zero or could not start
    Execution,
    /// A pipeline command exceeded its budget
    Timeout,
}

impl RunFailure {
    /// Failure caused by the environment rather than the submitted code
    pub fn is_environment(&self) -> bool {
        matches!(self, RunFailure::ToolchainUnavailable | RunFailure::ProjectInitFailed)
    }
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunFailure::EmptyInput => write!(f, "empty_input"),
            RunFailure::ToolchainUnavailable => write!(f, "toolchain_unavailable"),
            RunFailure::ProjectInitFailed => write!(f, "project_init_failed"),
            RunFailure::Execution => write!(f, "execution"),
            RunFailure::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result of one sandbox run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub success: bool,
    /// Aggregated pipeline output, set on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Diagnostic text, set on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
}

impl RunOutcome {
    pub fn succeeded(output: String) -> Self {
        RunOutcome {
            success: true,
            output: Some(output),
            error: None,
            failure: None,
        }
    }

    pub fn failed(failure: RunFailure, error: impl Into<String>) -> Self {
        RunOutcome {
            success: false,
            output: None,
            error: Some(error.into()),
            failure: Some(failure),
        }
    }

    /// Output on success, error text on failure
    pub fn text(&self) -> Option<&str> {
        if self.success {
            self.output.as_deref()
        } else {
            self.error.as_deref()
        }
    }
}

/// Runs Move toolchain commands against submitted source
#[derive(Debug, Clone)]
pub struct SandboxRunner {
    workspaces: WorkspaceManager,
    toolchain: ToolchainConfig,
}

impl SandboxRunner {
    pub fn new(config: &SandboxConfig) -> Self {
        SandboxRunner {
            workspaces: WorkspaceManager::new(config),
            toolchain: config.toolchain.clone(),
        }
    }

    pub fn toolchain(&self) -> &ToolchainConfig {
        &self.toolchain
    }

    /// Compile the submission
    pub async fn compile(&self, source: &str) -> RunOutcome {
        let command = CommandSpec::new(
            self.toolchain.program.clone(),
            self.toolchain.compile_args.clone(),
            self.toolchain.command_timeout,
        );
        self.execute(source, &[command]).await
    }

    /// Run the submission's unit tests
    pub async fn run_tests(&self, source: &str) -> RunOutcome {
        let command = CommandSpec::new(
            self.toolchain.program.clone(),
            self.toolchain.test_args.clone(),
            self.toolchain.command_timeout,
        );
        self.execute(source, &[command]).await
    }

    /// Run raw command lines one after another, each with the default budget
    pub async fn interact(&self, source: &str, commands: &[String]) -> RunOutcome {
        let specs: Vec<CommandSpec> = commands
            .iter()
            .map(|c| CommandSpec::raw(c.as_str(), self.toolchain.command_timeout))
            .collect();
        self.execute(source, &specs).await
    }

    /// Run a single raw command line with its own budget
    pub async fn run_custom(&self, source: &str, command_line: &str, timeout: Duration) -> RunOutcome {
        self.execute(source, &[CommandSpec::raw(command_line, timeout)]).await
    }

    /// Probe the toolchain with its version command
    pub async fn toolchain_available(&self) -> bool {
        let cwd = std::env::current_dir().unwrap_or_else(|_| std::env::temp_dir());
        let probe = run_command(
            &self.toolchain.program,
            &self.toolchain.version_args,
            &cwd,
            self.toolchain.probe_timeout,
        )
        .await;
        if probe.success {
            debug!("Toolchain available: {}", probe.output);
        } else {
            warn!("Toolchain probe failed: {}", probe.output);
        }
        probe.success
    }

    /// Run `commands` against a fresh project containing `source`.
    ///
    /// The workspace never outlives this call: it is destroyed explicitly on every
    /// return path and by its drop guard on unwind or cancellation.
    pub async fn execute(&self, source: &str, commands: &[CommandSpec]) -> RunOutcome {
        if source.trim().is_empty() {
            return RunOutcome::failed(RunFailure::EmptyInput, "Source code must not be empty");
        }

        if !self.toolchain_available().await {
            return RunOutcome::failed(RunFailure::ToolchainUnavailable, self.toolchain.install_hint.clone());
        }

        let workspace = match self.workspaces.create() {
            Ok(workspace) => workspace,
            Err(e) => return RunOutcome::failed(RunFailure::ProjectInitFailed, e.to_string()),
        };

        let outcome = self.run_in(&workspace, source, commands).await;
        self.workspaces.destroy(workspace);
        outcome
    }

    async fn run_in(&self, workspace: &Workspace, source: &str, commands: &[CommandSpec]) -> RunOutcome {
        if let Err(e) = self.workspaces.materialize(workspace, source).await {
            warn!("Project setup failed in {}: {}", workspace.root().display(), e);
            return RunOutcome::failed(RunFailure::ProjectInitFailed, e.to_string());
        }

        let result = run_pipeline(workspace.root(), commands).await;

        if result.success {
            info!(steps = commands.len(), "Sandbox run succeeded");
            RunOutcome::succeeded(result.output)
        } else if result.timed_out {
            warn!(steps = commands.len(), "Sandbox run timed out");
            RunOutcome::failed(RunFailure::Timeout, result.output)
        } else {
            info!(steps = commands.len(), "Sandbox run failed");
            RunOutcome::failed(RunFailure::Execution, result.output)
        }
    }

    /// Directory workspaces are created in, if not the system temp dir
    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspaces.base_dir().map(|p| p.to_path_buf())
    }
}
