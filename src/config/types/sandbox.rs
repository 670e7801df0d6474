//! Sandbox configuration types
//!
//! Configuration for the external Move toolchain and the ephemeral project
//! workspaces it runs in.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Parent directory for workspaces (system temp dir when unset)
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
    /// Name prefix of every workspace directory
    #[serde(default = "default_workspace_prefix")]
    pub workspace_prefix: String,
    /// Toolchain configuration
    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            workspace_root: None,
            workspace_prefix: default_workspace_prefix(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

fn default_workspace_prefix() -> String {
    "move-playground-".to_string()
}

/// External toolchain configuration
///
/// Every command is expressed as arguments to `program`, so pointing `program` at a
/// different binary (an absolute path, a wrapper script) moves the whole pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    /// Toolchain executable, resolved through `PATH`
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments of the availability probe
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,
    /// Arguments that create the project skeleton
    #[serde(default = "default_init_args")]
    pub init_args: Vec<String>,
    /// Arguments that compile the project
    #[serde(default = "default_compile_args")]
    pub compile_args: Vec<String>,
    /// Arguments that run the project's unit tests
    #[serde(default = "default_test_args")]
    pub test_args: Vec<String>,
    /// Directory (relative to the workspace) holding sources
    #[serde(default = "default_sources_dir")]
    pub sources_dir: String,
    /// File name the submission is written to
    #[serde(default = "default_source_file")]
    pub source_file: String,
    /// Budget for the availability probe
    #[serde(with = "humantime_serde", default = "default_probe_timeout")]
    pub probe_timeout: Duration,
    /// Budget for project initialization
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub init_timeout: Duration,
    /// Budget for each pipeline command
    #[serde(with = "humantime_serde", default = "default_command_timeout")]
    pub command_timeout: Duration,
    /// Shown to the user when the probe fails
    #[serde(default = "default_install_hint")]
    pub install_hint: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            program: default_program(),
            version_args: default_version_args(),
            init_args: default_init_args(),
            compile_args: default_compile_args(),
            test_args: default_test_args(),
            sources_dir: default_sources_dir(),
            source_file: default_source_file(),
            probe_timeout: default_probe_timeout(),
            init_timeout: default_command_timeout(),
            command_timeout: default_command_timeout(),
            install_hint: default_install_hint(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_program() -> String {
    "aptos".to_string()
}

fn default_version_args() -> Vec<String> {
    strings(&["--version"])
}

fn default_init_args() -> Vec<String> {
    strings(&["move", "init", "--name", "playground"])
}

fn default_compile_args() -> Vec<String> {
    strings(&["move", "compile"])
}

fn default_test_args() -> Vec<String> {
    strings(&["move", "test"])
}

fn default_sources_dir() -> String {
    "sources".to_string()
}

fn default_source_file() -> String {
    "hello.move".to_string()
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_install_hint() -> String {
    "Aptos CLI was not found. Make sure it is installed and available on PATH.\n\n\
     Installation:\n\
     1. Visit https://aptos.dev/tools/aptos-cli/install-cli/\n\
     2. Follow the instructions to install the Aptos CLI\n\
     3. Make sure the `aptos` command runs in a terminal"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_defaults() {
        let config = ToolchainConfig::default();
        assert_eq!(config.program, "aptos");
        assert_eq!(config.init_args, vec!["move", "init", "--name", "playground"]);
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert!(config.install_hint.contains("aptos"));
    }

    #[test]
    fn test_humantime_durations() {
        let config: SandboxConfig = serde_json::from_str(
            r#"{"toolchain": {"program": "/opt/aptos", "command_timeout": "1m 30s"}}"#,
        )
        .unwrap();
        assert_eq!(config.toolchain.program, "/opt/aptos");
        assert_eq!(config.toolchain.command_timeout, Duration::from_secs(90));
        assert_eq!(config.toolchain.init_timeout, Duration::from_secs(30));
        assert_eq!(config.workspace_prefix, "move-playground-");
    }
}
