//! Command pipeline
//!
//! Runs an ordered list of commands inside one workspace. The first failing step
//! halts the pipeline; later steps never run.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use super::process::run_command;

/// One pipeline step
///
/// Either a pre-split program + argument list, or a raw command line that is
/// tokenized on whitespace when the step runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    command: String,
    #[serde(default)]
    args: Option<Vec<String>>,
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

impl CommandSpec {
    /// Step with explicit program and arguments, used verbatim
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        CommandSpec {
            command: program.into(),
            args: Some(args),
            timeout,
        }
    }

    /// Step from a raw command line such as `aptos move test`
    pub fn raw(command_line: impl Into<String>, timeout: Duration) -> Self {
        CommandSpec {
            command: command_line.into(),
            args: None,
            timeout,
        }
    }

    /// Program (pre-split form) or full command line (raw form)
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Split into `(program, args)`. `None` when a raw command line is blank.
    pub fn resolve(&self) -> Option<(String, Vec<String>)> {
        match &self.args {
            Some(args) => Some((self.command.clone(), args.clone())),
            None => {
                let mut tokens = self.command.split_whitespace().map(str::to_string);
                let program = tokens.next()?;
                Some((program, tokens.collect()))
            }
        }
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.args {
            Some(args) if !args.is_empty() => write!(f, "{} {}", self.command, args.join(" ")),
            _ => write!(f, "{}", self.command),
        }
    }
}

/// Outcome of a whole pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Every step succeeded
    pub success: bool,
    /// Newline-joined output of all steps on success, the failing step's output otherwise
    pub output: String,
    /// Whether the failing step hit its timeout
    #[serde(default)]
    pub timed_out: bool,
}

impl PipelineResult {
    fn completed(output: String) -> Self {
        PipelineResult {
            success: true,
            output,
            timed_out: false,
        }
    }

    fn halted(output: String, timed_out: bool) -> Self {
        PipelineResult {
            success: false,
            output,
            timed_out,
        }
    }
}

/// Run `commands` in order inside `working_dir`.
pub async fn run_pipeline(working_dir: &Path, commands: &[CommandSpec]) -> PipelineResult {
    let mut aggregated = String::new();

    for (index, spec) in commands.iter().enumerate() {
        let Some((program, args)) = spec.resolve() else {
            return PipelineResult::halted(format!("Empty command at step {}", index + 1), false);
        };

        let result = run_command(&program, &args, working_dir, spec.timeout()).await;
        debug!(
            step = index + 1,
            total = commands.len(),
            success = result.success,
            "Pipeline step `{}` finished",
            spec
        );

        if !result.success {
            return PipelineResult::halted(result.output, result.timed_out);
        }

        if !aggregated.is_empty() {
            aggregated.push('\n');
        }
        aggregated.push_str(&result.output);
    }

    PipelineResult::completed(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_command_tokenized_on_whitespace() {
        let spec = CommandSpec::raw("  aptos   move\ttest --filter basics ", Duration::from_secs(30));
        let (program, args) = spec.resolve().unwrap();
        assert_eq!(program, "aptos");
        assert_eq!(args, vec!["move", "test", "--filter", "basics"]);
    }

    #[test]
    fn test_presplit_args_used_verbatim() {
        let spec = CommandSpec::new(
            "aptos",
            vec!["move".to_string(), "run --args x".to_string()],
            Duration::from_secs(30),
        );
        let (program, args) = spec.resolve().unwrap();
        assert_eq!(program, "aptos");
        assert_eq!(args, vec!["move", "run --args x"]);
        assert_eq!(spec.to_string(), "aptos move run --args x");
    }

    #[test]
    fn test_blank_raw_command_does_not_resolve() {
        assert!(CommandSpec::raw("   ", Duration::from_secs(1)).resolve().is_none());
    }

    #[tokio::test]
    async fn test_empty_pipeline_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_pipeline(dir.path(), &[]).await;
        assert!(result.success);
        assert_eq!(result.output, "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_outputs_joined_with_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let commands = vec![
            CommandSpec::raw("echo first", Duration::from_secs(5)),
            CommandSpec::raw("echo second", Duration::from_secs(5)),
        ];

        let result = run_pipeline(dir.path(), &commands).await;
        assert!(result.success);
        assert_eq!(result.output, "first\nsecond");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sh = |script: &str| {
            CommandSpec::new("sh", vec!["-c".to_string(), script.to_string()], Duration::from_secs(5))
        };
        let commands = vec![
            sh("echo step-a"),
            sh("echo step-b broke; exit 1"),
            sh("touch step-c-ran; echo step-c"),
        ];

        let result = run_pipeline(dir.path(), &commands).await;

        assert!(!result.success);
        assert_eq!(result.output, "step-b broke");
        assert!(!result.output.contains("step-a"));
        assert!(!dir.path().join("step-c-ran").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_halts_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let commands = vec![
            CommandSpec::raw("sleep 10", Duration::from_millis(150)),
            CommandSpec::raw("touch never", Duration::from_secs(5)),
        ];

        let result = run_pipeline(dir.path(), &commands).await;

        assert!(!result.success);
        assert!(result.timed_out);
        assert_eq!(result.output, super::super::process::TIMEOUT_MARKER);
        assert!(!dir.path().join("never").exists());
    }
}
