//! Fake Move toolchain for tests
//!
//! A POSIX shell script standing in for the `aptos` CLI. It is run as
//! `sh <script> ...` so the script file itself is never exec'd.
//!
//! Behaviour:
//! - `--version` prints a version string
//! - `move init` writes `Move.toml` and records the workspace path in `workspaces.log`
//! - `move compile` / `move test` print the submitted source; they exit 1 when the
//!   source contains `FAIL` and sleep when it contains `SLEEP`
//! - `move run <args>` prints `ran <args>`

use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

use crate::config::ToolchainConfig;

const SCRIPT: &str = r#"#!/bin/sh
LOG="__LOG__"
case "$1" in
  --version)
    __VERSION__
    ;;
esac
if [ "$1" = "move" ]; then
  case "$2" in
    init)
      __INIT__
      echo "$(pwd -P)" >> "$LOG"
      printf '[package]\nname = "playground"\n' > Move.toml
      exit 0
      ;;
    compile|test)
      src="sources/hello.move"
      if grep -q "SLEEP" "$src"; then sleep 10; fi
      cat "$src"
      if grep -q "FAIL" "$src"; then exit 1; fi
      exit 0
      ;;
    run)
      shift 2
      echo "ran $*"
      exit 0
      ;;
  esac
fi
echo "unknown command: $*" >&2
exit 2
"#;

pub(crate) struct FakeToolchain {
    dir: TempDir,
}

impl FakeToolchain {
    pub(crate) fn new() -> Self {
        Self::build("echo \"aptos 0.0.0-fake\"; exit 0", ":")
    }

    pub(crate) fn with_failing_init() -> Self {
        Self::build(
            "echo \"aptos 0.0.0-fake\"; exit 0",
            "echo \"$(pwd -P)\" >> \"$LOG\"; echo \"init exploded\" >&2; exit 1",
        )
    }

    pub(crate) fn unavailable() -> Self {
        Self::build("echo \"aptos: command not found\" >&2; exit 127", ":")
    }

    fn build(version: &str, init: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("workspaces.log");
        let script = SCRIPT
            .replace("__LOG__", &log.display().to_string())
            .replace("__VERSION__", version)
            .replace("__INIT__", init);
        std::fs::write(dir.path().join("aptos.sh"), script).unwrap();
        FakeToolchain { dir }
    }

    pub(crate) fn script(&self) -> PathBuf {
        self.dir.path().join("aptos.sh")
    }

    /// Raw command line invoking the fake, e.g. `sh /tmp/.../aptos.sh move run x`
    pub(crate) fn command_line(&self, args: &str) -> String {
        format!("sh {} {}", self.script().display(), args)
    }

    pub(crate) fn config(&self) -> ToolchainConfig {
        let script = self.script().display().to_string();
        let with_script = |args: &[&str]| {
            std::iter::once(script.clone())
                .chain(args.iter().map(|a| a.to_string()))
                .collect::<Vec<_>>()
        };
        ToolchainConfig {
            program: "sh".to_string(),
            version_args: with_script(&["--version"]),
            init_args: with_script(&["move", "init", "--name", "playground"]),
            compile_args: with_script(&["move", "compile"]),
            test_args: with_script(&["move", "test"]),
            probe_timeout: Duration::from_secs(5),
            init_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
            ..ToolchainConfig::default()
        }
    }

    /// Workspace directories that reached `move init`
    pub(crate) fn initialized_workspaces(&self) -> Vec<PathBuf> {
        std::fs::read_to_string(self.dir.path().join("workspaces.log"))
            .unwrap_or_default()
            .lines()
            .map(PathBuf::from)
            .collect()
    }
}

/// Entries currently present under `dir`
pub(crate) fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}
