//! Ephemeral project workspaces
//!
//! A [`Workspace`] is a uniquely named temporary directory holding one Move
//! project. It is removed when [`WorkspaceManager::destroy`] is called or, failing
//! that, when the value is dropped, so early returns and panics cannot leak it.
//! Removal errors are logged and swallowed.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

use super::process::run_command;
use crate::config::{SandboxConfig, ToolchainConfig};
use crate::error::{Error, Result};

/// One submission's project directory
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    root: PathBuf,
    source_path: PathBuf,
    created_at: DateTime<Utc>,
}

impl Workspace {
    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the submitted source is written
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn teardown(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!("Removed workspace {}", self.root.display()),
            Err(e) => warn!("Failed to remove workspace {}: {}", self.root.display(), e),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Creates, fills and removes workspaces
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    base_dir: Option<PathBuf>,
    prefix: String,
    toolchain: ToolchainConfig,
}

impl WorkspaceManager {
    pub fn new(config: &SandboxConfig) -> Self {
        WorkspaceManager {
            base_dir: config.workspace_root.clone(),
            prefix: config.workspace_prefix.clone(),
            toolchain: config.toolchain.clone(),
        }
    }

    /// Parent directory of new workspaces, when not the system temp dir
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Allocate a fresh, uniquely named directory
    pub fn create(&self) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.prefix);

        let dir = match &self.base_dir {
            Some(base) => {
                std::fs::create_dir_all(base)?;
                builder.tempdir_in(base)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| Error::Sandbox(format!("Failed to create workspace: {}", e)))?;

        let root = dir.path().to_path_buf();
        let source_path = root
            .join(&self.toolchain.sources_dir)
            .join(&self.toolchain.source_file);
        debug!("Created workspace {}", root.display());

        Ok(Workspace {
            dir: Some(dir),
            root,
            source_path,
            created_at: Utc::now(),
        })
    }

    /// Initialize the project skeleton, then write `source` into it.
    ///
    /// Nothing is written when initialization fails.
    pub async fn materialize(&self, workspace: &Workspace, source: &str) -> Result<()> {
        let init = run_command(
            &self.toolchain.program,
            &self.toolchain.init_args,
            workspace.root(),
            self.toolchain.init_timeout,
        )
        .await;
        if !init.success {
            return Err(Error::Sandbox(format!(
                "Failed to initialize Move project: {}",
                init.output
            )));
        }

        if let Some(sources_dir) = workspace.source_path().parent() {
            tokio::fs::create_dir_all(sources_dir).await?;
        }
        tokio::fs::write(workspace.source_path(), source).await?;

        Ok(())
    }

    /// Remove the workspace tree. Never fails.
    pub fn destroy(&self, mut workspace: Workspace) {
        workspace.teardown();
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::sandbox::testing::FakeToolchain;
    use tempfile::tempdir;

    fn manager_in(base: &Path, toolchain: ToolchainConfig) -> WorkspaceManager {
        let config = SandboxConfig {
            workspace_root: Some(base.to_path_buf()),
            workspace_prefix: "ws-test-".to_string(),
            toolchain,
        };
        WorkspaceManager::new(&config)
    }

    #[test]
    fn test_create_and_destroy() {
        let base = tempdir().unwrap();
        let manager = manager_in(base.path(), ToolchainConfig::default());

        let workspace = manager.create().unwrap();
        let root = workspace.root().to_path_buf();
        assert!(root.exists());
        assert!(root.starts_with(base.path()));
        assert!(root
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("ws-test-"));
        assert!(workspace.source_path().ends_with("sources/hello.move"));

        manager.destroy(workspace);
        assert!(!root.exists());
    }

    #[test]
    fn test_unique_names() {
        let base = tempdir().unwrap();
        let manager = manager_in(base.path(), ToolchainConfig::default());

        let a = manager.create().unwrap();
        let b = manager.create().unwrap();
        assert_ne!(a.root(), b.root());
    }

    #[test]
    fn test_drop_removes_directory() {
        let base = tempdir().unwrap();
        let manager = manager_in(base.path(), ToolchainConfig::default());

        let root = {
            let workspace = manager.create().unwrap();
            std::fs::write(workspace.root().join("scratch"), "x").unwrap();
            workspace.root().to_path_buf()
        };

        assert!(!root.exists());
    }

    #[test]
    fn test_destroy_after_external_removal_is_swallowed() {
        let base = tempdir().unwrap();
        let manager = manager_in(base.path(), ToolchainConfig::default());

        let workspace = manager.create().unwrap();
        std::fs::remove_dir_all(workspace.root()).unwrap();

        // Must not panic or propagate
        manager.destroy(workspace);
    }

    #[tokio::test]
    async fn test_panicking_task_still_removes_workspace() {
        let base = tempdir().unwrap();
        let manager = manager_in(base.path(), ToolchainConfig::default());
        let (tx, rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            let workspace = manager.create().unwrap();
            tx.send(workspace.root().to_path_buf()).unwrap();
            panic!("pipeline blew up");
        });

        assert!(handle.await.is_err());
        let root = rx.await.unwrap();
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_materialize_writes_source() {
        let base = tempdir().unwrap();
        let fake = FakeToolchain::new();
        let manager = manager_in(base.path(), fake.config());

        let workspace = manager.create().unwrap();
        manager
            .materialize(&workspace, "module playground::hello {}")
            .await
            .unwrap();

        assert!(workspace.root().join("Move.toml").exists());
        let written = std::fs::read_to_string(workspace.source_path()).unwrap();
        assert_eq!(written, "module playground::hello {}");
    }

    #[tokio::test]
    async fn test_failed_init_writes_nothing() {
        let base = tempdir().unwrap();
        let fake = FakeToolchain::with_failing_init();
        let manager = manager_in(base.path(), fake.config());

        let workspace = manager.create().unwrap();
        let err = manager.materialize(&workspace, "module m {}").await.unwrap_err();

        assert!(matches!(err, Error::Sandbox(_)));
        assert!(err.to_string().contains("init exploded"));
        assert!(!workspace.source_path().exists());
    }
}
