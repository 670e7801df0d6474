//! Sandbox module - Move toolchain execution in throwaway projects
//!
//! Layers, leaves first:
//! - process: one command, merged output, timeout + kill
//! - workspace: ephemeral project directories with guaranteed removal
//! - pipeline: ordered commands with first-failure short-circuit
//! - runner: the facade used by the verification engine

mod pipeline;
mod process;
mod runner;
mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use pipeline::{run_pipeline, CommandSpec, PipelineResult};
pub use process::{run_command, ExecutionResult, TIMEOUT_MARKER};
pub use runner::{RunFailure, RunOutcome, SandboxRunner};
pub use workspace::{Workspace, WorkspaceManager};
