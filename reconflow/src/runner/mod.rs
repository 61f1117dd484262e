//! Stage runners: one external process per stage.
//!
//! The runner never inspects what a tool prints; standard output is
//! discarded and standard error is only captured for diagnostics. Success
//! is defined purely by presence of the declared output artifact after
//! the process exits, because several of the external tools produce
//! partial or empty artifacts on soft failure while exiting zero, and
//! vice versa.

mod command;
mod staging;

pub use command::{CommandArg, CommandRegistry, CommandTemplate, RenderedCommand};
pub use staging::{stage_endpoint_urls, stage_host_ports, StagedList};

use crate::core::RunnerOutcome;
use crate::errors::ReconError;
use crate::pipeline::StageSpec;
use crate::store::{ArtifactStore, Target};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Trait for stage execution.
///
/// The scheduler only depends on this seam, so tests drive it with
/// scripted runners and production uses [`CommandRunner`].
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Executes one stage for a target, blocking the calling task until
    /// the work reaches a terminal outcome.
    async fn execute(&self, spec: &StageSpec, target: &Target) -> RunnerOutcome;
}

/// Runs stages by spawning their registered external command.
pub struct CommandRunner {
    registry: CommandRegistry,
    store: ArtifactStore,
}

impl CommandRunner {
    /// Creates a runner over a command registry and artifact store.
    #[must_use]
    pub fn new(registry: CommandRegistry, store: ArtifactStore) -> Self {
        Self { registry, store }
    }
}

#[async_trait]
impl StageRunner for CommandRunner {
    async fn execute(&self, spec: &StageSpec, target: &Target) -> RunnerOutcome {
        // A missing required input means the producing stage soft-failed
        // earlier; skip without spawning anything.
        for input in &spec.inputs {
            if !self.store.exists(target, *input) {
                let error = ReconError::MissingInput {
                    stage: spec.id,
                    artifact: *input,
                };
                tracing::warn!(stage = %spec.id, %error, "skipping stage");
                return RunnerOutcome::skipped(error.to_string());
            }
        }

        let staged = match staging::prepare(spec.id, &self.store, target) {
            Ok(staged) => staged,
            Err(error) => {
                tracing::warn!(stage = %spec.id, %error, "input staging failed");
                return RunnerOutcome::skipped(format!("input staging failed: {error}"));
            }
        };
        if staged.as_ref().is_some_and(StagedList::is_empty) {
            return RunnerOutcome::skipped("no staged inputs");
        }

        let Some(command) = self.registry.render(
            spec.id,
            target,
            &self.store,
            staged.as_ref().map(StagedList::path),
        ) else {
            return RunnerOutcome::failed(
                None,
                "",
                format!("no command registered for stage '{}'", spec.id),
            );
        };

        tracing::debug!(stage = %spec.id, program = %command.program, "invoking external tool");

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        // The staged scratch list is only needed while the tool runs.
        drop(staged);

        let (exit_code, stderr) = match output {
            Ok(output) => (
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ),
            Err(error) => {
                return RunnerOutcome::failed(
                    None,
                    "",
                    format!("failed to spawn '{}': {error}", command.program),
                );
            }
        };

        if self.store.exists(target, spec.output) {
            RunnerOutcome::completed(exit_code, stderr)
        } else {
            let error = ReconError::ProcessFailure {
                stage: spec.id,
                exit_code,
                stderr: stderr.clone(),
            };
            RunnerOutcome::failed(exit_code, stderr, error.to_string())
        }
    }
}
