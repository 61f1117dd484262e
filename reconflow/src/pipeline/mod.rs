//! Pipeline assembly and execution.
//!
//! This module provides:
//! - Stage identifiers and specifications
//! - The fixed reconnaissance dependency graph
//! - The concurrent scheduler
//! - The [`Pipeline`] facade tying scheduler, store, and aggregator
//!   together

mod graph;
mod scheduler;
mod spec;


pub use graph::StageGraph;
pub use scheduler::{RunSummary, Scheduler, StageReport};
pub use spec::{StageId, StageSpec};

use crate::config::ReconConfig;
use crate::errors::ReconError;
use crate::events::LoggingEventSink;
use crate::report::{Aggregator, Report};
use crate::runner::{CommandRegistry, CommandRunner};
use crate::store::{ArtifactStore, Target};
use std::sync::Arc;

/// The result of a full pipeline run: the final state table and the
/// report aggregated from whatever artifacts the run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Final per-stage states and process diagnostics.
    pub summary: RunSummary,
    /// The aggregated per-target report.
    pub report: Report,
}

/// Ties the scheduler, artifact store, and aggregator together behind the
/// two operations the command surface needs: run a target, or read the
/// report of an earlier run.
pub struct Pipeline {
    scheduler: Scheduler,
    store: ArtifactStore,
    aggregator: Aggregator,
}

impl Pipeline {
    /// Creates a pipeline with the standard recon graph and the external
    /// command runner.
    ///
    /// # Errors
    ///
    /// Returns an error when the artifact directory cannot be created.
    pub fn new(config: ReconConfig) -> Result<Self, ReconError> {
        let store = ArtifactStore::new(&config.output_dir);
        store.ensure_root()?;

        let registry = CommandRegistry::standard(&config);
        let runner = CommandRunner::new(registry, store.clone());
        let scheduler = Scheduler::new(StageGraph::recon(), Arc::new(runner))
            .with_sink(Arc::new(LoggingEventSink))
            .with_max_concurrency(config.max_concurrency);

        Ok(Self {
            scheduler,
            aggregator: Aggregator::new(store.clone()),
            store,
        })
    }

    /// Returns true if a completed run already exists for the target.
    #[must_use]
    pub fn has_completed_run(&self, target: &Target) -> bool {
        self.store.has_completed_run(target)
    }

    /// Runs the whole pipeline for a target, then aggregates a report
    /// from the artifacts the run produced.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::NoReport`] when the primary artifact is
    /// absent after the run; stage failures themselves never abort the
    /// pipeline.
    pub async fn run(&self, target: &Target) -> Result<PipelineRun, ReconError> {
        let summary = self.scheduler.run(target).await;

        if !self.store.has_completed_run(target) {
            return Err(ReconError::NoReport(target.to_string()));
        }

        let report = self.aggregator.build_report(target);
        Ok(PipelineRun { summary, report })
    }

    /// Builds a report from artifacts already on disk, without running
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::NoReport`] when no completed run exists for
    /// the target.
    pub fn report(&self, target: &Target) -> Result<Report, ReconError> {
        if !self.store.has_completed_run(target) {
            return Err(ReconError::NoReport(target.to_string()));
        }
        Ok(self.aggregator.build_report(target))
    }
}
