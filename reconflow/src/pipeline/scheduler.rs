//! Dependency-ordered concurrent stage execution.
//!
//! Stages launch as soon as every dependency has completed, so independent
//! branches overlap freely. The stage-state table lives inside the
//! scheduling loop; stage tasks communicate results back by message
//! passing, never by touching shared state.

use super::{StageGraph, StageId, StageSpec};
use crate::core::{RunnerOutcome, StageStatus};
use crate::events::{EventSink, NoOpEventSink, PipelineEvent};
use crate::runner::StageRunner;
use crate::store::Target;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use uuid::Uuid;

/// The recorded result of one stage within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageReport {
    /// Terminal status the stage reached.
    pub status: StageStatus,
    /// Process exit code, when one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Captured stderr from the external process.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    /// Skip reason or failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Wall-clock stage duration in milliseconds, absent for stages that
    /// never ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

impl StageReport {
    fn from_outcome(outcome: RunnerOutcome, duration_ms: Option<f64>) -> Self {
        Self {
            status: outcome.status,
            exit_code: outcome.exit_code,
            stderr: outcome.stderr,
            detail: outcome.detail,
            duration_ms,
        }
    }

    fn skipped(reason: impl Into<String>) -> Self {
        Self::from_outcome(RunnerOutcome::skipped(reason), None)
    }
}

/// The final state table of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// The target the run was for.
    pub target: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the whole run in milliseconds.
    pub duration_ms: f64,
    /// Per-stage results.
    pub stages: BTreeMap<StageId, StageReport>,
}

impl RunSummary {
    /// The terminal status a stage reached.
    #[must_use]
    pub fn status_of(&self, id: StageId) -> Option<StageStatus> {
        self.stages.get(&id).map(|report| report.status)
    }

    /// Number of stages with the given status.
    #[must_use]
    pub fn count(&self, status: StageStatus) -> usize {
        self.stages
            .values()
            .filter(|report| report.status == status)
            .count()
    }
}

type StageCompletion = (StageId, Result<(RunnerOutcome, f64), tokio::task::JoinError>);

/// Walks the stage graph, launching stages concurrently as soon as their
/// dependencies complete, until every stage is terminal.
pub struct Scheduler {
    graph: StageGraph,
    runner: Arc<dyn StageRunner>,
    sink: Arc<dyn EventSink>,
    max_concurrency: Option<usize>,
}

impl Scheduler {
    /// Creates a scheduler over a graph and a stage runner.
    #[must_use]
    pub fn new(graph: StageGraph, runner: Arc<dyn StageRunner>) -> Self {
        Self {
            graph,
            runner,
            sink: Arc::new(NoOpEventSink),
            max_concurrency: None,
        }
    }

    /// Sets the event sink receiving lifecycle events.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Bounds the number of concurrently executing stages. Unbounded by
    /// default; parallelism degree is a throughput knob, never a
    /// correctness one.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: Option<usize>) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Returns the graph this scheduler walks.
    #[must_use]
    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    /// Runs the pipeline for a target until every stage reaches a
    /// terminal state, then returns the final state table.
    ///
    /// For fixed per-stage outcomes the resulting state table is
    /// identical regardless of scheduling order.
    pub async fn run(&self, target: &Target) -> RunSummary {
        let wall_start = Instant::now();
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();

        let mut states: HashMap<StageId, StageStatus> = self
            .graph
            .execution_order()
            .iter()
            .map(|id| (*id, StageStatus::Pending))
            .collect();
        let mut reports: BTreeMap<StageId, StageReport> = BTreeMap::new();

        let semaphore = self
            .max_concurrency
            .map(|max| Arc::new(Semaphore::new(max.max(1))));
        let mut active: FuturesUnordered<BoxFuture<'static, StageCompletion>> =
            FuturesUnordered::new();

        loop {
            self.propagate_skips(&mut states, &mut reports);
            self.launch_ready(target, semaphore.as_ref(), &mut states, &mut active);

            if states.values().all(StageStatus::is_terminal) {
                break;
            }

            let Some((id, joined)) = active.next().await else {
                // Unreachable for a validated DAG: every non-terminal
                // stage is either launchable, skippable, or downstream of
                // a running one.
                tracing::error!("scheduler stalled with non-terminal stages");
                break;
            };

            let (outcome, duration_ms) = match joined {
                Ok((outcome, duration_ms)) => (outcome, Some(duration_ms)),
                Err(join_error) => (
                    RunnerOutcome::failed(None, "", format!("stage task failed: {join_error}")),
                    None,
                ),
            };

            // A runner must return a terminal status; anything else is
            // treated as a failure.
            let status = if outcome.status.is_terminal() {
                outcome.status
            } else {
                StageStatus::Failed
            };
            states.insert(id, status);

            match status {
                StageStatus::Completed => self.sink.emit(&PipelineEvent::StageCompleted {
                    stage: id,
                    duration_ms: duration_ms.unwrap_or_default(),
                }),
                StageStatus::Skipped => self.sink.emit(&PipelineEvent::StageSkipped {
                    stage: id,
                    reason: outcome.detail.clone().unwrap_or_default(),
                }),
                _ => self.sink.emit(&PipelineEvent::StageFailed {
                    stage: id,
                    exit_code: outcome.exit_code,
                }),
            }

            reports.insert(id, StageReport::from_outcome(outcome, duration_ms));
        }

        let duration_ms = wall_start.elapsed().as_secs_f64() * 1000.0;
        let summary = RunSummary {
            run_id,
            target: target.to_string(),
            started_at,
            duration_ms,
            stages: reports,
        };
        self.sink.emit(&PipelineEvent::PipelineCompleted {
            duration_ms,
            completed: summary.count(StageStatus::Completed),
            failed: summary.count(StageStatus::Failed),
            skipped: summary.count(StageStatus::Skipped),
        });
        summary
    }

    /// Marks every pending stage whose dependencies cannot complete as
    /// skipped. One pass in topological order reaches the fixpoint,
    /// because a dependency always precedes its dependents in the order.
    fn propagate_skips(
        &self,
        states: &mut HashMap<StageId, StageStatus>,
        reports: &mut BTreeMap<StageId, StageReport>,
    ) {
        for id in self.graph.execution_order() {
            if states.get(id) != Some(&StageStatus::Pending) {
                continue;
            }

            let blocked = self
                .graph
                .dependencies_of(*id)
                .iter()
                .copied()
                .find(|dep| states.get(dep).is_some_and(StageStatus::blocks_dependents));

            if let Some(dep) = blocked {
                let dep_status = states.get(&dep).copied().unwrap_or(StageStatus::Failed);
                let reason = format!("dependency '{dep}' {dep_status}");
                states.insert(*id, StageStatus::Skipped);
                self.sink.emit(&PipelineEvent::StageSkipped {
                    stage: *id,
                    reason: reason.clone(),
                });
                reports.insert(*id, StageReport::skipped(reason));
            }
        }
    }

    /// Launches every pending stage whose dependencies have all completed.
    fn launch_ready(
        &self,
        target: &Target,
        semaphore: Option<&Arc<Semaphore>>,
        states: &mut HashMap<StageId, StageStatus>,
        active: &mut FuturesUnordered<BoxFuture<'static, StageCompletion>>,
    ) {
        for id in self.graph.execution_order() {
            if states.get(id) != Some(&StageStatus::Pending) {
                continue;
            }

            let ready = self
                .graph
                .dependencies_of(*id)
                .iter()
                .all(|dep| states.get(dep).is_some_and(StageStatus::is_completed));
            if !ready {
                continue;
            }

            states.insert(*id, StageStatus::Running);
            self.sink.emit(&PipelineEvent::StageStarted { stage: *id });
            active.push(self.spawn_stage(*id, target, semaphore.cloned()));
        }
    }

    /// Spawns one stage task. The task blocks on the external process;
    /// that await is the scheduler's only suspension point per stage.
    fn spawn_stage(
        &self,
        id: StageId,
        target: &Target,
        semaphore: Option<Arc<Semaphore>>,
    ) -> BoxFuture<'static, StageCompletion> {
        // The graph owns a spec for every id it yields.
        let spec: StageSpec = self
            .graph
            .spec(id)
            .cloned()
            .unwrap_or_else(|| StageSpec::new(id));
        let runner = Arc::clone(&self.runner);
        let target = target.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            let stage_start = Instant::now();
            let outcome = runner.execute(&spec, &target).await;
            (outcome, stage_start.elapsed().as_secs_f64() * 1000.0)
        });

        async move { (id, handle.await) }.boxed()
    }
}
