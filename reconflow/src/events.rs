//! Stage lifecycle events.
//!
//! The scheduler reports what it is doing through an [`EventSink`] so
//! observability stays out of the scheduling logic. The default sink logs
//! through `tracing`; tests audit ordering with [`CollectingEventSink`].

use crate::pipeline::StageId;
use parking_lot::RwLock;
use serde::Serialize;

/// One scheduler lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A stage entered `Running`.
    StageStarted {
        /// The stage.
        stage: StageId,
    },
    /// A stage produced its artifact.
    StageCompleted {
        /// The stage.
        stage: StageId,
        /// Wall-clock stage duration in milliseconds.
        duration_ms: f64,
    },
    /// A stage ran but produced no artifact.
    StageFailed {
        /// The stage.
        stage: StageId,
        /// Exit code, when the process reported one.
        exit_code: Option<i32>,
    },
    /// A stage was skipped without running.
    StageSkipped {
        /// The stage.
        stage: StageId,
        /// Why it was skipped.
        reason: String,
    },
    /// Every stage reached a terminal state.
    PipelineCompleted {
        /// Wall-clock pipeline duration in milliseconds.
        duration_ms: f64,
        /// Number of stages that completed.
        completed: usize,
        /// Number of stages that failed.
        failed: usize,
        /// Number of stages that were skipped.
        skipped: usize,
    },
}

/// Trait for sinks receiving scheduler lifecycle events.
///
/// Implementations must never panic or block for long; the scheduler emits
/// from its hot path.
pub trait EventSink: Send + Sync {
    /// Receives one event.
    fn emit(&self, event: &PipelineEvent);
}

/// A sink that discards all events. The default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// A sink that logs events through the `tracing` framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage } => {
                tracing::info!(stage = %stage, "stage started");
            }
            PipelineEvent::StageCompleted { stage, duration_ms } => {
                tracing::info!(stage = %stage, duration_ms, "stage completed");
            }
            PipelineEvent::StageFailed { stage, exit_code } => {
                tracing::warn!(stage = %stage, ?exit_code, "stage failed");
            }
            PipelineEvent::StageSkipped { stage, reason } => {
                tracing::info!(stage = %stage, reason = %reason, "stage skipped");
            }
            PipelineEvent::PipelineCompleted {
                duration_ms,
                completed,
                failed,
                skipped,
            } => {
                tracing::info!(duration_ms, completed, failed, skipped, "pipeline completed");
            }
        }
    }
}

/// A sink that records every event, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &PipelineEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink() {
        NoOpEventSink.emit(&PipelineEvent::StageStarted {
            stage: StageId::SubdomainEnum,
        });
    }

    #[test]
    fn test_collecting_sink_preserves_order() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&PipelineEvent::StageStarted {
            stage: StageId::SubdomainEnum,
        });
        sink.emit(&PipelineEvent::StageCompleted {
            stage: StageId::SubdomainEnum,
            duration_ms: 12.0,
        });

        let events = sink.events();
        assert_eq!(sink.len(), 2);
        assert!(matches!(events[0], PipelineEvent::StageStarted { .. }));
        assert!(matches!(events[1], PipelineEvent::StageCompleted { .. }));
    }
}
