//! Stage runner outcome type.

use super::StageStatus;
use serde::{Deserialize, Serialize};

/// The result of one stage runner invocation.
///
/// Success is judged by the presence of the declared output artifact after
/// the external process exits, but the exit code and captured stderr are
/// retained so a failed tool is not a diagnostic dead-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerOutcome {
    /// The terminal status the stage reached.
    pub status: StageStatus,

    /// The process exit code, when the process ran and reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Captured standard error from the external process.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,

    /// Skip reason or failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RunnerOutcome {
    /// Creates a completed outcome.
    #[must_use]
    pub fn completed(exit_code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Completed,
            exit_code,
            stderr: stderr.into(),
            detail: None,
        }
    }

    /// Creates a failed outcome with a description.
    #[must_use]
    pub fn failed(
        exit_code: Option<i32>,
        stderr: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            status: StageStatus::Failed,
            exit_code,
            stderr: stderr.into(),
            detail: Some(detail.into()),
        }
    }

    /// Creates a skipped outcome with a reason. No process was spawned.
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skipped,
            exit_code: None,
            stderr: String::new(),
            detail: Some(reason.into()),
        }
    }

    /// Returns true if the stage produced its artifact.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_outcome() {
        let outcome = RunnerOutcome::completed(Some(0), "");
        assert!(outcome.is_completed());
        assert_eq!(outcome.exit_code, Some(0));
        assert!(outcome.detail.is_none());
    }

    #[test]
    fn test_failed_outcome_keeps_stderr() {
        let outcome = RunnerOutcome::failed(Some(2), "connection refused", "no artifact produced");
        assert_eq!(outcome.status, StageStatus::Failed);
        assert_eq!(outcome.stderr, "connection refused");
        assert_eq!(outcome.detail.as_deref(), Some("no artifact produced"));
    }

    #[test]
    fn test_skipped_outcome() {
        let outcome = RunnerOutcome::skipped("missing input artifact");
        assert_eq!(outcome.status, StageStatus::Skipped);
        assert_eq!(outcome.exit_code, None);
        assert!(!outcome.is_completed());
    }
}
