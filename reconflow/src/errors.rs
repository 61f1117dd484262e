//! Error types for the reconflow pipeline.
//!
//! The taxonomy mirrors the propagation policy: errors local to one line or
//! one stage never escalate to abort the pipeline or the report. Most
//! variants here are recorded and logged rather than returned up the stack.

use crate::pipeline::StageId;
use crate::store::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for reconflow operations.
#[derive(Debug, Error)]
pub enum ReconError {
    /// A stage graph failed validation.
    #[error("{0}")]
    Validation(#[from] GraphValidationError),

    /// A stage's required input artifact is absent. Resolved by skipping
    /// the stage; never fatal to the run.
    #[error("stage '{stage}' is missing required input artifact '{artifact}'")]
    MissingInput {
        /// The stage that could not start.
        stage: StageId,
        /// The absent input artifact.
        artifact: ArtifactKind,
    },

    /// An invoked process exited abnormally or produced no artifact.
    #[error("stage '{stage}' produced no artifact{}", exit_code.map(|code| format!(" (exit code {code})")).unwrap_or_default())]
    ProcessFailure {
        /// The failed stage.
        stage: StageId,
        /// Exit code, when the process reported one.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// An artifact could not be opened or read at aggregation time.
    #[error("failed to read artifact {}: {source}", path.display())]
    ArtifactRead {
        /// The artifact path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The target domain is not usable as an artifact file prefix.
    #[error("invalid target '{0}'")]
    InvalidTarget(String),

    /// No primary artifact exists for the target, so no report can be
    /// produced. The only user-visible failure of a run.
    #[error("no report could be produced for '{0}': primary artifact absent")]
    NoReport(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error raised when stage graph validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GraphValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<StageId>,
}

impl GraphValidationError {
    /// Creates a new graph validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<StageId>) -> Self {
        self.stages = stages;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_input_message() {
        let err = ReconError::MissingInput {
            stage: StageId::PortScan,
            artifact: ArtifactKind::ResolvedSubdomains,
        };
        let msg = err.to_string();
        assert!(msg.contains("port_scan"));
        assert!(msg.contains("subdomain"));
    }

    #[test]
    fn test_validation_error_stages() {
        let err = GraphValidationError::new("cycle detected")
            .with_stages(vec![StageId::PortScan, StageId::HttpProbe]);
        assert_eq!(err.stages.len(), 2);
        assert_eq!(err.to_string(), "cycle detected");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ReconError = io.into();
        assert!(matches!(err, ReconError::Io(_)));
    }
}
