//! # Reconflow
//!
//! Dependency-ordered reconnaissance automation against a target domain.
//!
//! Reconflow drives a fixed pipeline of external scanning tools and
//! normalizes their loosely-structured output into a per-target report:
//!
//! - **Stage graph**: a hand-authored DAG of scanning stages (subdomain
//!   discovery, port scanning, HTTP probing, content fuzzing, endpoint
//!   discovery, vulnerability scanning, email harvesting)
//! - **Scheduler**: launches stages concurrently as soon as their
//!   dependencies complete, skipping branches whose inputs failed
//! - **Stage runner**: invokes one external process per stage; success is
//!   judged by artifact presence, not exit code
//! - **Result parsers**: tolerant per-shape parsers that never reject a
//!   whole artifact because of one malformed line
//! - **Aggregator**: read-only assembly of all parsed artifacts into a
//!   [`report::Report`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reconflow::prelude::*;
//!
//! let config = ReconConfig::from_env();
//! let pipeline = Pipeline::new(config)?;
//! let run = pipeline.run(&Target::new("example.com")?).await?;
//! println!("{}", serde_json::to_string_pretty(&run.report)?);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod parsers;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ReconConfig;
    pub use crate::core::{CanonicalRecord, RunnerOutcome, StageStatus};
    pub use crate::errors::{GraphValidationError, ReconError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::pipeline::{
        Pipeline, PipelineRun, RunSummary, Scheduler, StageGraph, StageId, StageSpec,
    };
    pub use crate::report::{Aggregator, Report};
    pub use crate::runner::{CommandRegistry, CommandRunner, StageRunner};
    pub use crate::store::{ArtifactKind, ArtifactStore, Target};
}
