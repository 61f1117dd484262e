//! Report aggregation.
//!
//! Strictly a read-side composition over whatever artifacts already
//! exist: for every artifact kind the aggregator checks existence,
//! parses if present, and inserts the record sequence (an empty one when
//! the artifact is missing or unreadable). It never invokes the
//! scheduler or a runner, so repeated reads of the same run are
//! idempotent.

use crate::core::CanonicalRecord;
use crate::parsers::parse_artifact;
use crate::pipeline::StageId;
use crate::store::{ArtifactKind, ArtifactStore, Target};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// The per-target aggregate of canonical records across all artifacts.
///
/// Every artifact kind is present as a section; a stage that never ran
/// contributes an empty sequence, not an absent key.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// The target the report describes.
    pub target: String,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
    /// Ordered record sequences, one per artifact kind.
    pub sections: BTreeMap<ArtifactKind, Vec<CanonicalRecord>>,
}

impl Report {
    /// The records of one artifact section.
    #[must_use]
    pub fn records(&self, kind: ArtifactKind) -> &[CanonicalRecord] {
        self.sections.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// The records of a stage's declared output artifact.
    #[must_use]
    pub fn stage_records(&self, stage: StageId) -> &[CanonicalRecord] {
        self.records(stage.output_kind())
    }

    /// Total number of records across all sections.
    #[must_use]
    pub fn total_records(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }
}

/// Builds [`Report`]s from the artifact store.
#[derive(Debug, Clone)]
pub struct Aggregator {
    store: ArtifactStore,
}

impl Aggregator {
    /// Creates an aggregator over a store.
    #[must_use]
    pub fn new(store: ArtifactStore) -> Self {
        Self { store }
    }

    /// Assembles the report for a target from the artifacts present at
    /// read time. Never mutates the store and never fails: an unreadable
    /// artifact degrades to an empty section with a diagnostic.
    #[must_use]
    pub fn build_report(&self, target: &Target) -> Report {
        let mut sections = BTreeMap::new();

        for kind in ArtifactKind::ALL {
            let records = if self.store.exists(target, kind) {
                match self.store.read(target, kind) {
                    Ok(raw) => parse_artifact(kind, &raw),
                    Err(error) => {
                        tracing::warn!(artifact = %kind, %error, "artifact unreadable, section left empty");
                        Vec::new()
                    }
                }
            } else {
                Vec::new()
            };
            sections.insert(kind, records);
        }

        Report {
            target: target.to_string(),
            generated_at: Utc::now(),
            sections,
        }
    }
}
