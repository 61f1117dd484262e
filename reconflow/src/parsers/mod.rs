//! Result parsers: raw artifact bytes to canonical records.
//!
//! One parser per artifact shape. Every parser is a pure function and
//! never fails on malformed input; a line that does not match its
//! expected grammar becomes an `Unparsed` record carrying the original
//! text, so one bad line never discards the rest of the file.

mod dirfuzz;
mod emails;
mod jsonl;
mod lines;
mod vulns;

pub use dirfuzz::parse_directory_entries;
pub use emails::parse_email_document;
pub use jsonl::{parse_endpoints, parse_http_services, parse_open_ports};
pub use lines::parse_subdomains;
pub use vulns::{clean_evidence_text, parse_active_scan, parse_dast_scan};

use crate::core::CanonicalRecord;
use crate::store::ArtifactKind;

/// Parses an artifact's contents with the parser matching its kind.
#[must_use]
pub fn parse_artifact(kind: ArtifactKind, raw: &str) -> Vec<CanonicalRecord> {
    match kind {
        ArtifactKind::ResolvedSubdomains => parse_subdomains(raw, true),
        ArtifactKind::AllSubdomains => parse_subdomains(raw, false),
        ArtifactKind::OpenPorts => parse_open_ports(raw),
        ArtifactKind::HttpServices => parse_http_services(raw),
        ArtifactKind::DirectoryFuzz => parse_directory_entries(raw),
        ArtifactKind::Endpoints => parse_endpoints(raw),
        ArtifactKind::ActiveVulns => parse_active_scan(raw),
        ArtifactKind::DastVulns => parse_dast_scan(raw),
        ArtifactKind::Emails => parse_email_document(raw),
    }
}
