//! Plain line-list parsing for subdomain artifacts.

use crate::core::CanonicalRecord;

/// Parses a plain list of hostnames, one per line. Blank lines are
/// dropped; everything else is taken verbatim.
#[must_use]
pub fn parse_subdomains(raw: &str, resolved: bool) -> Vec<CanonicalRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| CanonicalRecord::Subdomain {
            hostname: line.to_string(),
            resolved,
        })
        .collect()
}
