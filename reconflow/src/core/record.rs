//! Canonical record vocabulary.
//!
//! Every artifact line that the parsers understand becomes one of these
//! variants; anything that fails its expected grammar becomes [`Unparsed`]
//! so a single bad line never discards the rest of the file.
//!
//! [`Unparsed`]: CanonicalRecord::Unparsed

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized, typed representation of one line/entry from a raw artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum CanonicalRecord {
    /// A discovered subdomain.
    Subdomain {
        /// The hostname as listed in the artifact.
        hostname: String,
        /// Whether the hostname came from the resolved list.
        resolved: bool,
    },

    /// An open port on a discovered host.
    OpenPort {
        /// The host the port was found on.
        host: String,
        /// The open port number.
        port: u16,
        /// Any additional fields the scanner reported.
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        metadata: Map<String, Value>,
    },

    /// A live HTTP service.
    HttpService {
        /// The probed URL.
        url: String,
        /// HTTP status code, when reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        /// Page title, when reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Any additional fields the prober reported.
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        metadata: Map<String, Value>,
    },

    /// A path discovered by content fuzzing.
    DirectoryEntry {
        /// The fuzzed path.
        path: String,
        /// The HTTP status code returned for the path.
        status: u16,
    },

    /// A discovered URL/endpoint.
    Endpoint {
        /// The endpoint URL.
        url: String,
    },

    /// One vulnerability finding from an active or DAST scan.
    Vulnerability {
        /// The finding type (template/check identifier).
        #[serde(rename = "type")]
        kind: String,
        /// The protocol the finding was observed over.
        protocol: String,
        /// Reported severity.
        severity: String,
        /// The affected target or URL.
        target: String,
        /// Cleaned evidence strings, possibly empty.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        evidence: Vec<String>,
        /// Optional extra tag, verbatim from the line.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        extra: Option<String>,
        /// Optional HTTP method tag, verbatim from the line.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        method: Option<String>,
    },

    /// A harvested email address.
    Email {
        /// The address.
        address: String,
    },

    /// A line that did not match its expected grammar.
    Unparsed {
        /// The original line, preserved verbatim.
        raw: String,
        /// The decode/parse error, when one was produced.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl CanonicalRecord {
    /// Creates an [`Unparsed`](Self::Unparsed) record from a raw line.
    #[must_use]
    pub fn unparsed(raw: impl Into<String>) -> Self {
        Self::Unparsed {
            raw: raw.into(),
            error: None,
        }
    }

    /// Creates an [`Unparsed`](Self::Unparsed) record carrying a decode error.
    #[must_use]
    pub fn unparsed_with_error(raw: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Unparsed {
            raw: raw.into(),
            error: Some(error.into()),
        }
    }

    /// Returns true if this record is the fallback variant.
    #[must_use]
    pub fn is_unparsed(&self) -> bool {
        matches!(self, Self::Unparsed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tagged_serialization() {
        let record = CanonicalRecord::Subdomain {
            hostname: "api.example.com".to_string(),
            resolved: true,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["record"], "subdomain");
        assert_eq!(json["hostname"], "api.example.com");
        assert_eq!(json["resolved"], true);
    }

    #[test]
    fn test_vulnerability_type_field_rename() {
        let record = CanonicalRecord::Vulnerability {
            kind: "xss".to_string(),
            protocol: "http".to_string(),
            severity: "high".to_string(),
            target: "http://example.com".to_string(),
            evidence: vec!["<script>".to_string()],
            extra: None,
            method: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "xss");
        assert!(json.get("kind").is_none());
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn test_unparsed_helpers() {
        let plain = CanonicalRecord::unparsed("garbage line");
        assert!(plain.is_unparsed());

        let with_error = CanonicalRecord::unparsed_with_error("{bad json", "EOF while parsing");
        match with_error {
            CanonicalRecord::Unparsed { raw, error } => {
                assert_eq!(raw, "{bad json");
                assert_eq!(error.as_deref(), Some("EOF while parsing"));
            }
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_record_roundtrip() {
        let record = CanonicalRecord::OpenPort {
            host: "mail.example.com".to_string(),
            port: 25,
            metadata: Map::new(),
        };

        let json = serde_json::to_string(&record).unwrap();
        let back: CanonicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
