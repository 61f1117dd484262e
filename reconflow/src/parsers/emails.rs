//! Harvested-email document parsing.
//!
//! The artifact is a single JSON object; the `emails` field holds the
//! harvested addresses. A missing field yields an empty sequence, not an
//! error.

use crate::core::CanonicalRecord;
use serde_json::Value;

/// Parses the email-harvest document.
#[must_use]
pub fn parse_email_document(raw: &str) -> Vec<CanonicalRecord> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let document: Value = match serde_json::from_str(trimmed) {
        Ok(document) => document,
        Err(error) => {
            return vec![CanonicalRecord::unparsed_with_error(
                trimmed,
                error.to_string(),
            )];
        }
    };

    let Some(emails) = document.get("emails").and_then(Value::as_array) else {
        return Vec::new();
    };

    emails
        .iter()
        .filter_map(Value::as_str)
        .map(|address| CanonicalRecord::Email {
            address: address.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_emails() {
        let raw = r#"{"emails": ["a@example.com", "b@example.com"], "hosts": []}"#;
        let records = parse_email_document(raw);

        assert_eq!(
            records,
            vec![
                CanonicalRecord::Email {
                    address: "a@example.com".to_string()
                },
                CanonicalRecord::Email {
                    address: "b@example.com".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_field_yields_empty() {
        assert!(parse_email_document(r#"{"hosts": ["x"]}"#).is_empty());
        assert!(parse_email_document("{}").is_empty());
    }

    #[test]
    fn test_undecodable_document_is_single_unparsed() {
        let records = parse_email_document("{not json");
        assert_eq!(records.len(), 1);
        assert!(records[0].is_unparsed());
    }

    #[test]
    fn test_non_string_entries_dropped() {
        let raw = r#"{"emails": ["a@example.com", 42, null]}"#;
        let records = parse_email_document(raw);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_email_document("").is_empty());
        assert!(parse_email_document("   \n").is_empty());
    }
}
