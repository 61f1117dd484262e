//! JSON-lines parsing for port, HTTP-probe, and endpoint artifacts.
//!
//! Each non-empty line is decoded independently. A line that fails to
//! decode, or decodes without its required fields, becomes `Unparsed`;
//! the file is never rejected wholesale.

use crate::core::CanonicalRecord;
use serde_json::{Map, Value};

/// Decodes each non-empty line as a JSON object and converts it with
/// `to_record`; `None` from the converter means required fields were
/// missing and the line falls back to `Unparsed`.
fn parse_json_lines<F>(raw: &str, to_record: F) -> Vec<CanonicalRecord>
where
    F: Fn(Map<String, Value>) -> Option<CanonicalRecord>,
{
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(object)) => to_record(object).unwrap_or_else(|| {
                CanonicalRecord::unparsed_with_error(line, "missing required field")
            }),
            Ok(_) => CanonicalRecord::unparsed_with_error(line, "expected a JSON object"),
            Err(error) => CanonicalRecord::unparsed_with_error(line, error.to_string()),
        })
        .collect()
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            // Put non-string values back so they stay in the metadata.
            object.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn take_port(object: &mut Map<String, Value>, key: &str) -> Option<u16> {
    let value = object.get(key)?.as_u64()?;
    let port = u16::try_from(value).ok()?;
    object.remove(key);
    Some(port)
}

/// Parses open-port records: JSON-lines with at least `host` and `port`.
#[must_use]
pub fn parse_open_ports(raw: &str) -> Vec<CanonicalRecord> {
    parse_json_lines(raw, |mut object| {
        let host = take_string(&mut object, "host")?;
        let port = take_port(&mut object, "port")?;
        Some(CanonicalRecord::OpenPort {
            host,
            port,
            metadata: object,
        })
    })
}

/// Parses HTTP-probe records: JSON-lines with a `url` field and optional
/// `status_code` and `title`.
#[must_use]
pub fn parse_http_services(raw: &str) -> Vec<CanonicalRecord> {
    parse_json_lines(raw, |mut object| {
        let url = take_string(&mut object, "url")?;
        let status_code = take_port(&mut object, "status_code");
        let title = take_string(&mut object, "title");
        Some(CanonicalRecord::HttpService {
            url,
            status_code,
            title,
            metadata: object,
        })
    })
}

/// Parses discovered-endpoint records: JSON-lines with a `url` field.
#[must_use]
pub fn parse_endpoints(raw: &str) -> Vec<CanonicalRecord> {
    parse_json_lines(raw, |mut object| {
        let url = take_string(&mut object, "url")?;
        Some(CanonicalRecord::Endpoint { url })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_ports_basic() {
        let raw = r#"{"host":"mail.example.com","port":25,"ip":"10.0.0.3"}"#;
        let records = parse_open_ports(raw);

        assert_eq!(records.len(), 1);
        match &records[0] {
            CanonicalRecord::OpenPort {
                host,
                port,
                metadata,
            } => {
                assert_eq!(host, "mail.example.com");
                assert_eq!(*port, 25);
                assert_eq!(metadata.get("ip").and_then(Value::as_str), Some("10.0.0.3"));
            }
            other => panic!("expected open port, got {other:?}"),
        }
    }

    #[test]
    fn test_one_valid_one_garbage_line() {
        let raw = "{\"host\":\"a.example.com\",\"port\":443}\nnot json at all\n";
        let records = parse_open_ports(raw);

        assert_eq!(records.len(), 2);
        assert!(matches!(records[0], CanonicalRecord::OpenPort { .. }));
        match &records[1] {
            CanonicalRecord::Unparsed { raw, error } => {
                assert_eq!(raw, "not json at all");
                assert!(error.is_some());
            }
            other => panic!("expected unparsed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field_falls_back() {
        let raw = r#"{"port":8080}"#;
        let records = parse_open_ports(raw);

        assert_eq!(records.len(), 1);
        assert!(records[0].is_unparsed());
    }

    #[test]
    fn test_port_out_of_range_falls_back() {
        let raw = r#"{"host":"a.example.com","port":123456}"#;
        let records = parse_open_ports(raw);
        assert!(records[0].is_unparsed());
    }

    #[test]
    fn test_non_object_line_falls_back() {
        let records = parse_open_ports("42\n");
        assert!(records[0].is_unparsed());
    }

    #[test]
    fn test_http_services() {
        let raw = concat!(
            r#"{"url":"https://example.com:8443","status_code":200,"title":"Home","webserver":"nginx"}"#,
            "\n",
            r#"{"url":"https://dev.example.com"}"#,
            "\n",
        );
        let records = parse_http_services(raw);

        assert_eq!(records.len(), 2);
        match &records[0] {
            CanonicalRecord::HttpService {
                url,
                status_code,
                title,
                metadata,
            } => {
                assert_eq!(url, "https://example.com:8443");
                assert_eq!(*status_code, Some(200));
                assert_eq!(title.as_deref(), Some("Home"));
                assert_eq!(
                    metadata.get("webserver").and_then(Value::as_str),
                    Some("nginx")
                );
            }
            other => panic!("expected http service, got {other:?}"),
        }
        match &records[1] {
            CanonicalRecord::HttpService {
                status_code, title, ..
            } => {
                assert!(status_code.is_none());
                assert!(title.is_none());
            }
            other => panic!("expected http service, got {other:?}"),
        }
    }

    #[test]
    fn test_endpoints() {
        let raw = "{\"url\":\"https://example.com/login\"}\n{\"path\":\"/no-url\"}\n";
        let records = parse_endpoints(raw);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            CanonicalRecord::Endpoint {
                url: "https://example.com/login".to_string()
            }
        );
        assert!(records[1].is_unparsed());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let raw = "\n\n{\"url\":\"https://example.com\"}\n\n";
        assert_eq!(parse_endpoints(raw).len(), 1);
    }
}
