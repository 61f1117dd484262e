//! Bracketed vulnerability line grammars.
//!
//! Two grammars feed the same `Vulnerability` record and are kept as
//! distinct strategies because the artifacts carry no format version tag:
//!
//! - active scan: `[type] [protocol] [severity] target [evidence]? [extra]? [method]?`
//! - DAST scan:   `[type] [protocol] [severity] [extra] target [evidence]?`,
//!   with a fallback attempt that has no `[extra]` field
//!
//! Bracketed fields may themselves contain brackets (evidence is often a
//! list-literal), so the grammar is best-effort: the trailing groups are
//! consumed with a balance-aware scanner, and any line that defeats the
//! grammar becomes `Unparsed`.

use crate::core::CanonicalRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// Leading fields of an active-scan line: three bracketed fields and the
/// bare target token. Trailing groups are scanned separately.
static ACTIVE_HEAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.*?)\] \[(.*?)\] \[(.*?)\] (\S+)").expect("active-scan grammar compiles")
});

/// Primary DAST attempt: `extra` precedes the target.
static DAST_PRIMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.*?)\] \[(.*?)\] \[(.*?)\] \[(.*?)\] (\S+)(?: (\[.*\]))?")
        .expect("DAST grammar compiles")
});

/// Fallback DAST attempt without the `extra` field.
static DAST_FALLBACK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(.*?)\] \[(.*?)\] \[(.*?)\] (\S+)(?: (\[.*\]))?")
        .expect("DAST fallback grammar compiles")
});

static CTRL_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\t\n\r]+").expect("control-run pattern compiles"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").expect("space-run pattern compiles"));

/// Normalizes evidence text: tab/newline/carriage-return runs collapse to
/// one space, repeated spaces collapse to one, and the result is trimmed.
#[must_use]
pub fn clean_evidence_text(text: &str) -> String {
    let collapsed = CTRL_RUNS.replace_all(text, " ");
    let collapsed = SPACE_RUNS.replace_all(&collapsed, " ");
    collapsed.trim().to_string()
}

/// Parses active-scan vulnerability lines.
#[must_use]
pub fn parse_active_scan(raw: &str) -> Vec<CanonicalRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_active_line)
        .collect()
}

/// Parses DAST-scan vulnerability lines, trying the `extra`-bearing field
/// order first and the shorter order second.
#[must_use]
pub fn parse_dast_scan(raw: &str) -> Vec<CanonicalRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_dast_line)
        .collect()
}

fn parse_active_line(line: &str) -> CanonicalRecord {
    let Some(captures) = ACTIVE_HEAD.captures(line) else {
        return CanonicalRecord::unparsed(line);
    };

    let head_end = captures.get(0).map_or(0, |m| m.end());
    let groups = bracket_groups(&line[head_end..], 3);

    CanonicalRecord::Vulnerability {
        kind: captures[1].to_string(),
        protocol: captures[2].to_string(),
        severity: captures[3].to_string(),
        target: captures[4].to_string(),
        evidence: groups.first().map(|g| parse_evidence(g)).unwrap_or_default(),
        extra: groups.get(1).cloned(),
        method: groups.get(2).cloned(),
    }
}

fn parse_dast_line(line: &str) -> CanonicalRecord {
    if let Some(captures) = DAST_PRIMARY.captures(line) {
        return CanonicalRecord::Vulnerability {
            kind: captures[1].to_string(),
            protocol: captures[2].to_string(),
            severity: captures[3].to_string(),
            target: captures[5].to_string(),
            evidence: captures
                .get(6)
                .map(|m| parse_evidence(m.as_str()))
                .unwrap_or_default(),
            extra: Some(captures[4].to_string()),
            method: None,
        };
    }

    if let Some(captures) = DAST_FALLBACK.captures(line) {
        return CanonicalRecord::Vulnerability {
            kind: captures[1].to_string(),
            protocol: captures[2].to_string(),
            severity: captures[3].to_string(),
            target: captures[4].to_string(),
            evidence: captures
                .get(5)
                .map(|m| parse_evidence(m.as_str()))
                .unwrap_or_default(),
            extra: None,
            method: None,
        };
    }

    CanonicalRecord::unparsed(line)
}

/// Scans up to `max` whitespace-separated bracket groups, counting
/// nesting depth so a group may contain brackets of its own. A bare
/// token or an unbalanced group ends consumption.
fn bracket_groups(rest: &str, max: usize) -> Vec<String> {
    let mut groups = Vec::new();
    let mut depth = 0usize;
    let mut start = None;

    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    start = Some(idx);
                }
                depth += 1;
            }
            ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(group_start) = start.take() {
                        groups.push(rest[group_start..=idx].to_string());
                        if groups.len() == max {
                            break;
                        }
                    }
                }
            }
            c if depth == 0 && !c.is_whitespace() => break,
            _ => {}
        }
    }

    groups
}

/// Converts one evidence group (outer brackets included) into cleaned
/// strings. The content is either a list-literal, whose quoted items are
/// unquoted and cleaned individually, or a single string.
fn parse_evidence(group: &str) -> Vec<String> {
    let inner = group
        .strip_prefix('[')
        .and_then(|g| g.strip_suffix(']'))
        .unwrap_or(group)
        .trim();

    // A list-literal nests one more bracket level.
    let items_src = if inner.len() >= 2 && inner.starts_with('[') && inner.ends_with(']') {
        inner[1..inner.len() - 1].trim()
    } else {
        inner
    };

    if items_src.is_empty() {
        return Vec::new();
    }

    split_top_level(items_src)
        .into_iter()
        .map(|item| clean_evidence_text(strip_quotes(item.trim())))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Splits on commas outside quotes and outside nested brackets.
fn split_top_level(src: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (idx, ch) in src.char_indices() {
        match ch {
            '\'' | '"' => match quote {
                Some(open) if open == ch => quote = None,
                None => quote = Some(ch),
                Some(_) => {}
            },
            '[' if quote.is_none() => depth += 1,
            ']' if quote.is_none() && depth > 0 => depth -= 1,
            ',' if quote.is_none() && depth == 0 => {
                items.push(&src[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }

    items.push(&src[start..]);
    items
}

fn strip_quotes(item: &str) -> &str {
    for quote in ['\'', '"'] {
        if item.len() >= 2 && item.starts_with(quote) && item.ends_with(quote) {
            return &item[1..item.len() - 1];
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vulnerability(record: &CanonicalRecord) -> (&str, &str, &str, &str, &[String]) {
        match record {
            CanonicalRecord::Vulnerability {
                kind,
                protocol,
                severity,
                target,
                evidence,
                ..
            } => (kind, protocol, severity, target, evidence),
            other => panic!("expected vulnerability, got {other:?}"),
        }
    }

    #[test]
    fn test_active_line_with_all_trailing_groups() {
        let line = "[xss] [http] [high] http://ex.com/a [['<script>']] [extra] [GET]";
        let records = parse_active_scan(line);
        assert_eq!(records.len(), 1);

        let (kind, protocol, severity, target, evidence) = vulnerability(&records[0]);
        assert_eq!(kind, "xss");
        assert_eq!(protocol, "http");
        assert_eq!(severity, "high");
        assert_eq!(target, "http://ex.com/a");
        assert_eq!(evidence, ["<script>"]);

        match &records[0] {
            CanonicalRecord::Vulnerability { extra, method, .. } => {
                assert_eq!(extra.as_deref(), Some("[extra]"));
                assert_eq!(method.as_deref(), Some("[GET]"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_active_line_minimal() {
        let line = "[sqli] [http] [critical] https://ex.com/q";
        let records = parse_active_scan(line);

        let (kind, _, severity, target, evidence) = vulnerability(&records[0]);
        assert_eq!(kind, "sqli");
        assert_eq!(severity, "critical");
        assert_eq!(target, "https://ex.com/q");
        assert!(evidence.is_empty());
    }

    #[test]
    fn test_active_evidence_list_literal() {
        let line = "[exposure] [http] [info] https://ex.com [[first, second, third]]";
        let records = parse_active_scan(line);

        let (.., evidence) = vulnerability(&records[0]);
        assert_eq!(evidence, ["first", "second", "third"]);
    }

    #[test]
    fn test_active_evidence_single_string() {
        let line = "[exposure] [http] [info] https://ex.com [server: nginx]";
        let records = parse_active_scan(line);

        let (.., evidence) = vulnerability(&records[0]);
        assert_eq!(evidence, ["server: nginx"]);
    }

    #[test]
    fn test_active_non_matching_line_is_unparsed() {
        let records = parse_active_scan("no brackets here");
        assert_eq!(records, vec![CanonicalRecord::unparsed("no brackets here")]);
    }

    #[test]
    fn test_dast_primary_order() {
        let line = "[lfi] [http] [high] [CVE-2021-0001] https://ex.com/read [../etc/passwd]";
        let records = parse_dast_scan(line);

        let (kind, protocol, severity, target, evidence) = vulnerability(&records[0]);
        assert_eq!(kind, "lfi");
        assert_eq!(protocol, "http");
        assert_eq!(severity, "high");
        assert_eq!(target, "https://ex.com/read");
        assert_eq!(evidence, ["../etc/passwd"]);

        match &records[0] {
            CanonicalRecord::Vulnerability { extra, .. } => {
                assert_eq!(extra.as_deref(), Some("CVE-2021-0001"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_dast_fallback_without_extra() {
        let line = "[rxss] [http] [medium] https://ex.com/s";
        let records = parse_dast_scan(line);

        let (kind, _, _, target, _) = vulnerability(&records[0]);
        assert_eq!(kind, "rxss");
        assert_eq!(target, "https://ex.com/s");

        match &records[0] {
            CanonicalRecord::Vulnerability { extra, .. } => assert!(extra.is_none()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_dast_garbage_line_is_unparsed() {
        let records = parse_dast_scan("] broken [ line");
        assert!(records[0].is_unparsed());
    }

    #[test]
    fn test_clean_evidence_text() {
        assert_eq!(clean_evidence_text("a\t\tb"), "a b");
        assert_eq!(clean_evidence_text("a\r\nb"), "a b");
        assert_eq!(clean_evidence_text("   leading   and    inner"), "leading and inner");
        assert_eq!(clean_evidence_text("trailing \n"), "trailing");
        assert_eq!(clean_evidence_text(""), "");
    }

    #[test]
    fn test_evidence_cleaning_applies_to_items() {
        let line = "[t] [http] [low] https://ex.com [['  a\tb ', 'c\nd']]";
        let records = parse_active_scan(line);

        let (.., evidence) = vulnerability(&records[0]);
        assert_eq!(evidence, ["a b", "c d"]);
    }

    #[test]
    fn test_bracket_groups_stop_at_bare_token() {
        let groups = bracket_groups(" [one] trailing [two]", 3);
        assert_eq!(groups, ["[one]"]);
    }

    #[test]
    fn test_bracket_groups_unbalanced_ignored() {
        let groups = bracket_groups(" [one] [never closed", 3);
        assert_eq!(groups, ["[one]"]);
    }

    #[test]
    fn test_mixed_file_never_drops_parsable_lines() {
        let raw = "\
[xss] [http] [high] http://a.ex.com [payload]
garbage
[ssrf] [http] [medium] http://b.ex.com";
        let records = parse_active_scan(raw);

        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], CanonicalRecord::Vulnerability { .. }));
        assert!(records[1].is_unparsed());
        assert!(matches!(records[2], CanonicalRecord::Vulnerability { .. }));
    }
}
