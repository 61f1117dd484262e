//! Directory-fuzz line grammar: `<path> (Status: <code>)`.

use crate::core::CanonicalRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a fuzzed path and its status code. Trailing decorations such
/// as `[Size: 921]` are ignored.
static DIR_ENTRY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?) \(Status: (\d+)\)").expect("directory-fuzz grammar compiles")
});

/// Parses directory-fuzz output lines; anything not matching the grammar
/// becomes `Unparsed` with the raw text preserved.
#[must_use]
pub fn parse_directory_entries(raw: &str) -> Vec<CanonicalRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let Some(captures) = DIR_ENTRY.captures(line) else {
                return CanonicalRecord::unparsed(line);
            };
            let Ok(status) = captures[2].parse::<u16>() else {
                return CanonicalRecord::unparsed(line);
            };
            CanonicalRecord::DirectoryEntry {
                path: captures[1].trim().to_string(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_basic_entry() {
        let records = parse_directory_entries("/admin (Status: 200)");
        assert_eq!(
            records,
            vec![CanonicalRecord::DirectoryEntry {
                path: "/admin".to_string(),
                status: 200,
            }]
        );
    }

    #[test]
    fn test_entry_with_size_suffix() {
        let records = parse_directory_entries("/.git/                (Status: 301) [Size: 921]");
        assert_eq!(
            records,
            vec![CanonicalRecord::DirectoryEntry {
                path: "/.git/".to_string(),
                status: 301,
            }]
        );
    }

    #[test]
    fn test_line_without_status_is_unparsed() {
        let records = parse_directory_entries("/admin");
        assert_eq!(records, vec![CanonicalRecord::unparsed("/admin")]);
    }

    #[test]
    fn test_mixed_lines() {
        let raw = "/login (Status: 200)\nProgress: 4021 / 20469\n/api (Status: 403)\n";
        let records = parse_directory_entries(raw);

        assert_eq!(records.len(), 3);
        assert!(matches!(records[0], CanonicalRecord::DirectoryEntry { .. }));
        assert!(records[1].is_unparsed());
        assert!(matches!(records[2], CanonicalRecord::DirectoryEntry { .. }));
    }

    #[test]
    fn test_overlong_status_is_unparsed() {
        let records = parse_directory_entries("/x (Status: 99999)");
        assert!(records[0].is_unparsed());
    }
}
