//! Artifact store: the file naming convention shared by stage runners and
//! result parsers.
//!
//! Artifacts live in one flat directory and are named
//! `{target}_{suffix}`, one file per artifact kind. The store does path
//! resolution, existence testing, and reads; nothing else. Artifacts are
//! write-once-then-read-only per run, so no locking is needed here.

use crate::errors::ReconError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A target domain, the unit of work for one pipeline run.
///
/// Validated on construction so it is always usable as a file-name prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Creates a target from a domain name.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::InvalidTarget`] for empty input, whitespace,
    /// path separators, or a leading dash (which external tools would
    /// read as a flag).
    pub fn new(domain: impl Into<String>) -> Result<Self, ReconError> {
        let domain = domain.into();
        let trimmed = domain.trim();

        if trimmed.is_empty()
            || trimmed.starts_with('-')
            || trimmed
                .chars()
                .any(|c| c.is_whitespace() || c == '/' || c == '\\')
        {
            return Err(ReconError::InvalidTarget(domain));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kinds of artifact a run can produce, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Resolved subdomain list, plain lines. The primary artifact: its
    /// presence defines a completed run.
    ResolvedSubdomains,
    /// Combined (resolved + unresolved) subdomain list, plain lines.
    AllSubdomains,
    /// Open-port records, JSON-lines with `host` and `port` fields.
    OpenPorts,
    /// HTTP-probe records, JSON-lines.
    HttpServices,
    /// Directory-fuzz entries, `<path> (Status: <code>)` line grammar.
    DirectoryFuzz,
    /// Discovered-endpoint records, JSON-lines with a `url` field.
    Endpoints,
    /// Active-vulnerability entries, bracketed line grammar.
    ActiveVulns,
    /// DAST-vulnerability entries, bracketed line grammar with the
    /// alternate field order.
    DastVulns,
    /// Harvested-email document, a single JSON object with an `emails`
    /// array.
    Emails,
}

impl ArtifactKind {
    /// Every artifact kind, in report section order.
    pub const ALL: [Self; 9] = [
        Self::ResolvedSubdomains,
        Self::AllSubdomains,
        Self::OpenPorts,
        Self::HttpServices,
        Self::DirectoryFuzz,
        Self::Endpoints,
        Self::ActiveVulns,
        Self::DastVulns,
        Self::Emails,
    ];

    /// The file-name suffix for this kind, including extension.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::ResolvedSubdomains => "subdomain.txt",
            Self::AllSubdomains => "overall_subdomain.txt",
            Self::OpenPorts => "naabu.json",
            Self::HttpServices => "httpx.json",
            Self::DirectoryFuzz => "directory_fuzz.json",
            Self::Endpoints => "urlfinder.json",
            Self::ActiveVulns => "nuclei.json",
            Self::DastVulns => "vulnerabilities.json",
            Self::Emails => "emails.json",
        }
    }

    /// The artifact file name for a target.
    #[must_use]
    pub fn file_name(self, target: &Target) -> String {
        format!("{}_{}", target, self.suffix())
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Maps `(target, artifact kind)` to paths in the shared output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if it does not exist.
    pub fn ensure_root(&self) -> Result<(), ReconError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// The path of an artifact for a target.
    #[must_use]
    pub fn path(&self, target: &Target, kind: ArtifactKind) -> PathBuf {
        self.root.join(kind.file_name(target))
    }

    /// Returns true if the artifact exists.
    #[must_use]
    pub fn exists(&self, target: &Target, kind: ArtifactKind) -> bool {
        self.path(target, kind).is_file()
    }

    /// Reads an artifact's contents.
    ///
    /// # Errors
    ///
    /// Returns [`ReconError::ArtifactRead`] when the file cannot be opened
    /// or read.
    pub fn read(&self, target: &Target, kind: ArtifactKind) -> Result<String, ReconError> {
        let path = self.path(target, kind);
        fs::read_to_string(&path).map_err(|source| ReconError::ArtifactRead { path, source })
    }

    /// Returns true if a completed run exists for the target, defined by
    /// presence of the primary artifact (the resolved subdomain list).
    #[must_use]
    pub fn has_completed_run(&self, target: &Target) -> bool {
        self.exists(target, ArtifactKind::ResolvedSubdomains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn target() -> Target {
        Target::new("example.com").unwrap()
    }

    #[test]
    fn test_target_validation() {
        assert!(Target::new("example.com").is_ok());
        assert!(Target::new("  example.com  ").is_ok());
        assert!(Target::new("").is_err());
        assert!(Target::new("   ").is_err());
        assert!(Target::new("-d").is_err());
        assert!(Target::new("a/b").is_err());
        assert!(Target::new("two words").is_err());
    }

    #[test]
    fn test_naming_convention() {
        assert_eq!(
            ArtifactKind::ResolvedSubdomains.file_name(&target()),
            "example.com_subdomain.txt"
        );
        assert_eq!(
            ArtifactKind::OpenPorts.file_name(&target()),
            "example.com_naabu.json"
        );
        assert_eq!(
            ArtifactKind::DastVulns.file_name(&target()),
            "example.com_vulnerabilities.json"
        );
        assert_eq!(
            ArtifactKind::Emails.file_name(&target()),
            "example.com_emails.json"
        );
    }

    #[test]
    fn test_exists_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let target = target();

        assert!(!store.exists(&target, ArtifactKind::OpenPorts));

        let path = store.path(&target, ArtifactKind::OpenPorts);
        std::fs::write(&path, "{\"host\":\"example.com\",\"port\":443}\n").unwrap();

        assert!(store.exists(&target, ArtifactKind::OpenPorts));
        let contents = store.read(&target, ArtifactKind::OpenPorts).unwrap();
        assert!(contents.contains("443"));
    }

    #[test]
    fn test_read_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.read(&target(), ArtifactKind::Emails).unwrap_err();
        assert!(matches!(err, ReconError::ArtifactRead { .. }));
    }

    #[test]
    fn test_has_completed_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let target = target();

        assert!(!store.has_completed_run(&target));

        let path = store.path(&target, ArtifactKind::ResolvedSubdomains);
        std::fs::write(&path, "example.com\n").unwrap();

        assert!(store.has_completed_run(&target));
    }
}
