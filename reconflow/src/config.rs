//! Pipeline configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Configuration for a reconnaissance run.
///
/// Paths point at the shared artifact directory and the external tool
/// inputs that are not derived from prior stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Directory all stage artifacts are written to and read from.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Wordlist used by the content-fuzzing stage.
    #[serde(default = "default_wordlist")]
    pub fuzz_wordlist: PathBuf,

    /// Template directory used by the DAST scanning stage.
    #[serde(default = "default_dast_templates")]
    pub dast_templates: PathBuf,

    /// Maximum number of stages executing concurrently. `None` leaves the
    /// pool unbounded; stages are independent once unblocked, so this is a
    /// throughput knob, not a correctness one.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_wordlist() -> PathBuf {
    home_joined(".local/share/seclists/Discovery/Web-Content/big.txt")
}

fn default_dast_templates() -> PathBuf {
    home_joined("nuclei-templates/dast/vulnerabilities")
}

fn home_joined(rel: &str) -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(rel)
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            fuzz_wordlist: default_wordlist(),
            dast_templates: default_dast_templates(),
            max_concurrency: None,
        }
    }
}

impl ReconConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration from the environment.
    ///
    /// Recognized variables: `RECONFLOW_OUTPUT_DIR`, `RECONFLOW_WORDLIST`,
    /// `RECONFLOW_DAST_TEMPLATES`, `RECONFLOW_MAX_CONCURRENCY`.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env::var_os("RECONFLOW_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(path) = env::var_os("RECONFLOW_WORDLIST") {
            config.fuzz_wordlist = PathBuf::from(path);
        }
        if let Some(path) = env::var_os("RECONFLOW_DAST_TEMPLATES") {
            config.dast_templates = PathBuf::from(path);
        }
        if let Ok(value) = env::var("RECONFLOW_MAX_CONCURRENCY") {
            config.max_concurrency = value.parse().ok();
        }

        config
    }

    /// Sets the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets the fuzz wordlist path.
    #[must_use]
    pub fn with_wordlist(mut self, path: impl Into<PathBuf>) -> Self {
        self.fuzz_wordlist = path.into();
        self
    }

    /// Sets the concurrency cap.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReconConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert!(config.max_concurrency.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ReconConfig::new()
            .with_output_dir("/tmp/recon")
            .with_max_concurrency(4);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/recon"));
        assert_eq!(config.max_concurrency, Some(4));
    }
}
