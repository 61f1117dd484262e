//! Stage identifiers and specifications.

use crate::errors::GraphValidationError;
use crate::store::ArtifactKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of pipeline stages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    /// Subdomain enumeration; produces the primary artifact.
    SubdomainEnum,
    /// OSINT email harvesting.
    EmailHarvest,
    /// Port scanning over resolved subdomains.
    PortScan,
    /// URL/endpoint discovery.
    UrlDiscovery,
    /// Directory/content fuzzing.
    ContentFuzz,
    /// Template-based active vulnerability scanning.
    ActiveVulnScan,
    /// DAST scanning over discovered endpoints.
    DastScan,
    /// HTTP probing of open ports.
    HttpProbe,
}

impl StageId {
    /// Every stage, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::SubdomainEnum,
        Self::EmailHarvest,
        Self::PortScan,
        Self::UrlDiscovery,
        Self::ContentFuzz,
        Self::ActiveVulnScan,
        Self::DastScan,
        Self::HttpProbe,
    ];

    /// The stage's stable identifier.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SubdomainEnum => "subdomain_enum",
            Self::EmailHarvest => "email_harvest",
            Self::PortScan => "port_scan",
            Self::UrlDiscovery => "url_discovery",
            Self::ContentFuzz => "content_fuzz",
            Self::ActiveVulnScan => "active_vuln_scan",
            Self::DastScan => "dast_scan",
            Self::HttpProbe => "http_probe",
        }
    }

    /// The artifact kind this stage declares as its output.
    #[must_use]
    pub fn output_kind(self) -> ArtifactKind {
        match self {
            Self::SubdomainEnum => ArtifactKind::ResolvedSubdomains,
            Self::EmailHarvest => ArtifactKind::Emails,
            Self::PortScan => ArtifactKind::OpenPorts,
            Self::UrlDiscovery => ArtifactKind::Endpoints,
            Self::ContentFuzz => ArtifactKind::DirectoryFuzz,
            Self::ActiveVulnScan => ArtifactKind::ActiveVulns,
            Self::DastScan => ArtifactKind::DastVulns,
            Self::HttpProbe => ArtifactKind::HttpServices,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Specification for a single stage: its dependencies and declared
/// input/output artifacts. The runner never needs to understand how a
/// stage produces its artifact, only this contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// The stage identifier.
    pub id: StageId,
    /// Stages that must reach `Completed` before this one starts.
    pub dependencies: Vec<StageId>,
    /// Artifacts that must exist before the runner is invoked.
    pub inputs: Vec<ArtifactKind>,
    /// The artifact this stage produces.
    pub output: ArtifactKind,
}

impl StageSpec {
    /// Creates a specification with no dependencies and the stage's
    /// declared output kind.
    #[must_use]
    pub fn new(id: StageId) -> Self {
        Self {
            id,
            dependencies: Vec::new(),
            inputs: Vec::new(),
            output: id.output_kind(),
        }
    }

    /// Adds a dependency stage.
    #[must_use]
    pub fn with_dependency(mut self, dep: StageId) -> Self {
        self.dependencies.push(dep);
        self
    }

    /// Adds a required input artifact.
    #[must_use]
    pub fn with_input(mut self, input: ArtifactKind) -> Self {
        self.inputs.push(input);
        self
    }

    /// Validates the specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage depends on itself.
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        if self.dependencies.contains(&self.id) {
            return Err(GraphValidationError::new(format!(
                "stage '{}' cannot depend on itself",
                self.id
            ))
            .with_stages(vec![self.id]));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(StageId::SubdomainEnum.name(), "subdomain_enum");
        assert_eq!(StageId::ActiveVulnScan.name(), "active_vuln_scan");
        assert_eq!(StageId::HttpProbe.to_string(), "http_probe");
    }

    #[test]
    fn test_stage_serializes_as_name() {
        let json = serde_json::to_string(&StageId::DastScan).unwrap();
        assert_eq!(json, r#""dast_scan""#);
    }

    #[test]
    fn test_output_kinds_are_distinct() {
        let mut kinds: Vec<_> = StageId::ALL.iter().map(|s| s.output_kind()).collect();
        kinds.sort();
        kinds.dedup();
        assert_eq!(kinds.len(), StageId::ALL.len());
    }

    #[test]
    fn test_spec_builder() {
        let spec = StageSpec::new(StageId::PortScan)
            .with_dependency(StageId::SubdomainEnum)
            .with_input(ArtifactKind::ResolvedSubdomains);

        assert_eq!(spec.output, ArtifactKind::OpenPorts);
        assert_eq!(spec.dependencies, vec![StageId::SubdomainEnum]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_self_dependency_rejected() {
        let spec = StageSpec::new(StageId::PortScan).with_dependency(StageId::PortScan);
        assert!(spec.validate().is_err());
    }
}
