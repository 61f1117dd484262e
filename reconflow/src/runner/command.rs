//! The external command registry.
//!
//! A read-only mapping from stage identifier to the command line that
//! produces its artifact, built once at startup. Templates are rendered
//! per target, so the registry itself never changes after construction.

use crate::config::ReconConfig;
use crate::pipeline::StageId;
use crate::store::{ArtifactKind, ArtifactStore, Target};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One placeholder-or-literal argument of a command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandArg {
    /// A fixed argument.
    Literal(String),
    /// The target domain.
    Target,
    /// Path of the stage's declared output artifact.
    OutputPath,
    /// Output artifact path with its extension stripped, for tools that
    /// append their own.
    OutputPathBase,
    /// Path of an input artifact.
    InputPath(ArtifactKind),
    /// Path of the staged input list prepared before the invocation.
    StagedListPath,
    /// The configured fuzz wordlist.
    WordlistPath,
    /// The configured DAST template directory.
    DastTemplatesPath,
}

/// An external command with unresolved placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// The program to invoke.
    pub program: String,
    /// Arguments, rendered per target.
    pub args: Vec<CommandArg>,
}

impl CommandTemplate {
    /// Creates a template for a program with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: CommandArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Appends a literal argument.
    #[must_use]
    pub fn literal(self, literal: impl Into<String>) -> Self {
        self.arg(CommandArg::Literal(literal.into()))
    }
}

/// A fully rendered command line, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    /// The program to invoke.
    pub program: String,
    /// Resolved arguments.
    pub args: Vec<String>,
}

/// Maps each stage to its external command.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    entries: HashMap<StageId, CommandTemplate>,
    wordlist: PathBuf,
    dast_templates: PathBuf,
}

impl CommandRegistry {
    /// Creates an empty registry with the configured tool paths.
    #[must_use]
    pub fn new(config: &ReconConfig) -> Self {
        Self {
            entries: HashMap::new(),
            wordlist: config.fuzz_wordlist.clone(),
            dast_templates: config.dast_templates.clone(),
        }
    }

    /// The standard tool mapping for every stage of the recon graph.
    #[must_use]
    pub fn standard(config: &ReconConfig) -> Self {
        Self::new(config)
            .with_template(
                StageId::SubdomainEnum,
                CommandTemplate::new("subfinder")
                    .literal("-d")
                    .arg(CommandArg::Target)
                    .literal("-o")
                    .arg(CommandArg::OutputPath),
            )
            .with_template(
                StageId::EmailHarvest,
                CommandTemplate::new("theHarvester")
                    .literal("-d")
                    .arg(CommandArg::Target)
                    .literal("-b")
                    .literal("all")
                    .literal("-f")
                    .arg(CommandArg::OutputPathBase),
            )
            .with_template(
                StageId::PortScan,
                CommandTemplate::new("naabu")
                    .literal("-l")
                    .arg(CommandArg::InputPath(ArtifactKind::ResolvedSubdomains))
                    .literal("-p")
                    .literal("-")
                    .literal("-json")
                    .literal("-o")
                    .arg(CommandArg::OutputPath),
            )
            .with_template(
                StageId::UrlDiscovery,
                CommandTemplate::new("urlfinder")
                    .literal("-d")
                    .arg(CommandArg::Target)
                    .literal("-j")
                    .literal("-o")
                    .arg(CommandArg::OutputPath)
                    .literal("-silent"),
            )
            .with_template(
                StageId::ContentFuzz,
                CommandTemplate::new("gobuster")
                    .literal("dir")
                    .literal("-u")
                    .arg(CommandArg::Target)
                    .literal("-w")
                    .arg(CommandArg::WordlistPath)
                    .literal("-o")
                    .arg(CommandArg::OutputPath),
            )
            .with_template(
                StageId::ActiveVulnScan,
                CommandTemplate::new("nuclei")
                    .literal("-list")
                    .arg(CommandArg::InputPath(ArtifactKind::ResolvedSubdomains))
                    .literal("-nc")
                    .literal("-silent")
                    .literal("-json-export")
                    .arg(CommandArg::OutputPath),
            )
            .with_template(
                StageId::DastScan,
                CommandTemplate::new("nuclei")
                    .literal("-list")
                    .arg(CommandArg::StagedListPath)
                    .literal("-dast")
                    .literal("-t")
                    .arg(CommandArg::DastTemplatesPath)
                    .literal("-nc")
                    .literal("-silent")
                    .literal("-json-export")
                    .arg(CommandArg::OutputPath),
            )
            .with_template(
                StageId::HttpProbe,
                CommandTemplate::new("httpx")
                    .literal("-l")
                    .arg(CommandArg::StagedListPath)
                    .literal("-sc")
                    .literal("-td")
                    .literal("-title")
                    .literal("-ip")
                    .literal("-fr")
                    .literal("-j")
                    .literal("-o")
                    .arg(CommandArg::OutputPath),
            )
    }

    /// Registers (or replaces) a stage's template.
    #[must_use]
    pub fn with_template(mut self, stage: StageId, template: CommandTemplate) -> Self {
        self.entries.insert(stage, template);
        self
    }

    /// Looks up a stage's template.
    #[must_use]
    pub fn template(&self, stage: StageId) -> Option<&CommandTemplate> {
        self.entries.get(&stage)
    }

    /// Renders a stage's command line for a target. Returns `None` when
    /// no template is registered or a required staged list is absent.
    #[must_use]
    pub fn render(
        &self,
        stage: StageId,
        target: &Target,
        store: &ArtifactStore,
        staged: Option<&Path>,
    ) -> Option<RenderedCommand> {
        let template = self.entries.get(&stage)?;
        let output = stage.output_kind();

        let mut args = Vec::with_capacity(template.args.len());
        for arg in &template.args {
            let rendered = match arg {
                CommandArg::Literal(literal) => literal.clone(),
                CommandArg::Target => target.to_string(),
                CommandArg::OutputPath => store.path(target, output).display().to_string(),
                CommandArg::OutputPathBase => store
                    .path(target, output)
                    .with_extension("")
                    .display()
                    .to_string(),
                CommandArg::InputPath(kind) => store.path(target, *kind).display().to_string(),
                CommandArg::StagedListPath => staged?.display().to_string(),
                CommandArg::WordlistPath => self.wordlist.display().to_string(),
                CommandArg::DastTemplatesPath => self.dast_templates.display().to_string(),
            };
            args.push(rendered);
        }

        Some(RenderedCommand {
            program: template.program.clone(),
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fixture() -> (CommandRegistry, ArtifactStore, Target) {
        let config = ReconConfig::default()
            .with_output_dir("/tmp/recon")
            .with_wordlist("/opt/wordlists/big.txt");
        (
            CommandRegistry::standard(&config),
            ArtifactStore::new("/tmp/recon"),
            Target::new("example.com").unwrap(),
        )
    }

    #[test]
    fn test_every_stage_has_a_template() {
        let (registry, _, _) = fixture();
        for stage in StageId::ALL {
            assert!(registry.template(stage).is_some(), "{stage}");
        }
    }

    #[test]
    fn test_render_port_scan() {
        let (registry, store, target) = fixture();
        let command = registry
            .render(StageId::PortScan, &target, &store, None)
            .unwrap();

        assert_eq!(command.program, "naabu");
        assert_eq!(
            command.args,
            vec![
                "-l",
                "/tmp/recon/example.com_subdomain.txt",
                "-p",
                "-",
                "-json",
                "-o",
                "/tmp/recon/example.com_naabu.json",
            ]
        );
    }

    #[test]
    fn test_render_email_harvest_strips_extension() {
        let (registry, store, target) = fixture();
        let command = registry
            .render(StageId::EmailHarvest, &target, &store, None)
            .unwrap();

        assert!(command
            .args
            .contains(&"/tmp/recon/example.com_emails".to_string()));
    }

    #[test]
    fn test_render_staged_list_required() {
        let (registry, store, target) = fixture();

        assert!(registry
            .render(StageId::HttpProbe, &target, &store, None)
            .is_none());

        let command = registry
            .render(
                StageId::HttpProbe,
                &target,
                &store,
                Some(Path::new("/tmp/recon/example.com_hostport.txt")),
            )
            .unwrap();
        assert!(command
            .args
            .contains(&"/tmp/recon/example.com_hostport.txt".to_string()));
    }

    #[test]
    fn test_render_uses_configured_wordlist() {
        let (registry, store, target) = fixture();
        let command = registry
            .render(StageId::ContentFuzz, &target, &store, None)
            .unwrap();
        assert!(command.args.contains(&"/opt/wordlists/big.txt".to_string()));
    }
}
