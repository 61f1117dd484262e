//! Command-line entry point.
//!
//! One binary, one target, two modes: run stages (all of them, or a
//! hand-picked subset) or assemble a report from artifacts an earlier run
//! left behind. `--all` against a target that already has a completed run
//! does not re-execute anything; it prints the existing report.

use anyhow::Context;
use clap::Parser;
use reconflow::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "reconflow", version, about = "Automated reconnaissance pipeline")]
struct Cli {
    /// Target domain
    #[arg(short, long)]
    domain: String,

    /// Run every stage (or print the existing report if one exists)
    #[arg(long)]
    all: bool,

    /// Run subdomain enumeration
    #[arg(long)]
    subdomains: bool,

    /// Run the port scan
    #[arg(long)]
    ports: bool,

    /// Run the HTTP probe
    #[arg(long)]
    probe: bool,

    /// Run content fuzzing
    #[arg(long)]
    fuzz: bool,

    /// Run URL/endpoint discovery
    #[arg(long)]
    urls: bool,

    /// Run the active vulnerability scan
    #[arg(long)]
    vulns: bool,

    /// Run the DAST scan
    #[arg(long)]
    dast: bool,

    /// Run email harvesting
    #[arg(long)]
    emails: bool,

    /// Assemble and print the report from existing artifacts
    #[arg(long)]
    report: bool,

    /// Artifact directory (overrides RECONFLOW_OUTPUT_DIR)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn selected_stages(&self) -> Vec<StageId> {
        let flags = [
            (self.subdomains, StageId::SubdomainEnum),
            (self.emails, StageId::EmailHarvest),
            (self.ports, StageId::PortScan),
            (self.urls, StageId::UrlDiscovery),
            (self.fuzz, StageId::ContentFuzz),
            (self.vulns, StageId::ActiveVulnScan),
            (self.dast, StageId::DastScan),
            (self.probe, StageId::HttpProbe),
        ];
        flags
            .into_iter()
            .filter_map(|(selected, stage)| selected.then_some(stage))
            .collect()
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn print_report(report: &Report) -> anyhow::Result<()> {
    let rendered =
        serde_json::to_string_pretty(report).context("failed to serialize the report")?;
    println!("{rendered}");
    Ok(())
}

/// Runs a hand-picked set of stages directly, in dependency-safe order,
/// relying only on input-artifact presence the way the runner always does.
async fn run_stages(
    config: &ReconConfig,
    target: &Target,
    selected: &[StageId],
) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&config.output_dir);
    store.ensure_root()?;

    let registry = CommandRegistry::standard(config);
    let runner = Arc::new(CommandRunner::new(registry, store));
    let graph = StageGraph::recon();

    for stage in graph.execution_order() {
        if !selected.contains(stage) {
            continue;
        }
        let Some(spec) = graph.spec(*stage) else {
            continue;
        };

        tracing::info!(stage = %stage, "running stage");
        let outcome = runner.execute(spec, target).await;
        match outcome.status {
            StageStatus::Completed => tracing::info!(stage = %stage, "stage completed"),
            StageStatus::Skipped => {
                tracing::warn!(stage = %stage, reason = ?outcome.detail, "stage skipped");
            }
            _ => {
                tracing::warn!(
                    stage = %stage,
                    exit_code = ?outcome.exit_code,
                    stderr = %outcome.stderr,
                    "stage failed"
                );
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = ReconConfig::from_env();
    if let Some(dir) = &cli.output_dir {
        config.output_dir.clone_from(dir);
    }

    let target = Target::new(&cli.domain)?;
    let pipeline = Pipeline::new(config.clone())?;

    if cli.report {
        print_report(&pipeline.report(&target)?)?;
        return Ok(());
    }

    if cli.all {
        if pipeline.has_completed_run(&target) {
            tracing::info!(%target, "completed run found, reusing existing artifacts");
            print_report(&pipeline.report(&target)?)?;
        } else {
            let run = pipeline.run(&target).await?;
            tracing::info!(
                run_id = %run.summary.run_id,
                duration_ms = run.summary.duration_ms,
                "pipeline finished"
            );
            print_report(&run.report)?;
        }
        return Ok(());
    }

    let selected = cli.selected_stages();
    if selected.is_empty() {
        anyhow::bail!("nothing to do: pass --all, --report, or at least one stage flag");
    }

    run_stages(&config, &target, &selected).await
}
