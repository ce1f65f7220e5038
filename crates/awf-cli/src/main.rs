// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use awf_cli::{run, AuditDestination, RunRequest};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line harness for the agent workflow execution engine. Reads a
/// JSONL workflow from stdin, runs it against a local agent catalog, and
/// prints the JSON execution response to stdout.
#[derive(Parser, Debug)]
#[command(name = "awf-cli", version, about = "Agent workflow engine CLI harness")]
struct Args {
    /// Agent ID submitting the workflow.
    #[arg(long)]
    agent: String,

    /// Path to the agent catalog / credentials TOML file.
    #[arg(long)]
    agents: PathBuf,

    /// Path to the runtime config TOML file. Falls back to built-in
    /// defaults (with environment overrides) if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append the audit trail to this file instead of discarding it.
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Fingerprint recorded on every audit event and execution record.
    #[arg(long, default_value = "cli-default")]
    config_version: String,

    /// Enable debug-level tracing.
    #[arg(long)]
    debug: bool,
}

const EXIT_REJECTED: i32 = 1;
const EXIT_RUNTIME_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter = if args.debug { EnvFilter::new("awf=debug") } else { EnvFilter::new("awf=info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run_cli(args).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!(error = %e, "awf-cli failed");
            eprintln!("error: {e:#}");
            std::process::exit(EXIT_RUNTIME_ERROR);
        }
    }
}

async fn run_cli(args: Args) -> Result<i32> {
    let agents_file = awf_cli::config::load_agents_file(&args.agents)
        .with_context(|| format!("loading agent catalog from {}", args.agents.display()))?;
    let runtime_config =
        awf_cli::load_runtime_config(args.config.as_deref()).context("loading runtime config")?;

    let mut workflow_bytes = Vec::new();
    std::io::stdin().read_to_end(&mut workflow_bytes).context("reading workflow from stdin")?;

    let audit_destination = match args.audit_log {
        Some(path) => AuditDestination::File(path),
        None => AuditDestination::Memory,
    };

    info!(agent = %args.agent, bytes = workflow_bytes.len(), "submitting workflow");

    let outcome = run(RunRequest {
        agent_id: args.agent,
        workflow_bytes,
        agents_file,
        runtime_config,
        audit_destination,
        config_version: args.config_version,
    })
    .await
    .context("running workflow")?;

    match outcome {
        awf_runtime::RunOutcome::Completed(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status == "failed" {
                Ok(EXIT_REJECTED)
            } else {
                Ok(0)
            }
        }
        awf_runtime::RunOutcome::Rejected(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(EXIT_REJECTED)
        }
    }
}
