// SPDX-License-Identifier: MIT OR Apache-2.0
//! Library half of the `awf-cli` binary: everything testable without a
//! process boundary lives here, leaving `main.rs` a thin arg-parsing and
//! exit-code shell (`abp-daemon`'s split between its binary and its
//! `build_runtime`/app-state constructors).

#![warn(missing_docs)]

pub mod config;

use awf_audit::{AuditSink, FileAuditSink, InMemoryAuditSink};
use awf_cache::ResultCache;
use awf_config::RuntimeConfig;
use awf_runtime::{CancellationToken, Executor, RunOutcome};
use std::path::Path;
use std::sync::Arc;

/// Where the audit trail for one invocation should go.
#[derive(Debug, Clone)]
pub enum AuditDestination {
    /// Keep events in memory only; useful for one-shot CLI runs where
    /// nobody inspects the sink afterward.
    Memory,
    /// Append newline-delimited JSON audit events to a file.
    File(std::path::PathBuf),
}

/// Everything needed to build one [`Executor`] and run one workflow.
pub struct RunRequest {
    /// Agent submitting the workflow.
    pub agent_id: String,
    /// Raw JSONL workflow bytes, as they would arrive over the wire.
    pub workflow_bytes: Vec<u8>,
    /// Agent catalog and credential bindings.
    pub agents_file: config::AgentsFile,
    /// Engine-wide tuning (rate limits, retry, cache, resource caps).
    pub runtime_config: RuntimeConfig,
    /// Where to record the audit trail.
    pub audit_destination: AuditDestination,
    /// Config fingerprint recorded on every audit event and execution
    /// record (`spec.md` §9).
    pub config_version: String,
}

/// Construct dependencies from `request` and run its workflow to
/// completion. Mirrors `abp-daemon::build_runtime`'s "construct config,
/// construct dependencies, hand off to the core" shape, minus the HTTP
/// server: this is the whole request/response cycle in one call.
pub async fn run(request: RunRequest) -> anyhow::Result<RunOutcome> {
    let catalog_provider = config::build_catalog_provider(&request.agents_file);
    let credential_resolver = config::build_credential_resolver(&request.agents_file);
    let rate_limiter = config::build_rate_limiter(&request.runtime_config.rate_limits);

    let audit_sink: Arc<dyn AuditSink> = match request.audit_destination {
        AuditDestination::Memory => Arc::new(InMemoryAuditSink::new()),
        AuditDestination::File(path) => Arc::new(FileAuditSink::open(path)?),
    };

    let executor = Executor::new(
        Arc::new(catalog_provider),
        Arc::new(credential_resolver),
        audit_sink,
        Arc::new(rate_limiter),
        Arc::new(ResultCache::new(request.runtime_config.cache.max_size)),
        Arc::new(awf_catalog::InMemoryStorage::new()),
        reqwest::Client::new(),
        request.runtime_config,
        request.config_version,
    );

    Ok(executor.run(&request.agent_id, &request.workflow_bytes, CancellationToken::new()).await)
}

/// Load an [`awf_config::RuntimeConfig`] from an optional TOML file path,
/// falling back to defaults (with environment overrides applied either
/// way) when `path` is `None`.
pub fn load_runtime_config(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    awf_config::load_config(path).map_err(|e| anyhow::anyhow!(e))
}
