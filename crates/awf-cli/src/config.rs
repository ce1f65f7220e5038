// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent catalog and credential configuration for the CLI harness.
//!
//! This is deliberately separate from `awf-config::RuntimeConfig`: the
//! runtime config tunes engine-wide behavior (rate limits, retry, cache,
//! resource caps), while this file answers a different question — which
//! operation kinds, API hosts, and credentials a given agent is allowed to
//! use at all. Mirrors the split between `abp-config`'s runtime settings
//! and `abp-cli`'s `BackplaneConfig` backend registry.

use awf_config::{AgentRateLimitOverride, RateLimitsConfig};
use awf_core::{CatalogSnapshot, CredentialDescriptor, StaticCatalogProvider};
use awf_credential::InMemoryCredentialResolver;
use awf_ratelimit::{AgentLimits, Limits, RateLimiter};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// One agent's allowed catalog plus the credentials it may reference.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentEntry {
    /// Operation kinds this agent may submit.
    #[serde(default)]
    pub operation_kinds: Vec<String>,
    /// API hosts this agent may call, each with its allowed path prefixes.
    #[serde(default)]
    pub apis: BTreeMap<String, Vec<String>>,
    /// Credentials this agent may reference by ID.
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

/// A single credential: its ID, type (fed into `format_credential`), and
/// plaintext value. Loaded from a local file for this harness; a real
/// deployment would back this with a secret store instead.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialEntry {
    /// Stable identifier referenced by `{credentialRef: {id}}`.
    pub id: String,
    /// Credential type, e.g. `"bearer-token"`.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Plaintext secret value.
    pub value: String,
}

/// Top-level `agents.toml` shape: one `AgentEntry` per agent ID.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentsFile {
    /// Agents, keyed by agent ID.
    #[serde(default)]
    pub agents: BTreeMap<String, AgentEntry>,
}

/// Read and parse an `agents.toml` file.
pub fn load_agents_file(path: &Path) -> anyhow::Result<AgentsFile> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read agents file '{}': {e}", path.display()))?;
    toml::from_str(&content).map_err(|e| anyhow::anyhow!("failed to parse agents file '{}': {e}", path.display()))
}

/// Build a [`StaticCatalogProvider`] from every agent in `file`.
#[must_use]
pub fn build_catalog_provider(file: &AgentsFile) -> StaticCatalogProvider {
    let mut provider = StaticCatalogProvider::new();
    for (agent_id, entry) in &file.agents {
        let snapshot = CatalogSnapshot {
            operation_kinds: entry.operation_kinds.iter().cloned().collect(),
            apis: entry.apis.clone().into_iter().collect(),
            credentials: entry
                .credentials
                .iter()
                .map(|c| CredentialDescriptor { id: c.id.clone(), credential_type: c.credential_type.clone() })
                .collect(),
        };
        provider.insert(agent_id.clone(), snapshot);
    }
    provider
}

/// Build a single [`InMemoryCredentialResolver`] over every credential
/// declared across all agents in `file`. Which agent may *use* a given
/// credential is still governed by that agent's `CatalogSnapshot`
/// allow-list; this resolver only answers "what is the secret", not "who
/// may ask for it".
#[must_use]
pub fn build_credential_resolver(file: &AgentsFile) -> InMemoryCredentialResolver {
    let mut resolver = InMemoryCredentialResolver::new();
    for entry in file.agents.values() {
        for cred in &entry.credentials {
            resolver.insert(cred.id.clone(), cred.value.clone(), cred.credential_type.clone());
        }
    }
    resolver
}

/// Build a [`RateLimiter`] from a runtime's rate-limit config: the
/// top-level fields become the process-wide default, `ApiCall` gets its
/// own sub-limit from `apiCallsPer*`, and each `per_agent` entry becomes
/// an override (unset fields fall back to the default, not to unlimited).
#[must_use]
pub fn build_rate_limiter(config: &RateLimitsConfig) -> RateLimiter {
    let default_limits = AgentLimits {
        default: Limits {
            per_minute: config.requests_per_minute,
            per_hour: config.requests_per_hour,
            per_day: config.requests_per_day,
        },
        per_kind: api_call_kind_limits(config),
        throttle_delay: None,
    };
    let mut limiter = RateLimiter::new(default_limits);
    for (agent_id, over) in &config.per_agent {
        limiter.set_override(agent_id.clone(), merge_override(config, over));
    }
    limiter
}

fn api_call_kind_limits(config: &RateLimitsConfig) -> std::collections::HashMap<String, Limits> {
    let mut per_kind = std::collections::HashMap::new();
    if config.api_calls_per_minute.is_some() || config.api_calls_per_hour.is_some() {
        per_kind.insert(
            "ApiCall".to_string(),
            Limits { per_minute: config.api_calls_per_minute, per_hour: config.api_calls_per_hour, per_day: None },
        );
    }
    per_kind
}

fn merge_override(config: &RateLimitsConfig, over: &AgentRateLimitOverride) -> AgentLimits {
    AgentLimits {
        default: Limits {
            per_minute: over.requests_per_minute.or(config.requests_per_minute),
            per_hour: over.requests_per_hour.or(config.requests_per_hour),
            per_day: over.requests_per_day.or(config.requests_per_day),
        },
        per_kind: {
            let mut per_kind = std::collections::HashMap::new();
            let per_minute = over.api_calls_per_minute.or(config.api_calls_per_minute);
            let per_hour = over.api_calls_per_hour.or(config.api_calls_per_hour);
            if per_minute.is_some() || per_hour.is_some() {
                per_kind.insert("ApiCall".to_string(), Limits { per_minute, per_hour, per_day: None });
            }
            per_kind
        },
        throttle_delay: None,
    }
}
