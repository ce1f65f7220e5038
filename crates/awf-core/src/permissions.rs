// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent permission snapshots and the `CatalogProvider` contract
//! (`spec.md` §6). The core only *consumes* a snapshot; how it is computed
//! (semantic search, embeddings, allow-list storage) is out of scope.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A credential the agent is permitted to reference, and its formatting
/// rule (`spec.md` §3's Credential reference).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDescriptor {
    /// Credential identifier as referenced by `{credentialRef:{id}}`.
    pub id: String,
    /// Formatting rule applied to the resolved value.
    #[serde(rename = "type")]
    pub credential_type: String,
}

/// The filtered catalog and permission set an agent is allowed to use,
/// as returned by a `CatalogProvider`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Operation kind names the agent may use.
    pub operation_kinds: HashSet<String>,
    /// Allowed API hosts mapped to their permitted endpoint paths.
    pub apis: HashMap<String, Vec<String>>,
    /// Credentials the agent may reference.
    pub credentials: Vec<CredentialDescriptor>,
}

impl CatalogSnapshot {
    /// Whether `kind` is permitted.
    #[must_use]
    pub fn allows_kind(&self, kind: &str) -> bool {
        self.operation_kinds.contains(kind)
    }

    /// Whether `host` is an allowed API host.
    #[must_use]
    pub fn allows_host(&self, host: &str) -> bool {
        self.apis.contains_key(host)
    }

    /// Whether `credential_id` is in the allowed-credentials set.
    #[must_use]
    pub fn allows_credential(&self, credential_id: &str) -> bool {
        self.credentials.iter().any(|c| c.id == credential_id)
    }
}

/// Read-only provider of per-agent catalog snapshots (`spec.md` §6).
///
/// Out of scope for this engine: how the snapshot is computed (semantic
/// search, embeddings, allow-list storage). The core only consumes it.
pub trait CatalogProvider: Send + Sync {
    /// Fetch the allowed catalog snapshot for `agent_id`.
    fn get_allowed_catalog(&self, agent_id: &str) -> Option<CatalogSnapshot>;
}

/// A static, in-memory `CatalogProvider` keyed by agent ID. Suitable for
/// tests and for deployments that load agent permissions from a config
/// file rather than a dynamic store.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalogProvider {
    snapshots: HashMap<String, CatalogSnapshot>,
}

impl StaticCatalogProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshots: HashMap::new(),
        }
    }

    /// Register the snapshot for `agent_id`, replacing any existing one.
    pub fn insert(&mut self, agent_id: impl Into<String>, snapshot: CatalogSnapshot) -> &mut Self {
        self.snapshots.insert(agent_id.into(), snapshot);
        self
    }
}

impl CatalogProvider for StaticCatalogProvider {
    fn get_allowed_catalog(&self, agent_id: &str) -> Option<CatalogSnapshot> {
        self.snapshots.get(agent_id).cloned()
    }
}
