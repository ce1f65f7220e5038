// SPDX-License-Identifier: MIT OR Apache-2.0
//! `StoreData`'s external `Storage` interface (`spec.md` §4.2).

use awf_error::{ErrorCode, WorkflowError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// External storage backend consulted by `StoreData`. Treated as an opaque
/// collaborator — the core does not define persistence semantics beyond
/// "write this value under this key".
pub trait Storage: Send + Sync {
    /// Persist `value` under `(storage, key)`.
    fn store(&self, storage: &str, key: &str, value: &serde_json::Value) -> Result<(), WorkflowError>;
}

/// In-memory `Storage`, namespaced by the `storage` argument
/// (`localStorage`/`sessionStorage`/`file`). Suitable for tests.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl InMemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Read back a previously stored value, for test assertions.
    #[must_use]
    pub fn get(&self, storage: &str, key: &str) -> Option<serde_json::Value> {
        self.entries.lock().expect("storage mutex poisoned").get(&(storage.to_string(), key.to_string())).cloned()
    }
}

impl Storage for InMemoryStorage {
    fn store(&self, storage: &str, key: &str, value: &serde_json::Value) -> Result<(), WorkflowError> {
        self.entries
            .lock()
            .map_err(|_| WorkflowError::new(ErrorCode::Internal, "storage mutex poisoned"))?
            .insert((storage.to_string(), key.to_string()), value.clone());
        Ok(())
    }
}

/// File-backed `Storage`: each `(storage, key)` pair becomes a JSON file
/// under `root/<storage>/<key>.json`. Mirrors the append-only, path-joined
/// on-disk layout used elsewhere in this engine's ambient stack.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `root`, creating it if necessary.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, storage: &str, key: &str) -> PathBuf {
        self.root.join(storage).join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn store(&self, storage: &str, key: &str, value: &serde_json::Value) -> Result<(), WorkflowError> {
        let path = self.path_for(storage, key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                WorkflowError::new(ErrorCode::Internal, "failed to create storage directory").with_source(e)
            })?;
        }
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| WorkflowError::new(ErrorCode::Internal, "failed to encode stored value").with_source(e))?;
        std::fs::write(&path, bytes)
            .map_err(|e| WorkflowError::new(ErrorCode::Internal, "failed to write storage file").with_source(e))
    }
}
