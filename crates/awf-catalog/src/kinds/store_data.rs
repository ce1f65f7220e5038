// SPDX-License-Identifier: MIT OR Apache-2.0
//! `StoreData` (`spec.md` §4.2).

use crate::storage::Storage;
use serde::Deserialize;
use serde_json::Value;

/// Which named storage backend to delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKind {
    /// Browser-style local storage analogue.
    LocalStorage,
    /// Browser-style session storage analogue.
    SessionStorage,
    /// On-disk file storage.
    File,
}

impl StorageKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::LocalStorage => "localStorage",
            Self::SessionStorage => "sessionStorage",
            Self::File => "file",
        }
    }
}

/// Concrete arguments for `StoreData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreDataArgs {
    /// The value to persist, already resolved.
    pub input_path: Value,
    /// Which storage backend to use.
    pub storage: StorageKind,
    /// Key under which to store the value.
    pub key: String,
}

/// Delegate to the injected `Storage` backend. Not cacheable.
pub fn execute(args: &StoreDataArgs, storage: &dyn Storage) -> Result<Value, awf_error::WorkflowError> {
    storage.store(args.storage.as_str(), &args.key, &args.input_path)?;
    Ok(Value::Null)
}
