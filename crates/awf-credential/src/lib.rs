// SPDX-License-Identifier: MIT OR Apache-2.0
//! `CredentialResolver` interface (`spec.md` §3, §4.4, §6).
//!
//! The core never sees a credential store or its encryption at rest — it
//! only consumes a [`CredentialResolver`] that maps an ID to a plaintext
//! value and a formatting rule. Resolution happens in a single pass,
//! immediately before dispatch, and the formatted string is visible only to
//! the executor thread handling the operation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_error::{ErrorCode, WorkflowError};
use std::collections::HashMap;

/// A resolved credential: its plaintext value and declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    /// Plaintext secret value.
    pub value: String,
    /// Formatting-rule type (e.g. `"bearer-token"`, `"api-key"`).
    pub credential_type: String,
}

/// Maps a credential ID to a plaintext value and formatting rule. Must be
/// called only from within the executor; never exposed to agents.
pub trait CredentialResolver: Send + Sync {
    /// Resolve `credential_id`, or fail with `AuthorizationDenied` /
    /// `DataNotFound` if it does not exist.
    fn resolve(&self, credential_id: &str) -> Result<ResolvedCredential, WorkflowError>;
}

/// Apply the formatting rule for `credential_type` to `value`
/// (`spec.md` §3): `bearer-token` → `"Bearer " + value`, `api-key` → value
/// unchanged, anything else → value verbatim.
#[must_use]
pub fn format_credential(value: &str, credential_type: &str) -> String {
    match credential_type {
        "bearer-token" => format!("Bearer {value}"),
        _ => value.to_string(),
    }
}

/// A static, in-memory `CredentialResolver` keyed by credential ID.
/// Suitable for tests and for deployments that keep credentials in a
/// process-local map behind their own encryption layer.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialResolver {
    credentials: HashMap<String, ResolvedCredential>,
}

impl InMemoryCredentialResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self { credentials: HashMap::new() }
    }

    /// Register a credential, replacing any existing entry with the same ID.
    pub fn insert(
        &mut self,
        id: impl Into<String>,
        value: impl Into<String>,
        credential_type: impl Into<String>,
    ) -> &mut Self {
        self.credentials.insert(
            id.into(),
            ResolvedCredential {
                value: value.into(),
                credential_type: credential_type.into(),
            },
        );
        self
    }
}

impl CredentialResolver for InMemoryCredentialResolver {
    fn resolve(&self, credential_id: &str) -> Result<ResolvedCredential, WorkflowError> {
        self.credentials.get(credential_id).cloned().ok_or_else(|| {
            WorkflowError::new(ErrorCode::DataNotFound, format!("unknown credential {credential_id:?}"))
                .with_context("credential_id", credential_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bearer_token() {
        assert_eq!(format_credential("secret123", "bearer-token"), "Bearer secret123");
    }

    #[test]
    fn formats_api_key_verbatim() {
        assert_eq!(format_credential("secret123", "api-key"), "secret123");
    }

    #[test]
    fn formats_unknown_type_verbatim() {
        assert_eq!(format_credential("secret123", "custom-thing"), "secret123");
    }

    #[test]
    fn in_memory_resolver_roundtrip() {
        let mut resolver = InMemoryCredentialResolver::new();
        resolver.insert("cred1", "secret123", "bearer-token");
        let resolved = resolver.resolve("cred1").unwrap();
        assert_eq!(resolved.value, "secret123");
        assert_eq!(resolved.credential_type, "bearer-token");
    }

    #[test]
    fn unknown_credential_is_data_error() {
        let resolver = InMemoryCredentialResolver::new();
        let err = resolver.resolve("missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::DataNotFound);
    }
}
