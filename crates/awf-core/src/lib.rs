// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared domain types for the agent workflow engine: wire messages,
//! runtime records, permission snapshots, and validation issues.
//!
//! This crate has no behaviour of its own beyond small, pure helpers — it
//! exists so that `awf-protocol`, `awf-validate`, `awf-catalog`, and
//! `awf-runtime` agree on a single vocabulary without depending on each
//! other directly.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod credential_ref;
mod issue;
mod message;
mod permissions;
mod record;

pub use credential_ref::{as_credential_ref, collect_credential_refs, CredentialRef};
pub use issue::{Issue, IssueCategory, IssueSeverity, ValidationReport};
pub use message::{OperationDefinition, WireMessage, Workflow};
pub use permissions::{CatalogProvider, CatalogSnapshot, CredentialDescriptor, StaticCatalogProvider};
pub use record::{ExecutionRecord, ExecutionStatus, OperationRecord, OperationStatus};

/// `operationId`/credential-id grammar: `[A-Za-z0-9_-]{1,100}` (`spec.md` §3).
#[must_use]
pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 100
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
