// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime records: the per-operation and per-execution state the Executor
//! owns and mutates as a workflow runs.

use awf_error::ErrorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single operation within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Created at parse time, not yet reached in execution order.
    Pending,
    /// Currently executing (including retry attempts).
    Running,
    /// Completed successfully; `outputPath` is populated.
    Success,
    /// Completed unsuccessfully after exhausting retries (if any).
    Failed,
    /// Gated out by a `Conditional` branch not taken, or an upstream skip.
    Skipped,
}

/// Runtime record for a single operation (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    /// Operation identifier.
    pub id: String,
    /// Catalog entry name.
    pub kind: String,
    /// Concrete argument object, unresolved (paths and credential markers intact).
    pub args: serde_json::Value,
    /// Current lifecycle status.
    pub status: OperationStatus,
    /// When the operation began executing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the operation finished (success, failure, or skip).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Successful result value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Terminal error, if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
    /// Current retry attempt number; `0` on the first try.
    pub attempt: u32,
}

impl OperationRecord {
    /// Create a new, pending operation record.
    #[must_use]
    pub fn pending(id: impl Into<String>, kind: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            args,
            status: OperationStatus::Pending,
            started_at: None,
            finished_at: None,
            result: None,
            error: None,
            attempt: 0,
        }
    }

    /// Duration in milliseconds between `started_at` and `finished_at`, if
    /// both are set.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(s), Some(f)) => Some((f - s).num_milliseconds()),
            _ => None,
        }
    }
}

/// Aggregate status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Message stream parsed successfully, not yet validated.
    Parsed,
    /// Validation passed with no errors.
    Validated,
    /// Operations are currently executing.
    Running,
    /// All operations succeeded or were cleanly skipped.
    Success,
    /// Execution stopped due to an unrecoverable operation failure.
    Failed,
    /// At least one operation succeeded before a later failure, or a branch
    /// was conditionally skipped while the rest completed.
    PartialSuccess,
}

/// Runtime record for a single execution (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    /// Execution identifier from `BeginExecution`.
    pub execution_id: String,
    /// The agent that submitted this workflow.
    pub agent_id: String,
    /// Stable hash of the canonicalized workflow, for audit correlation.
    pub workflow_hash: String,
    /// Per-operation runtime records, in declared `order`.
    pub operations: Vec<OperationRecord>,
    /// Current aggregate status.
    pub status: ExecutionStatus,
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution finished, if it has.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Total wall-clock duration in milliseconds, once finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
    /// Identifies which `RuntimeConfig` snapshot produced this run.
    pub config_version: String,
}

impl ExecutionRecord {
    /// Find the mutable record for `operation_id`, if present.
    pub fn operation_mut(&mut self, operation_id: &str) -> Option<&mut OperationRecord> {
        self.operations.iter_mut().find(|o| o.id == operation_id)
    }

    /// Find the record for `operation_id`, if present.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&OperationRecord> {
        self.operations.iter().find(|o| o.id == operation_id)
    }

    /// Compute the aggregate status implied by the current operation
    /// statuses: `success` if all are `success`/`skipped`, `partial_success`
    /// if at least one `success` coexists with a `failed`, otherwise
    /// `failed`.
    #[must_use]
    pub fn derive_final_status(&self) -> ExecutionStatus {
        let any_failed = self
            .operations
            .iter()
            .any(|o| o.status == OperationStatus::Failed);
        let any_success = self
            .operations
            .iter()
            .any(|o| o.status == OperationStatus::Success);
        if !any_failed {
            ExecutionStatus::Success
        } else if any_success {
            ExecutionStatus::PartialSuccess
        } else {
            ExecutionStatus::Failed
        }
    }
}
