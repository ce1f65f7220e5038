// SPDX-License-Identifier: MIT OR Apache-2.0
//! The two response wire shapes the Executor can produce (`spec.md` §6).
//!
//! A rejected workflow (parse or validation failure) surfaces as a
//! [`ValidationReport`]; a workflow that was accepted and ran to a
//! terminal state surfaces as an [`ExecutionResponse`]. These are distinct
//! schemas in `spec.md`, so [`RunOutcome`] models them as distinct variants
//! rather than forcing one struct to represent both (see `DESIGN.md`).

use awf_core::{ExecutionRecord, ExecutionStatus, OperationStatus, ValidationReport};
use awf_error::ErrorRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default threshold (bytes) above which a string field is elided in the
/// default `data` projection (`spec.md` §6).
pub const DEFAULT_STRING_TRUNCATION_BYTES: usize = 1024;

/// Default length above which an array is truncated in the default `data`
/// projection (`spec.md` §6).
pub const DEFAULT_ARRAY_TRUNCATION_LEN: usize = 50;

/// Per-operation summary within an [`ExecutionResponse`] (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSummary {
    /// Final lifecycle status, lower-cased (`success`, `failed`, `skipped`, ...).
    pub status: String,
    /// Wall-clock duration in milliseconds, if the operation started.
    pub duration_ms: i64,
    /// Successful result value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Terminal error, if the operation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorRecord>,
}

/// Execution response (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    /// Execution identifier from `BeginExecution`.
    pub execution_id: String,
    /// Aggregate status (`success`, `failed`, `partial_success`).
    pub status: String,
    /// Per-operation summaries, keyed by operation ID.
    pub operations: BTreeMap<String, OperationSummary>,
    /// Size-bounded projection of the final `DataModel` (`spec.md` §7).
    pub data: Value,
    /// Total execution duration in milliseconds.
    pub duration_ms: i64,
}

pub(crate) fn status_str(status: OperationStatus) -> &'static str {
    match status {
        OperationStatus::Pending => "pending",
        OperationStatus::Running => "running",
        OperationStatus::Success => "success",
        OperationStatus::Failed => "failed",
        OperationStatus::Skipped => "skipped",
    }
}

pub(crate) fn execution_status_str(status: ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::Parsed => "parsed",
        ExecutionStatus::Validated => "validated",
        ExecutionStatus::Running => "running",
        ExecutionStatus::Success => "success",
        ExecutionStatus::Failed => "failed",
        ExecutionStatus::PartialSuccess => "partial_success",
    }
}

impl ExecutionResponse {
    /// Build the wire response from a finished [`ExecutionRecord`] and the
    /// final `DataModel` value, projecting `data` per the default
    /// truncation thresholds.
    #[must_use]
    pub fn from_record(record: &ExecutionRecord, data: &Value) -> Self {
        let operations = record
            .operations
            .iter()
            .map(|op| {
                (
                    op.id.clone(),
                    OperationSummary {
                        status: status_str(op.status).to_string(),
                        duration_ms: op.duration_ms().unwrap_or(0),
                        result: op.result.clone(),
                        error: op.error.clone(),
                    },
                )
            })
            .collect();
        Self {
            execution_id: record.execution_id.clone(),
            status: execution_status_str(record.status).to_string(),
            operations,
            data: project(data, DEFAULT_STRING_TRUNCATION_BYTES, DEFAULT_ARRAY_TRUNCATION_LEN),
            duration_ms: record.total_duration_ms.unwrap_or(0),
        }
    }
}

/// Recursively elide strings longer than `max_string_bytes` and truncate
/// arrays longer than `max_array_len`, leaving everything else intact
/// (`spec.md` §6's default `data` projection; `full` formatting is a
/// transport-layer concern and simply skips this step).
#[must_use]
pub fn project(value: &Value, max_string_bytes: usize, max_array_len: usize) -> Value {
    match value {
        Value::String(s) if s.len() > max_string_bytes => {
            let mut boundary = max_string_bytes.min(s.len());
            while boundary > 0 && !s.is_char_boundary(boundary) {
                boundary -= 1;
            }
            Value::String(format!("{}... ({} bytes elided)", &s[..boundary], s.len() - boundary))
        }
        Value::Array(items) => {
            let truncated: Vec<Value> = items.iter().take(max_array_len).map(|v| project(v, max_string_bytes, max_array_len)).collect();
            Value::Array(truncated)
        }
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), project(v, max_string_bytes, max_array_len))).collect())
        }
        other => other.clone(),
    }
}

/// Either shape an `Executor` can return for one workflow submission.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The workflow was rejected before any operation ran: a parse
    /// failure (wrapped as a single structural issue) or a validator
    /// failure.
    Rejected(ValidationReport),
    /// The workflow was accepted and ran to a terminal state.
    Completed(ExecutionResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_elides_long_strings() {
        let value = Value::String("x".repeat(2000));
        let projected = project(&value, 10, 50);
        assert!(projected.as_str().unwrap().starts_with("xxxxxxxxxx"));
        assert!(projected.as_str().unwrap().contains("bytes elided"));
    }

    #[test]
    fn project_truncates_long_arrays() {
        let value = Value::Array((0..100).map(Value::from).collect());
        let projected = project(&value, 1024, 5);
        assert_eq!(projected.as_array().unwrap().len(), 5);
    }

    #[test]
    fn project_leaves_small_values_untouched() {
        let value = serde_json::json!({"a": 1, "b": "short", "c": [1, 2, 3]});
        assert_eq!(project(&value, 1024, 50), value);
    }
}
