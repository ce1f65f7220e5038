// SPDX-License-Identifier: MIT OR Apache-2.0
//! Append-only audit log (`spec.md` §4.8).
//!
//! Credential values are never written; `Authorization`-like header values
//! in `ApiCall` argument digests are replaced with a placeholder before an
//! event reaches a sink.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_error::WorkflowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

const REDACTED: &str = "***redacted***";

/// One audit event kind (`spec.md` §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[allow(clippy::large_enum_variant)]
pub enum AuditEvent {
    /// An execution began.
    ExecutionStarted {
        /// When this event occurred.
        timestamp: DateTime<Utc>,
        /// The execution this event belongs to.
        execution_id: String,
        /// The agent that submitted the workflow.
        agent_id: String,
    },
    /// An execution reached a terminal state.
    ExecutionFinished {
        /// When this event occurred.
        timestamp: DateTime<Utc>,
        /// The execution this event belongs to.
        execution_id: String,
        /// Terminal status (`success`/`failed`/`partial_success`).
        status: String,
        /// Total execution duration in milliseconds.
        duration_ms: u64,
    },
    /// An operation began.
    OperationStarted {
        /// When this event occurred.
        timestamp: DateTime<Utc>,
        /// The execution this event belongs to.
        execution_id: String,
        /// The operation this event belongs to.
        operation_id: String,
        /// The operation's catalog kind.
        kind: String,
        /// Sanitized digest of the operation's concrete arguments.
        args_digest: Value,
    },
    /// An operation reached a terminal state.
    OperationFinished {
        /// When this event occurred.
        timestamp: DateTime<Utc>,
        /// The execution this event belongs to.
        execution_id: String,
        /// The operation this event belongs to.
        operation_id: String,
        /// Terminal status (`success`/`failed`/`skipped`).
        status: String,
        /// Operation duration in milliseconds.
        duration_ms: u64,
    },
    /// A credential was resolved and used by an operation. Never carries
    /// the resolved value itself.
    CredentialUsed {
        /// When this event occurred.
        timestamp: DateTime<Utc>,
        /// The execution this event belongs to.
        execution_id: String,
        /// The operation that used the credential.
        operation_id: String,
        /// The credential's identifier (not its value).
        credential_id: String,
    },
}

/// Redact credential markers and `Authorization`-like header values from an
/// operation's argument tree before it is recorded.
#[must_use]
pub fn sanitize_args_digest(args: &Value) -> Value {
    if awf_core::as_credential_ref(args).is_some() {
        return Value::String(REDACTED.to_string());
    }
    match args {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("credential") {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), sanitize_args_digest(value));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_args_digest).collect()),
        other => other.clone(),
    }
}

/// Append-only audit event sink.
pub trait AuditSink: Send + Sync {
    /// Record `event`. Must not fail on a transient I/O hiccup silently —
    /// callers are expected to log or surface the returned error.
    fn append(&self, event: &AuditEvent) -> Result<(), WorkflowError>;
}

/// In-memory sink, suitable for tests and for in-process introspection.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }

    /// Snapshot every event recorded so far, in append order.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit sink mutex poisoned").clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, event: &AuditEvent) -> Result<(), WorkflowError> {
        self.events.lock().expect("audit sink mutex poisoned").push(event.clone());
        Ok(())
    }
}

/// JSONL file sink: each event is appended as one line, matching this
/// engine's own workflow wire format.
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Open (creating if necessary) an append-only audit log at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WorkflowError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| WorkflowError::new(awf_error::ErrorCode::Internal, "failed to create audit log directory").with_source(e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| WorkflowError::new(awf_error::ErrorCode::Internal, "failed to open audit log file").with_source(e))?;
        Ok(Self { path, file: Mutex::new(file) })
    }

    /// The path this sink writes to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, event: &AuditEvent) -> Result<(), WorkflowError> {
        let line = serde_json::to_string(event)
            .map_err(|e| WorkflowError::new(awf_error::ErrorCode::Internal, "failed to encode audit event").with_source(e))?;
        let mut file = self.file.lock().expect("audit sink mutex poisoned");
        writeln!(file, "{line}")
            .map_err(|e| WorkflowError::new(awf_error::ErrorCode::Internal, "failed to append audit event").with_source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn sanitize_redacts_authorization_and_credential_keys() {
        let args = serde_json::json!({
            "url": "https://api.example.com",
            "headers": {"Authorization": "Bearer secret-token"}
        });
        let sanitized = sanitize_args_digest(&args);
        assert_eq!(sanitized["headers"]["Authorization"], serde_json::json!(REDACTED));
        assert_eq!(sanitized["url"], serde_json::json!("https://api.example.com"));
    }

    #[test]
    fn sanitize_redacts_credential_ref_markers() {
        let args = serde_json::json!({"token": {"credentialRef": {"id": "cred1"}}});
        let sanitized = sanitize_args_digest(&args);
        assert_eq!(sanitized["token"], serde_json::json!(REDACTED));
    }

    #[test]
    fn in_memory_sink_preserves_append_order() {
        let sink = InMemoryAuditSink::new();
        sink.append(&AuditEvent::ExecutionStarted { timestamp: now(), execution_id: "e1".to_string(), agent_id: "a1".to_string() }).unwrap();
        sink.append(&AuditEvent::ExecutionFinished { timestamp: now(), execution_id: "e1".to_string(), status: "success".to_string(), duration_ms: 10 })
            .unwrap();
        let events = sink.events();
        assert_eq!(events.len(), 2);
        matches!(events[0], AuditEvent::ExecutionStarted { .. });
    }

    #[test]
    fn file_sink_appends_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileAuditSink::open(dir.path().join("audit.jsonl")).unwrap();
        sink.append(&AuditEvent::CredentialUsed { timestamp: now(), execution_id: "e1".to_string(), operation_id: "op1".to_string(), credential_id: "cred1".to_string() })
            .unwrap();
        sink.append(&AuditEvent::CredentialUsed { timestamp: now(), execution_id: "e1".to_string(), operation_id: "op2".to_string(), credential_id: "cred1".to_string() })
            .unwrap();
        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let parsed: Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["type"], serde_json::json!("credentialUsed"));
        }
    }
}
