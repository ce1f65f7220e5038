// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire message shapes and the parsed workflow they assemble into.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single line of the JSONL workflow stream, as it appears on the wire.
///
/// The `operation` field of `OperationUpdate` is a JSON object with exactly
/// one top-level key: the operation kind name, whose value is the kind's
/// argument object. This is the convention `spec.md` §3 leaves to
/// implementers; see `DESIGN.md` for the resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WireMessage {
    /// Introduces or replaces an operation definition.
    OperationUpdate {
        /// Unique identifier for this operation within the workflow.
        operation_id: String,
        /// Single-key object: `{ "<Kind>": { ...args } }`.
        operation: serde_json::Value,
    },
    /// Terminates the message stream and specifies execution order.
    BeginExecution {
        /// Identifier for the execution produced by this workflow.
        execution_id: String,
        /// The declared, authoritative execution order.
        operation_order: Vec<String>,
    },
}

/// A parsed, pre-validation operation: kind name plus its concrete argument
/// object (still containing unresolved paths and credential references).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationDefinition {
    /// Unique identifier, matching `[A-Za-z0-9_-]{1,100}`.
    pub operation_id: String,
    /// Catalog entry name (e.g. `"ApiCall"`).
    pub kind: String,
    /// Operation-kind-specific argument object.
    pub args: serde_json::Value,
}

/// A fully parsed workflow, ready for validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workflow {
    /// Execution identifier from the terminating `BeginExecution` message.
    pub execution_id: String,
    /// Operation definitions keyed by `operation_id`.
    pub operations: HashMap<String, OperationDefinition>,
    /// The authoritative execution order; a subset of `operations.keys()`.
    pub order: Vec<String>,
}

impl Workflow {
    /// Look up an operation definition by ID.
    #[must_use]
    pub fn operation(&self, operation_id: &str) -> Option<&OperationDefinition> {
        self.operations.get(operation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_update_wire_shape() {
        let line = r#"{"type":"operationUpdate","operationId":"a","operation":{"ApiCall":{"method":"GET","url":"https://api.example.com/users","outputPath":"/workflow/users"}}}"#;
        let msg: WireMessage = serde_json::from_str(line).unwrap();
        match msg {
            WireMessage::OperationUpdate {
                operation_id,
                operation,
            } => {
                assert_eq!(operation_id, "a");
                assert!(operation.get("ApiCall").is_some());
            }
            WireMessage::BeginExecution { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn begin_execution_wire_shape() {
        let line = r#"{"type":"beginExecution","executionId":"e1","operationOrder":["a","b"]}"#;
        let msg: WireMessage = serde_json::from_str(line).unwrap();
        match msg {
            WireMessage::BeginExecution {
                execution_id,
                operation_order,
            } => {
                assert_eq!(execution_id, "e1");
                assert_eq!(operation_order, vec!["a", "b"]);
            }
            WireMessage::OperationUpdate { .. } => panic!("wrong variant"),
        }
    }

    #[test]
    fn workflow_operation_lookup() {
        let mut operations = HashMap::new();
        operations.insert(
            "a".to_string(),
            OperationDefinition {
                operation_id: "a".to_string(),
                kind: "Wait".to_string(),
                args: serde_json::json!({"duration": 0}),
            },
        );
        let wf = Workflow {
            execution_id: "e1".to_string(),
            operations,
            order: vec!["a".to_string()],
        };
        assert!(wf.operation("a").is_some());
        assert!(wf.operation("missing").is_none());
    }
}
