// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON Lines parsing for workflow submissions.
//!
//! Each line is a complete JSON object; empty lines are ignored; there are
//! no comments. Encoding is UTF-8. The maximum line length is 256 KB. Two
//! message kinds are accepted: `operationUpdate` and `beginExecution`
//! (`spec.md` §3, §6). The older batched framing
//! (`{"operationUpdate": {"operations": [...]}}`) is explicitly rejected —
//! see `DESIGN.md` for why the per-line form was chosen as canonical.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_core::{is_valid_identifier, OperationDefinition, WireMessage, Workflow};
use awf_error::{ErrorCode, WorkflowError};
use std::collections::HashMap;

/// Maximum length of a single JSONL line, in bytes (`spec.md` §6).
pub const MAX_LINE_LEN: usize = 256 * 1024;

/// Parse a complete JSONL workflow submission into a [`Workflow`].
///
/// `bytes` must be valid UTF-8. Lines are split on `\n`; a trailing `\r` is
/// stripped from each line so CRLF input is also accepted. Blank lines
/// (after trimming) are ignored.
pub fn parse_workflow(bytes: &[u8]) -> Result<Workflow, WorkflowError> {
    let text = std::str::from_utf8(bytes).map_err(|e| {
        WorkflowError::new(ErrorCode::StructureMalformed, "workflow bytes are not valid UTF-8")
            .with_context("utf8_error", e.to_string())
    })?;

    let mut operations: HashMap<String, OperationDefinition> = HashMap::new();
    let mut insertion_order: Vec<String> = Vec::new();
    let mut begin: Option<(String, Vec<String>)> = None;
    let mut saw_begin_not_last = false;

    for (line_no, raw_line) in text.split('\n').enumerate() {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        if line.trim().is_empty() {
            continue;
        }
        if line.len() > MAX_LINE_LEN {
            return Err(WorkflowError::new(
                ErrorCode::StructureMalformed,
                format!("line {} exceeds maximum length of {} bytes", line_no + 1, MAX_LINE_LEN),
            ));
        }
        if begin.is_some() {
            // A message appeared after BeginExecution: framing violation.
            saw_begin_not_last = true;
        }

        reject_batched_framing(line, line_no + 1)?;

        let msg: WireMessage = serde_json::from_str(line).map_err(|e| {
            WorkflowError::new(
                ErrorCode::StructureMalformed,
                format!("line {} failed to parse: {e}", line_no + 1),
            )
            .with_context("line", line_no + 1)
        })?;

        match msg {
            WireMessage::OperationUpdate {
                operation_id,
                operation,
            } => {
                if !is_valid_identifier(&operation_id) {
                    return Err(WorkflowError::new(
                        ErrorCode::StructureMalformed,
                        format!("operationId {operation_id:?} does not match [A-Za-z0-9_-]{{1,100}}"),
                    ));
                }
                let (kind, args) = split_operation_payload(&operation_id, operation)?;
                if !operations.contains_key(&operation_id) {
                    insertion_order.push(operation_id.clone());
                }
                operations.insert(operation_id.clone(), OperationDefinition { operation_id, kind, args });
            }
            WireMessage::BeginExecution {
                execution_id,
                operation_order,
            } => {
                if begin.is_some() {
                    return Err(WorkflowError::new(
                        ErrorCode::StructureFraming,
                        "more than one beginExecution message in workflow",
                    ));
                }
                begin = Some((execution_id, operation_order));
            }
        }
    }

    let (execution_id, order) = begin.ok_or_else(|| {
        WorkflowError::new(ErrorCode::StructureFraming, "workflow has no beginExecution message")
    })?;

    if saw_begin_not_last {
        return Err(WorkflowError::new(
            ErrorCode::StructureFraming,
            "beginExecution must be the last message in the workflow",
        ));
    }

    Ok(Workflow {
        execution_id,
        operations,
        order,
    })
}

/// Detect and reject the alternate batched wire framing
/// `{"operationUpdate": {"operations": [...]}}`.
fn reject_batched_framing(line: &str, line_no: usize) -> Result<(), WorkflowError> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
        return Ok(()); // malformed JSON is reported by the real parse below
    };
    let Some(obj) = value.as_object() else {
        return Ok(());
    };
    if let Some(update) = obj.get("operationUpdate") {
        if update.get("operations").and_then(|v| v.as_array()).is_some() {
            return Err(WorkflowError::new(
                ErrorCode::StructureFraming,
                format!(
                    "line {line_no}: batched operationUpdate framing is not supported; submit one operation per line"
                ),
            ));
        }
    }
    Ok(())
}

/// Split the `operation` wrapper object into `(kind, args)`. The wrapper
/// must have exactly one top-level key, per `spec.md` §3's "args has
/// exactly one top-level key" convention (resolved: the key lives in the
/// wrapper, not inside `args` itself — see `DESIGN.md`).
fn split_operation_payload(
    operation_id: &str,
    operation: serde_json::Value,
) -> Result<(String, serde_json::Value), WorkflowError> {
    let obj = operation.as_object().ok_or_else(|| {
        WorkflowError::new(ErrorCode::StructureMalformed, "operation payload must be a JSON object")
            .with_operation_id(operation_id.to_string())
    })?;
    if obj.len() != 1 {
        return Err(WorkflowError::new(
            ErrorCode::StructureMalformed,
            format!("operation payload must have exactly one top-level key, found {}", obj.len()),
        )
        .with_operation_id(operation_id.to_string()));
    }
    let (kind, args) = obj.iter().next().expect("checked len == 1");
    Ok((kind.clone(), args.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fetch_and_filter_scenario() {
        let input = concat!(
            r#"{"type":"operationUpdate","operationId":"a","operation":{"ApiCall":{"method":"GET","url":"https://api.example.com/users","outputPath":"/workflow/users"}}}"#,
            "\n",
            r#"{"type":"operationUpdate","operationId":"b","operation":{"FilterData":{"inputPath":"/workflow/users","conditions":[{"field":"points","operator":">","value":100}],"outputPath":"/workflow/top"}}}"#,
            "\n",
            r#"{"type":"beginExecution","executionId":"e1","operationOrder":["a","b"]}"#,
        );
        let workflow = parse_workflow(input.as_bytes()).unwrap();
        assert_eq!(workflow.execution_id, "e1");
        assert_eq!(workflow.order, vec!["a", "b"]);
        assert_eq!(workflow.operation("a").unwrap().kind, "ApiCall");
        assert_eq!(workflow.operation("b").unwrap().kind, "FilterData");
    }

    #[test]
    fn blank_lines_are_ignored() {
        let input = "\n\n  \n{\"type\":\"beginExecution\",\"executionId\":\"e1\",\"operationOrder\":[]}\n\n";
        let workflow = parse_workflow(input.as_bytes()).unwrap();
        assert_eq!(workflow.execution_id, "e1");
    }

    #[test]
    fn missing_begin_execution_is_structure_error() {
        let input = r#"{"type":"operationUpdate","operationId":"a","operation":{"Wait":{"duration":0}}}"#;
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureFraming);
    }

    #[test]
    fn message_after_begin_execution_rejected() {
        let input = concat!(
            r#"{"type":"beginExecution","executionId":"e1","operationOrder":["a"]}"#,
            "\n",
            r#"{"type":"operationUpdate","operationId":"a","operation":{"Wait":{"duration":0}}}"#,
        );
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureFraming);
    }

    #[test]
    fn duplicate_begin_execution_rejected() {
        let input = concat!(
            r#"{"type":"beginExecution","executionId":"e1","operationOrder":[]}"#,
            "\n",
            r#"{"type":"beginExecution","executionId":"e2","operationOrder":[]}"#,
        );
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureFraming);
    }

    #[test]
    fn batched_framing_rejected() {
        let input = r#"{"operationUpdate":{"operations":[{"operationId":"a"}]}}"#;
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureFraming);
    }

    #[test]
    fn invalid_operation_id_rejected() {
        let input = r#"{"type":"operationUpdate","operationId":"has space","operation":{"Wait":{"duration":0}}}"#;
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureMalformed);
    }

    #[test]
    fn multi_key_operation_payload_rejected() {
        let input = r#"{"type":"operationUpdate","operationId":"a","operation":{"Wait":{"duration":0},"Extra":{}}}"#;
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureMalformed);
    }

    #[test]
    fn later_definition_replaces_earlier_one() {
        let input = concat!(
            r#"{"type":"operationUpdate","operationId":"a","operation":{"Wait":{"duration":0}}}"#,
            "\n",
            r#"{"type":"operationUpdate","operationId":"a","operation":{"Wait":{"duration":5}}}"#,
            "\n",
            r#"{"type":"beginExecution","executionId":"e1","operationOrder":["a"]}"#,
        );
        let workflow = parse_workflow(input.as_bytes()).unwrap();
        assert_eq!(workflow.operation("a").unwrap().args, serde_json::json!({"duration": 5}));
    }

    #[test]
    fn line_exceeding_max_length_rejected() {
        let huge_url = "x".repeat(MAX_LINE_LEN + 10);
        let input = format!(
            r#"{{"type":"operationUpdate","operationId":"a","operation":{{"Wait":{{"duration":"{huge_url}"}}}}}}"#
        );
        let err = parse_workflow(input.as_bytes()).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureMalformed);
    }

    #[test]
    fn invalid_utf8_rejected() {
        let bytes: &[u8] = &[0xff, 0xfe, 0xfd];
        let err = parse_workflow(bytes).unwrap_err();
        assert_eq!(err.code, ErrorCode::StructureMalformed);
    }
}
