// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Loop` (`spec.md` §4.2, §4.4).
//!
//! Like `Conditional`, `Loop` has no self-contained execution: it must
//! recursively re-enter the Executor's own dispatch loop for each element,
//! over the same set of operation definitions Loop itself is a member of.
//! That recursion belongs in the Executor, so this module only defines the
//! argument schema and the per-iteration binding paths the Executor writes
//! before invoking `operations` on each element.

use serde::Deserialize;
use serde_json::Value;

/// `/workflow/_loop/current`: the element bound for the iteration in
/// progress.
pub const CURRENT_BINDING_PATH: &str = "/workflow/_loop/current";

/// `/workflow/_loop/index`: the zero-based index of the iteration in
/// progress.
pub const INDEX_BINDING_PATH: &str = "/workflow/_loop/index";

/// Concrete arguments for `Loop`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopArgs {
    /// The array to iterate, already resolved.
    pub input_path: Value,
    /// Operation IDs run once per element, in order, with
    /// `CURRENT_BINDING_PATH`/`INDEX_BINDING_PATH` bound for the duration of
    /// the iteration.
    pub operations: Vec<String>,
    /// Where to write the collected per-iteration results, if any. Absent
    /// means the loop runs only for side effects.
    #[serde(default)]
    pub output_path: Option<String>,
}

impl LoopArgs {
    /// The elements to iterate, or a type-mismatch error if `inputPath`
    /// did not resolve to an array.
    pub fn elements(&self) -> Result<&[Value], awf_error::WorkflowError> {
        self.input_path.as_array().map(Vec::as_slice).ok_or_else(|| {
            awf_error::WorkflowError::new(awf_error::ErrorCode::DataTypeMismatch, "Loop.inputPath must resolve to an array")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_rejects_non_array() {
        let args = LoopArgs { input_path: serde_json::json!(1), operations: vec![], output_path: None };
        assert!(args.elements().is_err());
    }

    #[test]
    fn elements_returns_array_items() {
        let args = LoopArgs { input_path: serde_json::json!([1, 2, 3]), operations: vec!["op1".to_string()], output_path: None };
        assert_eq!(args.elements().unwrap().len(), 3);
    }

    #[test]
    fn deserializes_without_output_path() {
        let args: LoopArgs = serde_json::from_value(serde_json::json!({
            "inputPath": [],
            "operations": ["op1", "op2"]
        }))
        .unwrap();
        assert!(args.output_path.is_none());
        assert_eq!(args.operations, vec!["op1", "op2"]);
    }
}
