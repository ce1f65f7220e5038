// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Conditional` (`spec.md` §4.2, §4.4).
//!
//! Unlike the other kinds, `Conditional` has no output and is never
//! dispatched through the generic catalog path: the Executor evaluates it
//! directly (step 1 of the execution loop) to decide which branch's
//! operations to mark `skipped`. This module only defines its argument
//! schema and the pure comparison logic.

use awf_datamodel::DataModel;
use awf_error::WorkflowError;
use serde::Deserialize;
use serde_json::Value;

/// Condition comparison operator, including the two existence checks not
/// shared with `FilterData` (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConditionOperator {
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Gte,
    /// `<=`
    #[serde(rename = "<=")]
    Lte,
    /// `exists`: `true` iff `path` resolves to a value.
    #[serde(rename = "exists")]
    Exists,
    /// `empty`: `true` iff `path` is missing, or resolves to an empty
    /// string/array/object, or `null`.
    #[serde(rename = "empty")]
    Empty,
}

/// The condition evaluated by `Conditional`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionSpec {
    /// Path read to obtain the left-hand side. Left unresolved by the
    /// executor's generic argument-resolution pass, since `exists`/`empty`
    /// must tolerate a missing path.
    pub path: String,
    /// Comparison operator.
    pub operator: ConditionOperator,
    /// Right-hand side, required for all operators except `exists`/`empty`.
    #[serde(default)]
    pub value: Option<Value>,
}

/// Concrete arguments for `Conditional`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalArgs {
    /// The condition deciding which branch runs.
    pub condition: ConditionSpec,
    /// Operation IDs to run when the condition is true.
    pub if_true: Vec<String>,
    /// Operation IDs to run when the condition is false. Operations in
    /// whichever branch is not taken are marked `skipped`, not omitted.
    #[serde(default)]
    pub if_false: Option<Vec<String>>,
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn compare_scalar(lhs: &Value, rhs: &Value, op: ConditionOperator) -> bool {
    match op {
        ConditionOperator::Eq => lhs == rhs,
        ConditionOperator::Ne => lhs != rhs,
        ConditionOperator::Gt | ConditionOperator::Lt | ConditionOperator::Gte | ConditionOperator::Lte => {
            let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) else { return false };
            match op {
                ConditionOperator::Gt => a > b,
                ConditionOperator::Lt => a < b,
                ConditionOperator::Gte => a >= b,
                ConditionOperator::Lte => a <= b,
                _ => unreachable!(),
            }
        }
        ConditionOperator::Exists | ConditionOperator::Empty => unreachable!("handled separately"),
    }
}

/// Evaluate `spec.condition`. `exists`/`empty` tolerate a missing path;
/// every other operator requires the path to resolve (the validator
/// already checked this statically).
pub fn evaluate(spec: &ConditionSpec, model: &DataModel) -> Result<bool, WorkflowError> {
    let path = awf_datamodel::parse_path(&spec.path)?;
    let read = model.read(&path);
    match spec.operator {
        ConditionOperator::Exists => Ok(read.is_ok()),
        ConditionOperator::Empty => Ok(read.map(|v| is_empty(&v)).unwrap_or(true)),
        op => {
            let lhs = read?;
            let rhs = spec.value.clone().unwrap_or(Value::Null);
            Ok(compare_scalar(&lhs, &rhs, op))
        }
    }
}
