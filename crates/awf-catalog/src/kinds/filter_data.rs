// SPDX-License-Identifier: MIT OR Apache-2.0
//! `FilterData` (`spec.md` §4.2).

use awf_error::{ErrorCode, WorkflowError};
use serde::Deserialize;
use serde_json::Value;

/// A single filter condition.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    /// Field name to compare (empty string compares the element itself).
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand side of the comparison.
    pub value: Value,
}

/// Filter comparison operator (`spec.md` §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Operator {
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
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `contains`
    #[serde(rename = "contains")]
    Contains,
    /// `startsWith`
    #[serde(rename = "startsWith")]
    StartsWith,
    /// `endsWith`
    #[serde(rename = "endsWith")]
    EndsWith,
}

/// Concrete arguments for `FilterData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDataArgs {
    /// The array to filter, already resolved to its concrete value.
    pub input_path: Value,
    /// All conditions must hold for an element to be retained.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Where to write the filtered array.
    pub output_path: String,
}

fn field_value<'a>(item: &'a Value, field: &str) -> Option<&'a Value> {
    if field.is_empty() {
        Some(item)
    } else {
        item.as_object().and_then(|o| o.get(field))
    }
}

fn evaluate(item: &Value, cond: &Condition) -> bool {
    let Some(lhs) = field_value(item, &cond.field) else { return false };
    match cond.operator {
        Operator::Eq => lhs == &cond.value,
        Operator::Ne => lhs != &cond.value,
        Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
            let (Some(a), Some(b)) = (lhs.as_f64(), cond.value.as_f64()) else { return false };
            match cond.operator {
                Operator::Gt => a > b,
                Operator::Lt => a < b,
                Operator::Gte => a >= b,
                Operator::Lte => a <= b,
                _ => unreachable!(),
            }
        }
        Operator::In => cond.value.as_array().map(|arr| arr.contains(lhs)).unwrap_or(false),
        Operator::Contains => match lhs {
            Value::String(s) => cond.value.as_str().map(|needle| s.contains(needle)).unwrap_or(false),
            Value::Array(arr) => arr.contains(&cond.value),
            _ => false,
        },
        Operator::StartsWith => {
            let (Some(s), Some(prefix)) = (lhs.as_str(), cond.value.as_str()) else { return false };
            s.starts_with(prefix)
        }
        Operator::EndsWith => {
            let (Some(s), Some(suffix)) = (lhs.as_str(), cond.value.as_str()) else { return false };
            s.ends_with(suffix)
        }
    }
}

/// Filter `args.input_path`, retaining elements for which every condition
/// holds.
pub fn execute(args: &FilterDataArgs) -> Result<Value, WorkflowError> {
    let items = args
        .input_path
        .as_array()
        .ok_or_else(|| WorkflowError::new(ErrorCode::DataTypeMismatch, "FilterData.inputPath must resolve to an array"))?;
    let filtered: Vec<Value> = items
        .iter()
        .filter(|item| args.conditions.iter().all(|c| evaluate(item, c)))
        .cloned()
        .collect();
    Ok(Value::Array(filtered))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_with(input: Value, conditions: Vec<Condition>) -> FilterDataArgs {
        FilterDataArgs { input_path: input, conditions, output_path: "/workflow/out".to_string() }
    }

    #[test]
    fn empty_conditions_is_identity() {
        let input = serde_json::json!([{"id": 1}, {"id": 2}]);
        let args = args_with(input.clone(), vec![]);
        assert_eq!(execute(&args).unwrap(), input);
    }

    #[test]
    fn filters_by_numeric_comparison() {
        let input = serde_json::json!([{"points": 50}, {"points": 200}]);
        let cond = Condition { field: "points".to_string(), operator: Operator::Gt, value: serde_json::json!(100) };
        let args = args_with(input, vec![cond]);
        assert_eq!(execute(&args).unwrap(), serde_json::json!([{"points": 200}]));
    }

    #[test]
    fn all_conditions_must_hold() {
        let input = serde_json::json!([{"a": 1, "b": "x"}, {"a": 1, "b": "y"}]);
        let conds = vec![
            Condition { field: "a".to_string(), operator: Operator::Eq, value: serde_json::json!(1) },
            Condition { field: "b".to_string(), operator: Operator::Eq, value: serde_json::json!("x") },
        ];
        let args = args_with(input, conds);
        assert_eq!(execute(&args).unwrap(), serde_json::json!([{"a": 1, "b": "x"}]));
    }

    #[test]
    fn non_array_input_is_data_error() {
        let args = args_with(serde_json::json!({"not": "an array"}), vec![]);
        let err = execute(&args).unwrap_err();
        assert_eq!(err.code, ErrorCode::DataTypeMismatch);
    }

    #[test]
    fn string_operators() {
        let input = serde_json::json!([{"name": "alice"}, {"name": "bob"}]);
        let cond = Condition { field: "name".to_string(), operator: Operator::StartsWith, value: serde_json::json!("al") };
        let args = args_with(input, vec![cond]);
        assert_eq!(execute(&args).unwrap(), serde_json::json!([{"name": "alice"}]));
    }

    #[test]
    fn in_operator() {
        let input = serde_json::json!([{"status": "open"}, {"status": "closed"}]);
        let cond = Condition {
            field: "status".to_string(),
            operator: Operator::In,
            value: serde_json::json!(["open", "pending"]),
        };
        let args = args_with(input, vec![cond]);
        assert_eq!(execute(&args).unwrap(), serde_json::json!([{"status": "open"}]));
    }
}
