// SPDX-License-Identifier: MIT OR Apache-2.0
//! `TransformData` (`spec.md` §4.2).

use awf_error::{ErrorCode, WorkflowError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Which transform to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// Per-field rewrites defined in `config.mapping` (no user expressions).
    Map,
    /// Stable sort by `config.field`.
    Sort,
    /// Group into `{groupValue: [items]}` by `config.field`.
    Group,
    /// Reduce `config.field` to a scalar via `config.op`.
    Aggregate,
    /// Project each element down to `config.fields`.
    Select,
}

/// Aggregation reducer for `TransformData { transform: "aggregate" }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Sum of numeric field values.
    Sum,
    /// Minimum numeric field value.
    Min,
    /// Maximum numeric field value.
    Max,
    /// Arithmetic mean of numeric field values.
    Avg,
    /// Number of elements.
    Count,
}

/// Concrete arguments for `TransformData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformDataArgs {
    /// The array to transform, already resolved.
    pub input_path: Value,
    /// Which transform to apply.
    pub transform: Transform,
    /// Transform-specific configuration.
    #[serde(default)]
    pub config: Value,
    /// Where to write the result.
    pub output_path: String,
}

fn items(args: &TransformDataArgs) -> Result<&[Value], WorkflowError> {
    args.input_path
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| WorkflowError::new(ErrorCode::DataTypeMismatch, "TransformData.inputPath must resolve to an array"))
}

fn config_str_field(config: &Value, key: &str) -> Result<String, WorkflowError> {
    config
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WorkflowError::new(ErrorCode::StructureMalformed, format!("transform config missing string field {key:?}")))
}

fn compare_field(a: &Value, b: &Value, field: &str) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    let av = a.as_object().and_then(|o| o.get(field));
    let bv = b.as_object().and_then(|o| o.get(field));
    match (av, bv) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater, // missing field sorts last
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx.partial_cmp(&fy).unwrap_or(Ordering::Equal),
            _ => x.as_str().unwrap_or_default().cmp(y.as_str().unwrap_or_default()),
        },
    }
}

fn do_sort(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    let field = config_str_field(&args.config, "field")?;
    let mut sorted: Vec<Value> = items(args)?.to_vec();
    sorted.sort_by(|a, b| compare_field(a, b, &field));
    Ok(Value::Array(sorted))
}

fn do_group(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    let field = config_str_field(&args.config, "field")?;
    let mut groups: Map<String, Value> = Map::new();
    for item in items(args)? {
        let group_value = item.as_object().and_then(|o| o.get(&field)).cloned().unwrap_or(Value::Null);
        let key = awf_datamodel::stringify(&group_value);
        match groups.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            Value::Array(arr) => arr.push(item.clone()),
            _ => unreachable!("group entries are always arrays"),
        }
    }
    Ok(Value::Object(groups))
}

fn do_aggregate(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    let op: AggregateOp = serde_json::from_value(
        args.config
            .get("op")
            .cloned()
            .ok_or_else(|| WorkflowError::new(ErrorCode::StructureMalformed, "aggregate config missing 'op'"))?,
    )
    .map_err(|e| WorkflowError::new(ErrorCode::StructureMalformed, "invalid aggregate op").with_source(e))?;
    let all = items(args)?;
    if op == AggregateOp::Count {
        return Ok(Value::from(all.len()));
    }
    let field = config_str_field(&args.config, "field")?;
    let values: Vec<f64> = all
        .iter()
        .filter_map(|item| item.as_object().and_then(|o| o.get(&field)).and_then(Value::as_f64))
        .collect();
    let result = match op {
        AggregateOp::Sum => values.iter().sum::<f64>(),
        AggregateOp::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        AggregateOp::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        AggregateOp::Avg => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        AggregateOp::Count => unreachable!(),
    };
    Ok(serde_json::json!(result))
}

fn do_select(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    let fields: Vec<String> = serde_json::from_value(
        args.config
            .get("fields")
            .cloned()
            .ok_or_else(|| WorkflowError::new(ErrorCode::StructureMalformed, "select config missing 'fields'"))?,
    )
    .map_err(|e| WorkflowError::new(ErrorCode::StructureMalformed, "select config 'fields' must be a string array").with_source(e))?;
    let projected: Vec<Value> = items(args)?
        .iter()
        .map(|item| {
            let mut out = Map::new();
            if let Some(obj) = item.as_object() {
                for f in &fields {
                    if let Some(v) = obj.get(f) {
                        out.insert(f.clone(), v.clone());
                    }
                }
            }
            Value::Object(out)
        })
        .collect();
    Ok(Value::Array(projected))
}

fn do_map(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    let mapping: HashMap<String, String> = serde_json::from_value(
        args.config
            .get("mapping")
            .cloned()
            .ok_or_else(|| WorkflowError::new(ErrorCode::StructureMalformed, "map config missing 'mapping'"))?,
    )
    .map_err(|e| WorkflowError::new(ErrorCode::StructureMalformed, "map config 'mapping' must be a string map").with_source(e))?;
    let mapped: Vec<Value> = items(args)?
        .iter()
        .map(|item| {
            let mut out = Map::new();
            for (new_key, source_field) in &mapping {
                let v = item.as_object().and_then(|o| o.get(source_field)).cloned().unwrap_or(Value::Null);
                out.insert(new_key.clone(), v);
            }
            Value::Object(out)
        })
        .collect();
    Ok(Value::Array(mapped))
}

/// Apply `args.transform` and return the result.
pub fn execute(args: &TransformDataArgs) -> Result<Value, WorkflowError> {
    match args.transform {
        Transform::Map => do_map(args),
        Transform::Sort => do_sort(args),
        Transform::Group => do_group(args),
        Transform::Aggregate => do_aggregate(args),
        Transform::Select => do_select(args),
    }
}
