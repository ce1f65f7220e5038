// SPDX-License-Identifier: MIT OR Apache-2.0
//! `MergeData` (`spec.md` §4.2).

use awf_error::{ErrorCode, WorkflowError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Merge strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeStrategy {
    /// Flatten all source arrays, preserving order and duplicates.
    Concat,
    /// Flatten all source arrays, keeping only the first occurrence of each
    /// distinct (by deep equality) element.
    Union,
    /// Keep only elements present (by deep equality) in every source.
    Intersect,
    /// Recursively merge object sources, right source wins on conflicts.
    DeepMerge,
}

/// Concrete arguments for `MergeData`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeDataArgs {
    /// Sources to merge, already resolved to concrete values. Must contain
    /// at least two entries (enforced at validation).
    pub sources: Vec<Value>,
    /// Merge strategy.
    pub strategy: MergeStrategy,
    /// Where to write the result.
    pub output_path: String,
}

fn as_array(value: &Value) -> Result<&[Value], WorkflowError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| WorkflowError::new(ErrorCode::DataTypeMismatch, "MergeData source must resolve to an array"))
}

fn deep_merge(a: Value, b: Value) -> Value {
    match (a, b) {
        (Value::Object(mut a_map), Value::Object(b_map)) => {
            for (k, bv) in b_map {
                let merged = match a_map.remove(&k) {
                    Some(av) => deep_merge(av, bv),
                    None => bv,
                };
                a_map.insert(k, merged);
            }
            Value::Object(a_map)
        }
        (_, b) => b,
    }
}

/// Merge `args.sources` per `args.strategy`.
pub fn execute(args: &MergeDataArgs) -> Result<Value, WorkflowError> {
    if args.sources.len() < 2 {
        return Err(WorkflowError::new(ErrorCode::ValidationStructure, "MergeData requires at least two sources"));
    }
    match args.strategy {
        MergeStrategy::Concat => {
            let mut out = Vec::new();
            for source in &args.sources {
                out.extend(as_array(source)?.iter().cloned());
            }
            Ok(Value::Array(out))
        }
        MergeStrategy::Union => {
            let mut out: Vec<Value> = Vec::new();
            for source in &args.sources {
                for item in as_array(source)? {
                    if !out.contains(item) {
                        out.push(item.clone());
                    }
                }
            }
            Ok(Value::Array(out))
        }
        MergeStrategy::Intersect => {
            let arrays: Vec<&[Value]> = args.sources.iter().map(as_array).collect::<Result<_, _>>()?;
            let (first, rest) = arrays.split_first().expect("len >= 2 checked above");
            let mut out = Vec::new();
            for item in *first {
                if !out.contains(item) && rest.iter().all(|arr| arr.contains(item)) {
                    out.push(item.clone());
                }
            }
            Ok(Value::Array(out))
        }
        MergeStrategy::DeepMerge => {
            let mut iter = args.sources.iter().cloned();
            let first = iter.next().expect("len >= 2 checked above");
            Ok(iter.fold(first, deep_merge))
        }
    }
}
