// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reference-path resolution inside operation argument trees
//! (`spec.md` §4.1).
//!
//! Two forms are recognised: a string literal equal to a valid path
//! (substituted with the referenced value by deep copy), or a path
//! embedded in a larger string as `{/workflow/...}` (substituted with the
//! stringified value). The resolver is used twice: once by the validator
//! (to collect reference paths for the dependency DAG check, without
//! touching the data model) and once by the executor (to produce the
//! concrete-args view before dispatch).

use crate::model::DataModel;
use crate::path::{is_path_literal, parse_path};
use awf_error::WorkflowError;
use serde_json::Value;

/// Render a JSON value as the executor's `toString` for template
/// substitution: strings pass through unquoted, scalars use their natural
/// text form, and arrays/objects use canonical JSON.
#[must_use]
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Recursively resolve every bare path and `{path}` template occurrence in
/// `value` against `model`, returning a new concrete-args value. Object
/// values that are exactly the `{credentialRef:{id}}` marker are left
/// untouched — credential resolution is a separate pass (`awf-credential`).
pub fn resolve_references(value: &Value, model: &DataModel) -> Result<Value, WorkflowError> {
    if awf_core::as_credential_ref(value).is_some() {
        return Ok(value.clone());
    }
    match value {
        Value::String(s) => resolve_string(s, model),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(resolve_references(item, model)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_references(v, model)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_string(s: &str, model: &DataModel) -> Result<Value, WorkflowError> {
    if is_path_literal(s) {
        let path = parse_path(s)?;
        return model.read(&path);
    }
    if !s.contains('{') {
        return Ok(Value::String(s.to_string()));
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let inner = &after_open[..close];
                if is_path_literal(inner) {
                    let path = parse_path(inner)?;
                    let value = model.read(&path)?;
                    out.push_str(&stringify(&value));
                } else {
                    // Not a path template; keep the braces literally.
                    out.push('{');
                    out.push_str(inner);
                    out.push('}');
                }
                rest = &after_open[close + 1..];
            }
            None => {
                out.push('{');
                rest = after_open;
            }
        }
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

/// Collect every reference path mentioned in `value` (bare or templated),
/// without requiring a [`DataModel`]. Used by the validator to build the
/// dependency DAG before any operation runs.
pub fn collect_reference_paths(value: &Value, out: &mut Vec<String>) {
    if awf_core::as_credential_ref(value).is_some() {
        return;
    }
    match value {
        Value::String(s) => collect_from_string(s, out),
        Value::Array(items) => {
            for item in items {
                collect_reference_paths(item, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect_reference_paths(v, out);
            }
        }
        _ => {}
    }
}

fn collect_from_string(s: &str, out: &mut Vec<String>) {
    if is_path_literal(s) {
        out.push(s.to_string());
        return;
    }
    let mut rest = s;
    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        if let Some(close) = after_open.find('}') {
            let inner = &after_open[..close];
            if is_path_literal(inner) {
                out.push(inner.to_string());
            }
            rest = &after_open[close + 1..];
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;

    fn model_with_users() -> DataModel {
        let mut model = DataModel::new();
        model
            .write(
                &parse_path("/workflow/users").unwrap(),
                serde_json::json!([{"id": 1, "points": 200}]),
            )
            .unwrap();
        model
    }

    #[test]
    fn resolves_bare_path_by_deep_copy() {
        let model = model_with_users();
        let resolved = resolve_references(&serde_json::json!("/workflow/users"), &model).unwrap();
        assert_eq!(resolved, serde_json::json!([{"id": 1, "points": 200}]));
    }

    #[test]
    fn resolves_templated_path_inside_string() {
        let model = model_with_users();
        let args = serde_json::json!("url-of/{/workflow/users[0].id}/end");
        let resolved = resolve_references(&args, &model).unwrap();
        assert_eq!(resolved, serde_json::json!("url-of/1/end"));
    }

    #[test]
    fn leaves_non_path_braces_untouched() {
        let model = model_with_users();
        let args = serde_json::json!("{not a path}");
        let resolved = resolve_references(&args, &model).unwrap();
        assert_eq!(resolved, serde_json::json!("{not a path}"));
    }

    #[test]
    fn skips_credential_ref_markers() {
        let model = model_with_users();
        let args = serde_json::json!({"credentialRef": {"id": "cred1"}});
        let resolved = resolve_references(&args, &model).unwrap();
        assert_eq!(resolved, args);
    }

    #[test]
    fn resolves_recursively_through_objects_and_arrays() {
        let model = model_with_users();
        let args = serde_json::json!({
            "headers": {"X-Count": "{/workflow/users[0].points}"},
            "items": ["/workflow/users"]
        });
        let resolved = resolve_references(&args, &model).unwrap();
        assert_eq!(resolved["headers"]["X-Count"], serde_json::json!("200"));
        assert_eq!(resolved["items"][0], serde_json::json!([{"id": 1, "points": 200}]));
    }

    #[test]
    fn missing_path_propagates_data_error() {
        let model = model_with_users();
        let err = resolve_references(&serde_json::json!("/workflow/missing"), &model).unwrap_err();
        assert_eq!(err.code, awf_error::ErrorCode::DataNotFound);
    }

    #[test]
    fn collect_reference_paths_finds_bare_and_templated() {
        let args = serde_json::json!({
            "a": "/workflow/users",
            "b": "prefix-{/workflow/users[0].id}-suffix",
            "c": "plain string",
            "d": {"credentialRef": {"id": "cred1"}}
        });
        let mut out = Vec::new();
        collect_reference_paths(&args, &mut out);
        out.sort();
        assert_eq!(out, vec!["/workflow/users".to_string(), "/workflow/users[0].id".to_string()]);
    }

    #[test]
    fn stringify_forms() {
        assert_eq!(stringify(&serde_json::json!(null)), "null");
        assert_eq!(stringify(&serde_json::json!(true)), "true");
        assert_eq!(stringify(&serde_json::json!(42)), "42");
        assert_eq!(stringify(&serde_json::json!("hi")), "hi");
        assert_eq!(stringify(&serde_json::json!([1, 2])), "[1,2]");
    }
}
