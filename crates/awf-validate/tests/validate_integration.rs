// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests exercising `validate` against realistic multi-operation
//! workflows, as opposed to the single-check unit tests in `src/lib.rs`.

use awf_core::{CatalogSnapshot, CredentialDescriptor, OperationDefinition, Workflow};
use awf_validate::validate;
use serde_json::json;
use std::collections::{HashMap, HashSet};

fn workflow(ops: Vec<(&str, &str, serde_json::Value)>, order: Vec<&str>) -> Workflow {
    let mut operations = HashMap::new();
    for (id, kind, args) in ops {
        operations.insert(id.to_string(), OperationDefinition { operation_id: id.to_string(), kind: kind.to_string(), args });
    }
    Workflow { execution_id: "e1".to_string(), operations, order: order.into_iter().map(String::from).collect() }
}

fn permissive_catalog() -> CatalogSnapshot {
    let mut apis = HashMap::new();
    apis.insert("api.example.com".to_string(), vec!["/".to_string()]);
    apis.insert("api.other.com".to_string(), vec!["/".to_string()]);
    CatalogSnapshot {
        operation_kinds: awf_catalog::all_kinds().into_iter().map(String::from).collect::<HashSet<_>>(),
        apis,
        credentials: vec![
            CredentialDescriptor { id: "cred1".to_string(), credential_type: "bearer-token".to_string() },
            CredentialDescriptor { id: "cred2".to_string(), credential_type: "api-key".to_string() },
        ],
    }
}

#[test]
fn fetch_filter_loop_store_pipeline_passes() {
    let wf = workflow(
        vec![
            ("fetch", "ApiCall", json!({"method": "GET", "url": "https://api.example.com/users", "outputPath": "/workflow/raw"})),
            ("extract", "FilterData", json!({"inputPath": [1, 2, 3], "conditions": [], "outputPath": "/workflow/users"})),
            ("filter", "FilterData", json!({"inputPath": "/workflow/users", "conditions": [], "outputPath": "/workflow/active"})),
            ("store_one", "StoreData", json!({"inputPath": "/workflow/_loop/current", "storage": "localStorage", "key": "item"})),
            ("loop", "Loop", json!({"inputPath": "/workflow/active", "operations": ["store_one"]})),
        ],
        vec!["fetch", "extract", "filter", "loop"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn merge_data_with_two_array_sources_passes() {
    let wf = workflow(
        vec![
            ("a", "FilterData", json!({"inputPath": [1, 2], "conditions": [], "outputPath": "/workflow/a"})),
            ("b", "FilterData", json!({"inputPath": [3, 4], "conditions": [], "outputPath": "/workflow/b"})),
            ("merged", "MergeData", json!({"sources": ["/workflow/a", "/workflow/b"], "outputPath": "/workflow/merged"})),
        ],
        vec!["a", "b", "merged"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn api_call_referencing_disallowed_credential_is_rejected() {
    let wf = workflow(
        vec![(
            "a",
            "ApiCall",
            json!({
                "method": "GET",
                "url": "https://api.example.com/secure",
                "outputPath": "/workflow/secure",
                "headers": {"Authorization": {"credentialRef": {"id": "cred-not-registered"}}},
            }),
        )],
        vec!["a"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(!report.valid);
    assert_eq!(report.errors[0].category, awf_core::IssueCategory::Permission);
}

#[test]
fn filter_referencing_a_later_producer_is_dependency_error() {
    let wf = workflow(
        vec![
            ("filter", "FilterData", json!({"inputPath": "/workflow/users", "conditions": [], "outputPath": "/workflow/active"})),
            ("fetch", "ApiCall", json!({"method": "GET", "url": "https://api.example.com/users", "outputPath": "/workflow/users"})),
        ],
        vec!["filter", "fetch"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(!report.valid);
    assert_eq!(report.errors[0].category, awf_core::IssueCategory::Dependency);
}

#[test]
fn conditional_branch_referencing_undefined_operation_id_is_untouched_by_dependency_check() {
    // ifTrue/ifFalse name operation IDs, not data-model paths, so the
    // dependency check (which only walks `/workflow/...` references) never
    // inspects them; dispatch-time the executor treats a missing ID as a
    // skip rather than failing validation up front.
    let wf = workflow(
        vec![
            ("seed", "StoreData", json!({"inputPath": 1, "storage": "localStorage", "key": "flag"})),
            (
                "c",
                "Conditional",
                json!({"condition": {"path": "/workflow/_loop/current", "operator": "empty"}, "ifTrue": ["does-not-exist"], "ifFalse": []}),
            ),
        ],
        vec!["seed", "c"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(report.valid, "{:?}", report.errors);
}

#[test]
fn loop_over_a_scalar_producing_operation_is_type_error() {
    let wf = workflow(
        vec![
            ("seed", "TransformData", json!({"inputPath": [1, 2, 3], "transform": "aggregate", "config": {"op": "count"}, "outputPath": "/workflow/raw"})),
            ("noop", "Wait", json!({"duration": 0})),
            ("loop", "Loop", json!({"inputPath": "/workflow/raw", "operations": ["noop"]})),
        ],
        vec!["seed", "loop"],
    );
    let report = validate(&wf, &permissive_catalog());
    assert!(!report.valid);
    assert_eq!(report.errors[0].category, awf_core::IssueCategory::Type);
}

#[test]
fn many_independent_operations_all_pass() {
    let ops: Vec<(&str, &str, serde_json::Value)> = vec![
        ("w1", "Wait", json!({"duration": 0})),
        ("w2", "Wait", json!({"duration": 0})),
        ("w3", "Wait", json!({"duration": 0})),
    ];
    let wf = workflow(ops, vec!["w1", "w2", "w3"]);
    let report = validate(&wf, &permissive_catalog());
    assert!(report.valid, "{:?}", report.errors);
}
