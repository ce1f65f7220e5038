// SPDX-License-Identifier: MIT OR Apache-2.0
//! Integration tests chaining multiple catalog kinds together, the way the
//! executor would after each step's path resolution, as opposed to the
//! single-kind unit tests in each `kinds/*.rs` file.

use awf_catalog::kinds::{conditional, filter_data, loop_op, merge_data, store_data, transform_data};
use awf_catalog::InMemoryStorage;
use serde_json::json;

#[test]
fn filter_then_aggregate_then_store() {
    let filtered = filter_data::execute(&filter_data::FilterDataArgs {
        input_path: json!([{"points": 10}, {"points": 200}, {"points": 50}]),
        conditions: vec![filter_data::Condition {
            field: "points".to_string(),
            operator: filter_data::Operator::Gt,
            value: json!(20),
        }],
        output_path: "/workflow/qualified".to_string(),
    })
    .unwrap();
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    let aggregated = transform_data::execute(&transform_data::TransformDataArgs {
        input_path: filtered,
        transform: transform_data::Transform::Aggregate,
        config: json!({"op": "sum", "field": "points"}),
        output_path: "/workflow/total".to_string(),
    })
    .unwrap();
    assert_eq!(aggregated, json!(250.0));

    let storage = InMemoryStorage::new();
    store_data::execute(
        &store_data::StoreDataArgs { input_path: aggregated.clone(), storage: store_data::StorageKind::LocalStorage, key: "total".to_string() },
        &storage,
    )
    .unwrap();
    assert_eq!(storage.get("localStorage", "total"), Some(aggregated));
}

#[test]
fn merge_union_then_loop_elements() {
    let merged = merge_data::execute(&merge_data::MergeDataArgs {
        sources: vec![json!([1, 2, 3]), json!([2, 3, 4])],
        strategy: merge_data::MergeStrategy::Union,
        output_path: "/workflow/merged".to_string(),
    })
    .unwrap();
    assert_eq!(merged, json!([1, 2, 3, 4]));

    let loop_args = loop_op::LoopArgs { input_path: merged, operations: vec!["noop".to_string()], output_path: None };
    assert_eq!(loop_args.elements().unwrap().len(), 4);
}

#[test]
fn conditional_gates_on_aggregate_result() {
    let count = transform_data::execute(&transform_data::TransformDataArgs {
        input_path: json!([1, 2, 3]),
        transform: transform_data::Transform::Aggregate,
        config: json!({"op": "count"}),
        output_path: "/workflow/count".to_string(),
    })
    .unwrap();

    let spec = conditional::ConditionSpec {
        path: "/workflow/count".to_string(),
        operator: conditional::ConditionOperator::Gt,
        value: Some(json!(0)),
    };
    let mut model = awf_datamodel::DataModel::new();
    model.write(&awf_datamodel::parse_path("/workflow/count").unwrap(), count).unwrap();
    assert!(conditional::evaluate(&spec, &model).unwrap());
}

#[test]
fn deep_merge_strategy_combines_objects_right_wins() {
    let merged = merge_data::execute(&merge_data::MergeDataArgs {
        sources: vec![json!({"a": 1, "b": 1}), json!({"b": 2, "c": 3})],
        strategy: merge_data::MergeStrategy::DeepMerge,
        output_path: "/workflow/merged".to_string(),
    })
    .unwrap();
    assert_eq!(merged, json!({"a": 1, "b": 2, "c": 3}));
}

#[test]
fn select_then_group_pipeline() {
    let input = json!([
        {"team": "a", "name": "x", "score": 1},
        {"team": "b", "name": "y", "score": 2},
        {"team": "a", "name": "z", "score": 3}
    ]);

    let grouped = transform_data::execute(&transform_data::TransformDataArgs {
        input_path: input,
        transform: transform_data::Transform::Group,
        config: json!({"field": "team"}),
        output_path: "/workflow/grouped".to_string(),
    })
    .unwrap();

    let group_a = grouped.get("a").and_then(|v| v.as_array()).unwrap();
    assert_eq!(group_a.len(), 2);
}

#[test]
fn file_storage_roundtrip_through_store_data() {
    let dir = tempfile::tempdir().unwrap();
    let storage = awf_catalog::FileStorage::new(dir.path());
    store_data::execute(
        &store_data::StoreDataArgs { input_path: json!({"k": "v"}), storage: store_data::StorageKind::File, key: "entry".to_string() },
        &storage,
    )
    .unwrap();
    assert!(dir.path().join("file").join("entry.json").exists());
}
