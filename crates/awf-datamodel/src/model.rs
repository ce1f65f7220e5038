// SPDX-License-Identifier: MIT OR Apache-2.0
//! The execution-local `DataModel` tree rooted at `/workflow`
//! (`spec.md` §3, §4.1).

use crate::path::{Path, PathSegment};
use awf_error::{ErrorCode, WorkflowError};
use serde_json::Value;

/// Hierarchical mutable tree addressed by `/workflow/...` paths.
///
/// Owned exclusively by a single `Executor` run; no synchronization is
/// provided or required (`spec.md` §5).
#[derive(Debug, Clone, Default)]
pub struct DataModel {
    root: Value,
}

impl DataModel {
    /// Create an empty data model.
    #[must_use]
    pub fn new() -> Self {
        Self { root: Value::Object(serde_json::Map::new()) }
    }

    /// Read the value at `path` by deep copy. Reading `/workflow` itself
    /// returns the whole tree.
    ///
    /// Fails with `DataNotFound` if any segment is missing, or an array
    /// index is out of bounds.
    pub fn read(&self, path: &Path) -> Result<Value, WorkflowError> {
        let mut current = &self.root;
        for seg in path.segments() {
            current = step(current, seg, path)?;
        }
        Ok(current.clone())
    }

    /// Write `value` at `path`, autovivifying intermediate `Field` segments
    /// as objects. `path` must have at least one segment (writing directly
    /// to `/workflow` is not supported — operations always declare a leaf
    /// `outputPath`).
    pub fn write(&mut self, path: &Path, value: Value) -> Result<(), WorkflowError> {
        if path.is_root() {
            return Err(WorkflowError::new(
                ErrorCode::StructureMalformed,
                "outputPath must name a leaf under /workflow, not /workflow itself",
            ));
        }
        let mut current = &mut self.root;
        let segments = path.segments();
        for seg in &segments[..segments.len() - 1] {
            current = step_mut_autoviv(current, seg)?;
        }
        match segments.last().expect("checked non-empty") {
            PathSegment::Field(name) => {
                let obj = current.as_object_mut().ok_or_else(|| type_mismatch(path))?;
                obj.insert(name.clone(), value);
            }
            PathSegment::Index(idx) => {
                let arr = current.as_array_mut().ok_or_else(|| type_mismatch(path))?;
                if *idx >= arr.len() {
                    arr.resize(*idx + 1, Value::Null);
                }
                arr[*idx] = value;
            }
        }
        Ok(())
    }

    /// Whether a value is present at `path` (without erroring on absence).
    #[must_use]
    pub fn exists(&self, path: &Path) -> bool {
        self.read(path).is_ok()
    }

    /// Size of the model's canonical JSON encoding, in bytes. Used to
    /// enforce `limits.maxDataModelBytes` (`spec.md` §5).
    #[must_use]
    pub fn encoded_size(&self) -> usize {
        serde_json::to_vec(&self.root).map(|v| v.len()).unwrap_or(usize::MAX)
    }

    /// Borrow the whole tree as a JSON value (for response projection).
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

fn step<'a>(current: &'a Value, seg: &PathSegment, full: &Path) -> Result<&'a Value, WorkflowError> {
    match seg {
        PathSegment::Field(name) => current.as_object().and_then(|o| o.get(name)).ok_or_else(|| not_found(full)),
        PathSegment::Index(idx) => current
            .as_array()
            .and_then(|a| a.get(*idx))
            .ok_or_else(|| not_found(full)),
    }
}

fn step_mut_autoviv<'a>(current: &'a mut Value, seg: &PathSegment) -> Result<&'a mut Value, WorkflowError> {
    match seg {
        PathSegment::Field(name) => {
            if !current.is_object() {
                *current = Value::Object(serde_json::Map::new());
            }
            let obj = current.as_object_mut().expect("just ensured object");
            Ok(obj.entry(name.clone()).or_insert_with(|| Value::Object(serde_json::Map::new())))
        }
        PathSegment::Index(idx) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let arr = current.as_array_mut().expect("just ensured array");
            if *idx >= arr.len() {
                arr.resize(*idx + 1, Value::Null);
            }
            Ok(&mut arr[*idx])
        }
    }
}

fn not_found(path: &Path) -> WorkflowError {
    WorkflowError::new(ErrorCode::DataNotFound, format!("no value at path {path}")).with_context("path", path.to_string())
}

fn type_mismatch(path: &Path) -> WorkflowError {
    WorkflowError::new(ErrorCode::DataTypeMismatch, format!("path {path} does not address a writable container"))
        .with_context("path", path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse_path;

    #[test]
    fn write_then_read_roundtrip() {
        let mut model = DataModel::new();
        let path = parse_path("/workflow/users").unwrap();
        model.write(&path, serde_json::json!([{"id": 1}])).unwrap();
        assert_eq!(model.read(&path).unwrap(), serde_json::json!([{"id": 1}]));
    }

    #[test]
    fn autovivifies_intermediate_objects() {
        let mut model = DataModel::new();
        let path = parse_path("/workflow/a/b/c").unwrap();
        model.write(&path, serde_json::json!(42)).unwrap();
        assert_eq!(model.read(&path).unwrap(), serde_json::json!(42));
        assert_eq!(
            model.read(&parse_path("/workflow/a/b").unwrap()).unwrap(),
            serde_json::json!({"c": 42})
        );
    }

    #[test]
    fn read_missing_path_is_data_error() {
        let model = DataModel::new();
        let path = parse_path("/workflow/missing").unwrap();
        let err = model.read(&path).unwrap_err();
        assert_eq!(err.code, awf_error::ErrorCode::DataNotFound);
    }

    #[test]
    fn read_out_of_bounds_index_is_data_error() {
        let mut model = DataModel::new();
        model
            .write(&parse_path("/workflow/items").unwrap(), serde_json::json!([1, 2]))
            .unwrap();
        let err = model.read(&parse_path("/workflow/items[5]").unwrap()).unwrap_err();
        assert_eq!(err.code, awf_error::ErrorCode::DataNotFound);
    }

    #[test]
    fn write_replaces_existing_leaf() {
        let mut model = DataModel::new();
        let path = parse_path("/workflow/x").unwrap();
        model.write(&path, serde_json::json!(1)).unwrap();
        model.write(&path, serde_json::json!(2)).unwrap();
        assert_eq!(model.read(&path).unwrap(), serde_json::json!(2));
    }

    #[test]
    fn read_root_returns_whole_tree() {
        let mut model = DataModel::new();
        model.write(&parse_path("/workflow/x").unwrap(), serde_json::json!(1)).unwrap();
        let root = parse_path("/workflow").unwrap();
        assert_eq!(model.read(&root).unwrap(), serde_json::json!({"x": 1}));
    }

    #[test]
    fn write_to_root_is_rejected() {
        let mut model = DataModel::new();
        let root = parse_path("/workflow").unwrap();
        assert!(model.write(&root, serde_json::json!(1)).is_err());
    }

    #[test]
    fn deep_copy_on_read_does_not_alias() {
        let mut model = DataModel::new();
        let path = parse_path("/workflow/arr").unwrap();
        model.write(&path, serde_json::json!([1, 2, 3])).unwrap();
        let mut copy = model.read(&path).unwrap();
        if let Value::Array(ref mut items) = copy {
            items.push(serde_json::json!(4));
        }
        assert_eq!(model.read(&path).unwrap(), serde_json::json!([1, 2, 3]));
    }
}
