// SPDX-License-Identifier: MIT OR Apache-2.0
//! Detection of the structural credential-reference marker
//! `{credentialRef: {id: string}}` (`spec.md` §3) inside argument trees.

use serde_json::Value;

/// A detected `{credentialRef:{id}}` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRef {
    /// The referenced credential ID.
    pub id: String,
}

/// If `value` is exactly the structural marker `{"credentialRef": {"id": "..."}}`,
/// return the referenced ID.
#[must_use]
pub fn as_credential_ref(value: &Value) -> Option<CredentialRef> {
    let obj = value.as_object()?;
    if obj.len() != 1 {
        return None;
    }
    let inner = obj.get("credentialRef")?.as_object()?;
    let id = inner.get("id")?.as_str()?;
    Some(CredentialRef { id: id.to_string() })
}

/// Recursively scan `value` for every credential reference it contains,
/// depth-first, left-to-right. Used by the permission validator (every
/// referenced ID must be allow-listed) and by audit sanitisation.
pub fn collect_credential_refs(value: &Value, out: &mut Vec<CredentialRef>) {
    if let Some(cred_ref) = as_credential_ref(value) {
        out.push(cred_ref);
        return;
    }
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_credential_refs(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_credential_refs(v, out);
            }
        }
        _ => {}
    }
}
