// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog metadata: the fixed set of operation kinds, their cacheability,
//! and their declared output type (`spec.md` §4.2, §4.3 point 4).

/// Static output-type classification used by the validator's type check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// Output is always a JSON array.
    Array,
    /// Output is always a JSON object.
    Object,
    /// Output is a scalar (string/number/bool) or a mix that is not
    /// guaranteed array-shaped.
    Scalar,
    /// The kind produces no addressable output (control-flow gate).
    None,
}

/// Metadata the validator and executor consult for a single catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Catalog entry name, matching the wire `kind`.
    pub kind: &'static str,
    /// Whether results of this kind may be served from the `ResultCache`.
    pub cacheable: bool,
    /// Whether this kind ever classifies one of its own failures as
    /// retryable (`spec.md` §4.4 step 6: "currently only `ApiCall`").
    pub retryable: bool,
    /// Declared output shape, used by the validator's type check.
    pub output_type: OutputType,
}

/// All eight built-in kinds (`spec.md` §4.2).
pub const BUILTIN_ENTRIES: &[CatalogEntry] = &[
    CatalogEntry { kind: "ApiCall", cacheable: true, retryable: true, output_type: OutputType::Object },
    CatalogEntry { kind: "FilterData", cacheable: true, retryable: false, output_type: OutputType::Array },
    CatalogEntry { kind: "TransformData", cacheable: true, retryable: false, output_type: OutputType::Scalar },
    CatalogEntry { kind: "Conditional", cacheable: false, retryable: false, output_type: OutputType::None },
    CatalogEntry { kind: "Loop", cacheable: false, retryable: false, output_type: OutputType::Array },
    CatalogEntry { kind: "StoreData", cacheable: false, retryable: false, output_type: OutputType::None },
    CatalogEntry { kind: "Wait", cacheable: false, retryable: false, output_type: OutputType::None },
    CatalogEntry { kind: "MergeData", cacheable: true, retryable: false, output_type: OutputType::Array },
];

/// Look up the metadata for `kind`, if it names a built-in entry.
#[must_use]
pub fn lookup(kind: &str) -> Option<&'static CatalogEntry> {
    BUILTIN_ENTRIES.iter().find(|e| e.kind == kind)
}

/// All built-in kind names.
#[must_use]
pub fn all_kinds() -> Vec<&'static str> {
    BUILTIN_ENTRIES.iter().map(|e| e.kind).collect()
}
