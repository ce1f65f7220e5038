// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in operation catalog: the fixed set of workflow operation kinds,
//! their metadata, and (for the kinds with self-contained execution) their
//! implementations (`spec.md` §4.2).
//!
//! `Conditional` and `Loop` have no `execute` function here: both recurse
//! into the Executor's own loop over nested operation IDs, so their control
//! flow lives in `awf-runtime` and this crate only exposes their argument
//! schemas (see [`kinds::conditional`], [`kinds::loop_op`]).

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod entry;
pub mod kinds;
pub mod storage;

pub use entry::{all_kinds, lookup, CatalogEntry, OutputType, BUILTIN_ENTRIES};
pub use storage::{FileStorage, InMemoryStorage, Storage};

/// Top-level argument keys that the Executor's generic path-resolution pass
/// must leave untouched for `kind`, because they are write targets or
/// require tolerant (non-failing) reads rather than eager substitution.
///
/// `outputPath` names a location to write, not read; resolving it
/// generically would misinterpret any valid-looking path string as
/// something to read back before it has been written. `Conditional`'s
/// `condition` is preserved wholesale because its `exists`/`empty`
/// operators must tolerate a missing path, which a failing generic
/// resolution would preclude.
#[must_use]
pub fn preserved_argument_keys(kind: &str) -> &'static [&'static str] {
    match kind {
        "Conditional" => &["condition"],
        "ApiCall" | "FilterData" | "TransformData" | "MergeData" | "Loop" => &["outputPath"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_preserves_condition() {
        assert_eq!(preserved_argument_keys("Conditional"), &["condition"]);
    }

    #[test]
    fn api_call_preserves_output_path() {
        assert_eq!(preserved_argument_keys("ApiCall"), &["outputPath"]);
    }

    #[test]
    fn wait_preserves_nothing() {
        assert!(preserved_argument_keys("Wait").is_empty());
    }

    #[test]
    fn unknown_kind_preserves_nothing() {
        assert!(preserved_argument_keys("NotAKind").is_empty());
    }
}
