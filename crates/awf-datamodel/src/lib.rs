// SPDX-License-Identifier: MIT OR Apache-2.0
//! The `DataModel` tree and `PathResolver` (`spec.md` §4.1).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod model;
mod path;
mod resolver;

pub use model::DataModel;
pub use path::{is_path_literal, parse_path, Path, PathSegment};
pub use resolver::{collect_reference_paths, resolve_references, stringify};
