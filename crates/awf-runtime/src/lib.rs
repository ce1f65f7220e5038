// SPDX-License-Identifier: MIT OR Apache-2.0
//! The top-level Executor: parses, validates, and runs a workflow
//! submission end to end, wiring together every other `awf-*` crate
//! (`spec.md` §4.4).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod executor;
mod limits;
mod response;

pub use cancel::CancellationToken;
pub use executor::Executor;
pub use limits::ResourceTracker;
pub use response::{ExecutionResponse, OperationSummary, RunOutcome, DEFAULT_ARRAY_TRUNCATION_LEN, DEFAULT_STRING_TRUNCATION_BYTES};
