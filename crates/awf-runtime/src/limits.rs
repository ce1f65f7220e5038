// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-execution resource caps (`spec.md` §5, `awf-config::LimitsConfig`).
//!
//! Unlike the backplane's token/cost/turn budget, this engine caps only
//! operation count, wall-clock duration, and `DataModel` size — the three
//! dimensions `spec.md` §6's `limits` configuration surface names.

use awf_config::LimitsConfig;
use awf_error::{ErrorCode, WorkflowError};
use std::time::Instant;

/// Tracks consumption of one execution's resource caps.
pub struct ResourceTracker {
    limits: LimitsConfig,
    started_at: Instant,
    operations_run: u32,
}

impl ResourceTracker {
    /// Start a tracker for `limits`, with the clock starting now.
    #[must_use]
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits, started_at: Instant::now(), operations_run: 0 }
    }

    /// Record that one more operation is about to run, failing with
    /// `ErrorCode::Resource` if this exceeds `maxOperationsPerWorkflow`.
    pub fn record_operation(&mut self) -> Result<(), WorkflowError> {
        self.operations_run += 1;
        if self.operations_run > self.limits.max_operations_per_workflow {
            return Err(WorkflowError::new(ErrorCode::Resource, "execution exceeded maxOperationsPerWorkflow")
                .with_context("limit", self.limits.max_operations_per_workflow)
                .with_context("attempted", self.operations_run));
        }
        Ok(())
    }

    /// Fail with `ErrorCode::Resource` if the execution has run longer than
    /// `maxWorkflowDurationMs`.
    pub fn check_duration(&self) -> Result<(), WorkflowError> {
        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        if elapsed_ms > self.limits.max_workflow_duration_ms {
            return Err(WorkflowError::new(ErrorCode::Resource, "execution exceeded maxWorkflowDurationMs")
                .with_context("limit_ms", self.limits.max_workflow_duration_ms)
                .with_context("elapsed_ms", elapsed_ms));
        }
        Ok(())
    }

    /// Fail with `ErrorCode::Resource` if `encoded_size` exceeds
    /// `maxDataModelBytes`.
    pub fn check_data_model_size(&self, encoded_size: usize) -> Result<(), WorkflowError> {
        if encoded_size as u64 > self.limits.max_data_model_bytes {
            return Err(WorkflowError::new(ErrorCode::Resource, "execution exceeded maxDataModelBytes")
                .with_context("limit_bytes", self.limits.max_data_model_bytes)
                .with_context("actual_bytes", encoded_size));
        }
        Ok(())
    }

    /// Milliseconds elapsed since this tracker was created.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        self.started_at.elapsed().as_millis() as i64
    }
}
