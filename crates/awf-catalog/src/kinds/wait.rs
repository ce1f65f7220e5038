// SPDX-License-Identifier: MIT OR Apache-2.0
//! `Wait` (`spec.md` §4.2, §5).

use awf_error::{ErrorCode, WorkflowError};
use serde::Deserialize;
use std::time::Duration;

/// Maximum permitted `duration`, in milliseconds.
pub const MAX_DURATION_MS: u64 = 600_000;

/// Concrete arguments for `Wait`.
#[derive(Debug, Clone, Deserialize)]
pub struct WaitArgs {
    /// Suspension duration in milliseconds, `0..=600000`.
    pub duration: u64,
}

impl WaitArgs {
    /// Validate `duration` is within the permitted range.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.duration > MAX_DURATION_MS {
            return Err(WorkflowError::new(
                ErrorCode::ValidationStructure,
                format!("Wait.duration {} exceeds maximum of {MAX_DURATION_MS}ms", self.duration),
            ));
        }
        Ok(())
    }
}

/// Suspend for `args.duration`. `Wait(0)` returns immediately without
/// suspending observably. Callers needing cancellation must race this
/// future against a cancellation signal themselves.
pub async fn execute(args: &WaitArgs) -> Result<serde_json::Value, WorkflowError> {
    args.validate()?;
    if args.duration > 0 {
        tokio::time::sleep(Duration::from_millis(args.duration)).await;
    }
    Ok(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_zero_returns_immediately() {
        let args = WaitArgs { duration: 0 };
        let start = tokio::time::Instant::now();
        execute(&args).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn duration_over_max_is_rejected() {
        let args = WaitArgs { duration: MAX_DURATION_MS + 1 };
        assert!(args.validate().is_err());
    }

    #[test]
    fn duration_at_max_is_allowed() {
        let args = WaitArgs { duration: MAX_DURATION_MS };
        assert!(args.validate().is_ok());
    }
}
