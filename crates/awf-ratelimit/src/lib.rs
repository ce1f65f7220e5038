// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sliding-window rate limiter (`spec.md` §4.5).
//!
//! Per-agent counters at minute/hour/day granularity, with optional
//! per-operation-kind sub-limits layered on top. Stale timestamp entries
//! are evicted lazily on each request, the same technique a teammate
//! pipeline stage uses for its single-window per-minute limiter.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use awf_error::{ErrorCode, WorkflowError};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// The three sliding-window granularities `spec.md` §4.5 requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum requests in the trailing 60 seconds. `None` is unlimited.
    pub per_minute: Option<u32>,
    /// Maximum requests in the trailing hour.
    pub per_hour: Option<u32>,
    /// Maximum requests in the trailing day.
    pub per_day: Option<u32>,
}

impl Limits {
    /// No limit at any granularity.
    #[must_use]
    pub fn unlimited() -> Self {
        Self { per_minute: None, per_hour: None, per_day: None }
    }

    fn windows(&self) -> Vec<(Duration, u32)> {
        let mut windows = Vec::with_capacity(3);
        if let Some(n) = self.per_minute {
            windows.push((Duration::from_secs(60), n));
        }
        if let Some(n) = self.per_hour {
            windows.push((Duration::from_secs(3_600), n));
        }
        if let Some(n) = self.per_day {
            windows.push((Duration::from_secs(86_400), n));
        }
        windows
    }
}

/// Per-agent rate-limit configuration: default limits plus per-kind
/// sub-limits (`spec.md` §4.5).
#[derive(Debug, Clone)]
pub struct AgentLimits {
    /// Limits applied across all operation kinds combined.
    pub default: Limits,
    /// Limits applied additionally, per operation kind.
    pub per_kind: HashMap<String, Limits>,
    /// Fixed delay inserted after every granted request (the "throttle
    /// hook"). `None` disables it.
    pub throttle_delay: Option<Duration>,
}

impl AgentLimits {
    /// No limits, no throttle delay.
    #[must_use]
    pub fn unlimited() -> Self {
        Self { default: Limits::unlimited(), per_kind: HashMap::new(), throttle_delay: None }
    }
}

impl Default for AgentLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

#[derive(Default)]
struct Buckets {
    agent: HashMap<String, Vec<Instant>>,
    agent_kind: HashMap<(String, String), Vec<Instant>>,
}

/// Sliding-window, per-agent/per-kind rate limiter.
pub struct RateLimiter {
    defaults: AgentLimits,
    overrides: HashMap<String, AgentLimits>,
    buckets: Mutex<Buckets>,
}

impl RateLimiter {
    /// Build a limiter with process-wide default limits; per-agent
    /// overrides replace the default wholesale (`spec.md` §4.5).
    #[must_use]
    pub fn new(defaults: AgentLimits) -> Self {
        Self { defaults, overrides: HashMap::new(), buckets: Mutex::new(Buckets::default()) }
    }

    /// Register `limits` as the override for `agent_id`, replacing the
    /// process-wide defaults for that agent.
    pub fn set_override(&mut self, agent_id: impl Into<String>, limits: AgentLimits) {
        self.overrides.insert(agent_id.into(), limits);
    }

    fn limits_for(&self, agent_id: &str) -> &AgentLimits {
        self.overrides.get(agent_id).unwrap_or(&self.defaults)
    }

    /// Request an execution slot for `(agent_id, kind)`. Denies with
    /// `ErrorCode::RateLimit` and a `retryAfterMs` context entry if either
    /// the agent-wide or the kind-specific window is exhausted; otherwise
    /// records the request and, if configured, applies the throttle delay.
    pub async fn acquire(&self, agent_id: &str, kind: &str) -> Result<(), WorkflowError> {
        let limits = self.limits_for(agent_id);
        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        let agent_ts = buckets.agent.entry(agent_id.to_string()).or_default();
        if let Some(wait) = check_and_record(agent_ts, now, &limits.default.windows()) {
            return Err(denial(wait));
        }

        if let Some(kind_limits) = limits.per_kind.get(kind) {
            let key = (agent_id.to_string(), kind.to_string());
            let kind_ts = buckets.agent_kind.entry(key).or_default();
            if let Some(wait) = check_and_record(kind_ts, now, &kind_limits.windows()) {
                // Roll back the agent-wide timestamp just recorded, since
                // this request is ultimately denied.
                agent_ts.pop();
                return Err(denial(wait));
            }
        }

        let throttle_delay = limits.throttle_delay;
        drop(buckets);
        if let Some(delay) = throttle_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn denial(wait: Duration) -> WorkflowError {
    WorkflowError::new(ErrorCode::RateLimit, "rate limit exceeded").with_context("retryAfterMs", wait.as_millis() as u64)
}

/// Evict timestamps older than the widest configured window, then check
/// every window from narrowest to widest. Returns the wait time until the
/// first violated window's earliest entry falls out of range, or records
/// `now` and returns `None` if every window is within its limit.
fn check_and_record(timestamps: &mut Vec<Instant>, now: Instant, windows: &[(Duration, u32)]) -> Option<Duration> {
    if let Some(max_window) = windows.iter().map(|(d, _)| *d).max() {
        timestamps.retain(|t| now.duration_since(*t) < max_window);
    }

    for (duration, limit) in windows {
        let within: Vec<Instant> = timestamps.iter().copied().filter(|t| now.duration_since(*t) < *duration).collect();
        if within.len() as u32 >= *limit {
            let earliest = within.into_iter().min().expect("non-empty: len >= limit >= 1 implies at least one entry");
            return Some(*duration - now.duration_since(earliest));
        }
    }

    timestamps.push(now);
    None
}
