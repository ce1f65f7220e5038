// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for the workflow engine.
//!
//! This crate provides [`RuntimeConfig`] — the top-level runtime settings —
//! together with helpers for loading from TOML files, merging overlays, and
//! producing advisory [`ConfigWarning`]s.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A deprecated field was used in the configuration.
    DeprecatedField {
        /// Name of the deprecated field.
        field: String,
        /// Suggested replacement, if any.
        suggestion: Option<String>,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// A workflow duration ceiling is unusually large.
    LargeTimeout {
        /// The field carrying the large value.
        field: String,
        /// The value itself, in milliseconds.
        millis: u64,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DeprecatedField { field, suggestion } => {
                write!(f, "deprecated field '{field}'")?;
                if let Some(s) = suggestion {
                    write!(f, " — use '{s}' instead")?;
                }
                Ok(())
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::LargeTimeout { field, millis } => {
                write!(f, "'{field}' is unusually large ({millis}ms)")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level runtime configuration (`spec.md` §6).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RuntimeConfig {
    /// Sliding-window rate limits.
    #[serde(default)]
    pub rate_limits: RateLimitsConfig,
    /// Backoff policy for retryable operation failures.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Result cache sizing and TTLs.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Per-workflow resource ceilings.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Reserved: when `true`, a failing operation would not abort the
    /// remaining workflow. Parsed and carried on the execution record but
    /// not yet consulted by the executor — see `DESIGN.md`.
    #[serde(default)]
    pub continue_on_error: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rate_limits: RateLimitsConfig::default(),
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            limits: LimitsConfig::default(),
            continue_on_error: false,
        }
    }
}

/// Agent-wide and per-kind sliding-window rate limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RateLimitsConfig {
    /// Default per-agent requests/minute across all operation kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    /// Default per-agent requests/hour across all operation kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,
    /// Default per-agent requests/day across all operation kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
    /// `ApiCall`-specific sub-limit, requests/minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_per_minute: Option<u32>,
    /// `ApiCall`-specific sub-limit, requests/hour.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_per_hour: Option<u32>,
    /// Per-agent overrides of the defaults above, keyed by agent ID.
    #[serde(default)]
    pub per_agent: BTreeMap<String, AgentRateLimitOverride>,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: Some(60),
            requests_per_hour: Some(1_000),
            requests_per_day: Some(10_000),
            api_calls_per_minute: Some(30),
            api_calls_per_hour: Some(500),
            per_agent: BTreeMap::new(),
        }
    }
}

/// A single agent's override of the default rate limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct AgentRateLimitOverride {
    /// Override for `requestsPerMinute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
    /// Override for `requestsPerHour`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_hour: Option<u32>,
    /// Override for `requestsPerDay`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_day: Option<u32>,
    /// Override for `apiCallsPerMinute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_per_minute: Option<u32>,
    /// Override for `apiCallsPerHour`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_calls_per_hour: Option<u32>,
}

/// Exponential backoff policy for retryable operation failures.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RetryConfig {
    /// Maximum retry attempts after the initial one.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Ceiling applied to the computed backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Exponential base.
    #[serde(default = "default_backoff_base")]
    pub backoff_base: f64,
    /// Whether to apply full jitter to the computed delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_retries() -> u32 {
    3
}
fn default_initial_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    10_000
}
fn default_backoff_base() -> f64 {
    2.0
}
fn default_jitter() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_base: default_backoff_base(),
            jitter: default_jitter(),
        }
    }
}

/// Result cache sizing and per-kind TTLs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether the result cache is active at all.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Default entry TTL in seconds, applied when a kind has no override.
    #[serde(default = "default_ttl_sec")]
    pub default_ttl_sec: u64,
    /// Maximum number of entries retained (LRU eviction beyond this).
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Per-kind TTL overrides, in seconds. A value of `0` disables caching
    /// for that kind regardless of its catalog `cacheable` flag.
    #[serde(default)]
    pub per_kind_ttl_sec: BTreeMap<String, u64>,
}

fn default_cache_enabled() -> bool {
    true
}
fn default_ttl_sec() -> u64 {
    300
}
fn default_max_size() -> usize {
    1_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            default_ttl_sec: default_ttl_sec(),
            max_size: default_max_size(),
            per_kind_ttl_sec: BTreeMap::new(),
        }
    }
}

/// Per-workflow resource ceilings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum number of operations a single workflow may declare.
    #[serde(default = "default_max_operations")]
    pub max_operations_per_workflow: u32,
    /// Maximum wall-clock duration for a single execution, in milliseconds.
    #[serde(default = "default_max_duration_ms")]
    pub max_workflow_duration_ms: u64,
    /// Maximum serialized size of the data model, in bytes.
    #[serde(default = "default_max_data_model_bytes")]
    pub max_data_model_bytes: u64,
}

fn default_max_operations() -> u32 {
    200
}
fn default_max_duration_ms() -> u64 {
    300_000
}
fn default_max_data_model_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_operations_per_workflow: default_max_operations(),
            max_workflow_duration_ms: default_max_duration_ms(),
            max_data_model_bytes: default_max_data_model_bytes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const LARGE_DURATION_THRESHOLD_MS: u64 = 3_600_000;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`RuntimeConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`RuntimeConfig::default`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => RuntimeConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`RuntimeConfig`].
pub fn parse_toml(content: &str) -> Result<RuntimeConfig, ConfigError> {
    toml::from_str::<RuntimeConfig>(content).map_err(|e| ConfigError::ParseError { reason: e.to_string() })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `AWF_CONTINUE_ON_ERROR`
/// - `AWF_CACHE_ENABLED`
pub fn apply_env_overrides(config: &mut RuntimeConfig) {
    if let Ok(val) = std::env::var("AWF_CONTINUE_ON_ERROR") {
        config.continue_on_error = val == "1" || val.eq_ignore_ascii_case("true");
    }
    if let Ok(val) = std::env::var("AWF_CACHE_ENABLED") {
        config.cache.enabled = val == "1" || val.eq_ignore_ascii_case("true");
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (zero-valued limits, an out-of-range `backoffBase`) are
/// returned as a [`ConfigError::ValidationError`]; soft issues come back as
/// warnings.
pub fn validate_config(config: &RuntimeConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if config.retry.backoff_base < 1.0 {
        errors.push(format!("retry.backoffBase {} must be >= 1.0", config.retry.backoff_base));
    }
    if config.retry.max_delay_ms < config.retry.initial_delay_ms {
        errors.push("retry.maxDelayMs must be >= retry.initialDelayMs".into());
    }
    if config.limits.max_operations_per_workflow == 0 {
        errors.push("limits.maxOperationsPerWorkflow must be > 0".into());
    }
    if config.cache.enabled && config.cache.max_size == 0 {
        errors.push("cache.maxSize must be > 0 when cache.enabled is true".into());
    }

    for (agent, over) in &config.rate_limits.per_agent {
        if agent.is_empty() {
            errors.push("rateLimits.perAgent key must not be empty".into());
        }
        if over == &AgentRateLimitOverride::default() {
            warnings.push(ConfigWarning::MissingOptionalField {
                field: format!("rateLimits.perAgent.{agent}"),
                hint: "override has no fields set and has no effect".into(),
            });
        }
    }

    if config.limits.max_workflow_duration_ms > LARGE_DURATION_THRESHOLD_MS {
        warnings.push(ConfigWarning::LargeTimeout {
            field: "limits.maxWorkflowDurationMs".into(),
            millis: config.limits.max_workflow_duration_ms,
        });
    }

    if !config.cache.enabled {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "cache.enabled".into(),
            hint: "caching disabled; cacheable operations will re-run every time".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations. Scalar values in `overlay` take precedence over
/// `base`; the `perAgent` and `perKindTtlSec` maps are combined, with
/// overlay entries winning on key collision.
#[must_use]
pub fn merge_configs(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
    let mut per_agent = base.rate_limits.per_agent;
    per_agent.extend(overlay.rate_limits.per_agent);

    let mut per_kind_ttl_sec = base.cache.per_kind_ttl_sec;
    per_kind_ttl_sec.extend(overlay.cache.per_kind_ttl_sec);

    RuntimeConfig {
        rate_limits: RateLimitsConfig { per_agent, ..overlay.rate_limits },
        retry: overlay.retry,
        cache: CacheConfig { per_kind_ttl_sec, ..overlay.cache },
        limits: overlay.limits,
        continue_on_error: overlay.continue_on_error,
    }
}
