// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for the workflow engine.
//!
//! Every engine error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use the builder returned by
//! [`WorkflowError::new`] to construct errors fluently. This crate mirrors
//! the wire-level `Error` shape of the execution response (`type`,
//! `category`, `message`, `context`, `recoverable`, `suggestions`).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed JSONL input, rejected before validation runs.
    Structure,
    /// Schema, permission, dependency, or type problems found by the validator.
    Validation,
    /// Agent lacks permission for a specific operation/API/credential.
    Authorization,
    /// Path-not-found or wrong-shape errors from the data model.
    Data,
    /// Connection/DNS failures or non-2xx API responses.
    Network,
    /// Per-agent or per-kind rate limit exceeded.
    RateLimit,
    /// A configured execution cap (operations, duration, data size) was exceeded.
    Resource,
    /// The caller cancelled the execution.
    Cancellation,
    /// Catch-all for unexpected internal faults.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Structure => "structure",
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Data => "data",
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::Resource => "resource",
            Self::Cancellation => "cancellation",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Structure --
    /// A JSONL line failed to parse or a message did not match its schema.
    StructureMalformed,
    /// `BeginExecution` was missing, duplicated, or not the last message.
    StructureFraming,

    // -- Validation --
    /// Structural validation failed (IDs, schema, `order` references).
    ValidationStructure,
    /// Permission validation failed (kind/API/credential allow-lists).
    ValidationPermission,
    /// Dependency DAG validation failed (forward reference or cycle).
    ValidationDependency,
    /// Type validation failed (array-typed input expected, condition path unreadable).
    ValidationType,

    // -- Authorization --
    /// The agent is not permitted to use this operation kind, API host, or credential.
    AuthorizationDenied,

    // -- Data --
    /// A referenced path does not exist in the data model.
    DataNotFound,
    /// A value at a referenced path has the wrong JSON shape for the operation.
    DataTypeMismatch,

    // -- Network / API --
    /// Connection or DNS failure while executing an `ApiCall`.
    Network,
    /// An `ApiCall` exceeded its `timeoutMs` budget.
    Timeout,
    /// An `ApiCall` received a non-2xx response.
    Api,

    // -- Rate limiting --
    /// The agent exceeded a configured rate limit.
    RateLimit,

    // -- Resource --
    /// A configured execution cap was exceeded.
    Resource,

    // -- Cancellation --
    /// The caller cancelled the execution.
    Cancellation,

    // -- Internal --
    /// Catch-all for unexpected internal faults.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StructureMalformed | Self::StructureFraming => ErrorCategory::Structure,

            Self::ValidationStructure
            | Self::ValidationPermission
            | Self::ValidationDependency
            | Self::ValidationType => ErrorCategory::Validation,

            Self::AuthorizationDenied => ErrorCategory::Authorization,

            Self::DataNotFound | Self::DataTypeMismatch => ErrorCategory::Data,

            Self::Network | Self::Timeout | Self::Api => ErrorCategory::Network,

            Self::RateLimit => ErrorCategory::RateLimit,

            Self::Resource => ErrorCategory::Resource,

            Self::Cancellation => ErrorCategory::Cancellation,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"DATA_NOT_FOUND"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructureMalformed => "STRUCTURE_MALFORMED",
            Self::StructureFraming => "STRUCTURE_FRAMING",
            Self::ValidationStructure => "VALIDATION_STRUCTURE",
            Self::ValidationPermission => "VALIDATION_PERMISSION",
            Self::ValidationDependency => "VALIDATION_DEPENDENCY",
            Self::ValidationType => "VALIDATION_TYPE",
            Self::AuthorizationDenied => "AUTHORIZATION_DENIED",
            Self::DataNotFound => "DATA_NOT_FOUND",
            Self::DataTypeMismatch => "DATA_TYPE_MISMATCH",
            Self::Network => "NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Api => "API",
            Self::RateLimit => "RATE_LIMIT",
            Self::Resource => "RESOURCE",
            Self::Cancellation => "CANCELLATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether the RetryPolicy (see `awf-retry`) may retry errors of this
    /// code in principle. This is the *classification input*, not a
    /// decision — `awf-retry` also inspects context (e.g. HTTP status) for
    /// `Api`.
    #[must_use]
    pub fn is_retry_eligible(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Api)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

/// Unified engine error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use awf_error::{WorkflowError, ErrorCode};
///
/// let err = WorkflowError::new(ErrorCode::Timeout, "timed out after 30 s")
///     .with_context("operation_id", "fetch_users")
///     .with_context("timeout_ms", 30_000);
/// ```
pub struct WorkflowError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics. Never contains secrets
    /// or credential values — see `with_context`.
    pub context: BTreeMap<String, serde_json::Value>,
    /// Operation this error is attributed to, if any.
    pub operation_id: Option<String>,
    /// Machine-readable suggestions for the caller.
    pub suggestions: Vec<String>,
}

impl WorkflowError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
            operation_id: None,
            suggestions: Vec::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is silently skipped. Callers must never pass
    /// credential plaintext or raw `Authorization`-style header values here
    /// — see `spec.md` §7's sanitization requirement.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Attribute this error to a specific operation ID.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Attach a machine-readable suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether this error is recoverable by retrying the same workflow
    /// later. `RateLimitError` is recoverable (retry after `retry_after_ms`)
    /// even though the retry layer itself never retries it automatically.
    #[must_use]
    pub fn recoverable(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::Network
                | ErrorCode::Timeout
                | ErrorCode::Api
                | ErrorCode::RateLimit
                | ErrorCode::Resource
        )
    }

    /// Project into the wire-level [`ErrorRecord`] shape (`spec.md` §6).
    #[must_use]
    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            r#type: self.code.as_str().to_string(),
            category: self.category().to_string(),
            message: self.message.clone(),
            operation_id: self.operation_id.clone(),
            recoverable: self.recoverable(),
            context: self.context.clone(),
            suggestions: self.suggestions.clone(),
        }
    }
}

impl fmt::Debug for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("WorkflowError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref op) = self.operation_id {
            d.field("operation_id", op);
        }
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for WorkflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Wire-level projection
// ---------------------------------------------------------------------------

/// Wire-level error shape returned in an execution response (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    /// Machine-readable error code (e.g. `"DATA_NOT_FOUND"`).
    pub r#type: String,
    /// Broad category (e.g. `"data"`).
    pub category: String,
    /// Human-readable message.
    pub message: String,
    /// Operation this error is attributed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Whether retrying the workflow later could succeed.
    pub recoverable: bool,
    /// Sanitized structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// Machine-readable suggestions for the caller.
    pub suggestions: Vec<String>,
}

/// Replace the value of a context entry whose key looks like an
/// authorization header (`"authorization"`, `"Authorization"`, ...) with a
/// fixed placeholder, per `spec.md` §4.8 and §7's "never written" rule for
/// credential material.
#[must_use]
pub fn sanitize_context(
    mut context: BTreeMap<String, serde_json::Value>,
) -> BTreeMap<String, serde_json::Value> {
    const PLACEHOLDER: &str = "***redacted***";
    for (key, value) in context.iter_mut() {
        if key.eq_ignore_ascii_case("authorization") || key.eq_ignore_ascii_case("credential") {
            *value = serde_json::Value::String(PLACEHOLDER.to_string());
        }
    }
    context
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;

    const ALL_CODES: &[ErrorCode] = &[
        ErrorCode::StructureMalformed,
        ErrorCode::StructureFraming,
        ErrorCode::ValidationStructure,
        ErrorCode::ValidationPermission,
        ErrorCode::ValidationDependency,
        ErrorCode::ValidationType,
        ErrorCode::AuthorizationDenied,
        ErrorCode::DataNotFound,
        ErrorCode::DataTypeMismatch,
        ErrorCode::Network,
        ErrorCode::Timeout,
        ErrorCode::Api,
        ErrorCode::RateLimit,
        ErrorCode::Resource,
        ErrorCode::Cancellation,
        ErrorCode::Internal,
    ];

    #[test]
    fn basic_construction() {
        let err = WorkflowError::new(ErrorCode::Internal, "boom");
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(err.message, "boom");
        assert!(err.source.is_none());
        assert!(err.context.is_empty());
    }

    #[test]
    fn display_without_context() {
        let err = WorkflowError::new(ErrorCode::DataNotFound, "no such path");
        assert_eq!(err.to_string(), "[DATA_NOT_FOUND] no such path");
    }

    #[test]
    fn display_with_context() {
        let err = WorkflowError::new(ErrorCode::Timeout, "timed out").with_context("timeout_ms", 5000);
        let s = err.to_string();
        assert!(s.starts_with("[TIMEOUT] timed out"));
        assert!(s.contains("timeout_ms"));
    }

    #[test]
    fn debug_with_source() {
        let src = io::Error::new(io::ErrorKind::NotFound, "file missing");
        let err = WorkflowError::new(ErrorCode::Resource, "cap hit").with_source(src);
        let dbg = format!("{err:?}");
        assert!(dbg.contains("source"));
        assert!(dbg.contains("file missing"));
    }

    #[test]
    fn all_codes_categorised_consistently() {
        for code in ALL_CODES {
            // Just exercise the mapping; no panics, stable categories.
            let cat1 = code.category();
            let cat2 = code.category();
            assert_eq!(cat1, cat2);
        }
    }

    #[test]
    fn rate_limit_never_retry_eligible() {
        assert!(!ErrorCode::RateLimit.is_retry_eligible());
        assert!(!ErrorCode::ValidationDependency.is_retry_eligible());
        assert!(ErrorCode::Network.is_retry_eligible());
        assert!(ErrorCode::Timeout.is_retry_eligible());
        assert!(ErrorCode::Api.is_retry_eligible());
    }

    #[test]
    fn recoverable_flags() {
        assert!(WorkflowError::new(ErrorCode::RateLimit, "x").recoverable());
        assert!(!WorkflowError::new(ErrorCode::ValidationStructure, "x").recoverable());
        assert!(!WorkflowError::new(ErrorCode::Cancellation, "x").recoverable());
    }

    #[test]
    fn to_record_projection() {
        let err = WorkflowError::new(ErrorCode::DataNotFound, "missing")
            .with_operation_id("op1")
            .with_suggestion("check the outputPath spelling");
        let record = err.to_record();
        assert_eq!(record.r#type, "DATA_NOT_FOUND");
        assert_eq!(record.category, "data");
        assert_eq!(record.operation_id.as_deref(), Some("op1"));
        assert_eq!(record.suggestions.len(), 1);
        assert!(!record.recoverable);
    }

    #[test]
    fn sanitize_redacts_authorization_like_keys() {
        let mut ctx = BTreeMap::new();
        ctx.insert(
            "Authorization".to_string(),
            serde_json::json!("Bearer super-secret"),
        );
        ctx.insert("status".to_string(), serde_json::json!(429));
        let clean = sanitize_context(ctx);
        assert_eq!(clean["Authorization"], serde_json::json!("***redacted***"));
        assert_eq!(clean["status"], serde_json::json!(429));
    }

    #[test]
    fn all_codes_have_unique_as_str() {
        let mut seen = HashSet::new();
        for code in ALL_CODES {
            assert!(seen.insert(code.as_str()), "duplicate as_str: {code:?}");
        }
        assert_eq!(seen.len(), ALL_CODES.len());
    }

    #[test]
    fn error_code_serde_roundtrip() {
        let json = serde_json::to_string(&ErrorCode::DataNotFound).unwrap();
        assert_eq!(json, r#""DATA_NOT_FOUND""#);
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::DataNotFound);
    }

    #[test]
    fn error_record_serde_roundtrip() {
        let err = WorkflowError::new(ErrorCode::Api, "bad gateway").with_context("status", 502);
        let record = err.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ErrorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn std_error_source_chain() {
        let inner = io::Error::new(io::ErrorKind::NotFound, "not found");
        let err = WorkflowError::new(ErrorCode::Internal, "wrap").with_source(inner);
        let src = std::error::Error::source(&err).unwrap();
        assert_eq!(src.to_string(), "not found");
    }
}
