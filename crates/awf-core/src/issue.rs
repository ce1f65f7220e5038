// SPDX-License-Identifier: MIT OR Apache-2.0
//! Validation issue records (`spec.md` §6's `Issue` shape).

use serde::{Deserialize, Serialize};

/// Severity of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Blocks execution.
    Error,
    /// Advisory only; execution proceeds.
    Warning,
}

/// Which of the validator's four ordered checks produced the issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Schema/framing/uniqueness problems.
    Structure,
    /// Operation kind, API host, or credential not in the agent's allow-list.
    Permission,
    /// A reference path has no earlier-in-`order` producer.
    Dependency,
    /// Declared input/output shape mismatch.
    Type,
}

/// A single validator finding (`spec.md` §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// `error` or `warning`.
    pub severity: IssueSeverity,
    /// Which check category raised this issue.
    pub category: IssueCategory,
    /// The operation this issue concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Machine-readable remediation hint, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Issue {
    /// Construct an `error`-severity issue.
    pub fn error(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            category,
            operation_id: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Construct a `warning`-severity issue.
    pub fn warning(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            category,
            operation_id: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Attach the operation ID this issue concerns.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Attach a remediation suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Aggregate validation outcome (`spec.md` §6's validation response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Blocking issues.
    pub errors: Vec<Issue>,
    /// Advisory issues.
    pub warnings: Vec<Issue>,
}

impl ValidationReport {
    /// Build a report from a flat list of issues, splitting by severity.
    #[must_use]
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for issue in issues {
            match issue.severity {
                IssueSeverity::Error => errors.push(issue),
                IssueSeverity::Warning => warnings.push(issue),
            }
        }
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let issue = Issue::error(IssueCategory::Dependency, "forward reference")
            .with_operation_id("b")
            .with_suggestion("reorder operations");
        assert_eq!(issue.severity, IssueSeverity::Error);
        assert_eq!(issue.operation_id.as_deref(), Some("b"));
        assert_eq!(issue.suggestion.as_deref(), Some("reorder operations"));
    }

    #[test]
    fn report_valid_iff_no_errors() {
        let report = ValidationReport::from_issues(vec![Issue::warning(
            IssueCategory::Structure,
            "unusual but allowed",
        )]);
        assert!(report.valid);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn report_invalid_with_errors() {
        let report = ValidationReport::from_issues(vec![
            Issue::error(IssueCategory::Permission, "kind not allowed"),
            Issue::warning(IssueCategory::Type, "unusual type"),
        ]);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.warnings.len(), 1);
    }
}
