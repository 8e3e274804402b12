//! Input validation for findings and status values
//!
//! Pure functions: no store access, no logging. Checks are independent and
//! cumulative so a caller sees every problem with a finding at once.

use crate::types::{AlertStatus, Category, Finding, Severity};
use serde::Serialize;

/// Outcome of validating a finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,

    /// Errors in check order: type, severity, category
    pub errors: Vec<String>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

const TYPE_REQUIRED: &str = "Finding type is required";

/// Validate the shape of an incoming finding
///
/// An absent finding reports only the missing type. Empty `severity` and
/// `category` strings count as absent; present values must match the
/// vocabulary exactly.
pub fn validate_finding(finding: Option<&Finding>) -> ValidationResult {
    let Some(finding) = finding else {
        return ValidationResult::from_errors(vec![TYPE_REQUIRED.to_string()]);
    };

    let mut errors = Vec::new();

    if finding.kind().is_none() {
        errors.push(TYPE_REQUIRED.to_string());
    }

    if let Some(severity) = present(&finding.severity) {
        if severity.parse::<Severity>().is_err() {
            errors.push(format!(
                "Invalid severity. Must be one of: {}",
                join(Severity::ALL.iter().map(Severity::as_str))
            ));
        }
    }

    if let Some(category) = present(&finding.category) {
        if category.parse::<Category>().is_err() {
            errors.push(format!(
                "Invalid category. Must be one of: {}",
                join(Category::ALL.iter().map(Category::as_str))
            ));
        }
    }

    ValidationResult::from_errors(errors)
}

/// Whether `status` is exactly one of the status vocabulary strings
pub fn validate_status(status: &str) -> bool {
    status.parse::<AlertStatus>().is_ok()
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.collect::<Vec<_>>().join(", ")
}
