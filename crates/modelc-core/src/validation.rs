//! Validation failure records, the diagnostic channel back to callers.

use crate::model::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCategory {
    /// The model cannot be generated.
    Error,
    /// The model is suspicious but usable.
    Warning,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCategory::Error => f.write_str("error"),
            FailureCategory::Warning => f.write_str("warning"),
        }
    }
}

/// A domain-level problem found in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Name of the validator that reported the failure.
    pub validator_name: String,
    /// Severity.
    pub category: FailureCategory,
    /// Human readable description.
    pub message: String,
    /// Position of the offending element, when known.
    pub source_location: Option<SourceLocation>,
}

impl ValidationFailure {
    /// Create an error-category failure.
    pub fn error(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            validator_name: validator_name.into(),
            category: FailureCategory::Error,
            message: message.into(),
            source_location: None,
        }
    }

    /// Create a warning-category failure.
    pub fn warning(validator_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: FailureCategory::Warning,
            ..Self::error(validator_name, message)
        }
    }

    /// Attach a source position.
    pub fn at(mut self, location: &SourceLocation) -> Self {
        self.source_location = Some(location.clone());
        self
    }

    /// Check whether this is an error-category failure.
    pub fn is_error(&self) -> bool {
        self.category == FailureCategory::Error
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.validator_name, self.message)?;
        if let Some(location) = &self.source_location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}
