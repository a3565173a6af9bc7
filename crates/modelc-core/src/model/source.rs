//! Source positions carried through to diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a model element in its source file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Source file name.
    #[serde(default)]
    pub file: String,
    /// One-based line number.
    #[serde(default)]
    pub line: u32,
    /// Zero-based column.
    #[serde(default)]
    pub column: u32,
}

impl SourceLocation {
    /// Create a source location.
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        }
    }
}
