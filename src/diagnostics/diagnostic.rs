// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Core diagnostic types

use crate::core::{ErrorCode, ErrorKind, FieldPathError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Severity {
    /// Hint - subtle suggestion for improvement
    Hint,
    /// Information - provides helpful information
    #[default]
    Info,
    /// Warning - may indicate a problem but doesn't prevent parsing
    Warning,
    /// Error - the path was rejected
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// Location of a diagnostic inside the parsed text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Byte offset from the start of the text (0-based)
    pub offset: usize,
    /// Length of the offending text, at least 1
    pub length: usize,
}

impl SourceLocation {
    pub fn new(offset: usize, length: usize) -> Self {
        Self {
            offset,
            length: length.max(1),
        }
    }

    pub fn point(offset: usize) -> Self {
        Self::new(offset, 1)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.offset, self.offset + self.length)
    }
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Error classification, when the diagnostic came from a parse error
    pub kind: Option<ErrorKind>,
    /// Human-readable message
    pub message: String,
    /// Source location
    pub location: SourceLocation,
    /// The text the location refers to
    pub source_text: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            severity,
            kind: None,
            message: message.into(),
            location,
            source_text: None,
        }
    }

    /// Create an error diagnostic at a single offset
    pub fn error(message: impl Into<String>, offset: usize) -> Self {
        Self::new(Severity::Error, message, SourceLocation::point(offset))
    }

    /// Build a diagnostic from a classified parse error
    pub fn from_error(error: &FieldPathError) -> Self {
        Self {
            severity: Severity::Error,
            kind: Some(error.kind),
            message: error.message.clone(),
            location: SourceLocation::point(error.position),
            source_text: error.path.clone(),
        }
    }

    /// Attach the source text
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = Some(text.into());
        self
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    /// Stable code of the underlying error kind
    pub fn code(&self) -> Option<ErrorCode> {
        self.kind.map(ErrorKind::code)
    }

    /// Get the diagnostic code as a string
    pub fn code_string(&self) -> String {
        self.code()
            .map(|code| code.code_str())
            .unwrap_or_else(|| "FP0000".to_string())
    }

    /// Help text registered for the error code
    pub fn help(&self) -> Option<&'static str> {
        self.code().map(|code| code.info().help)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            match self.severity {
                Severity::Error => "ERROR",
                Severity::Warning => "WARN",
                Severity::Info => "INFO",
                Severity::Hint => "HINT",
            },
            self.code_string(),
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_keeps_kind() {
        let err = FieldPathError::invalid_syntax("expected '.'", 3).with_path("sub*");
        let diagnostic = Diagnostic::from_error(&err);

        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.kind, Some(ErrorKind::InvalidSyntax));
        assert_eq!(diagnostic.code_string(), "FP0001");
        assert_eq!(diagnostic.source_text.as_deref(), Some("sub*"));
        assert_eq!(diagnostic.to_string(), "[ERROR] FP0001: expected '.'");
    }

    #[test]
    fn test_plain_diagnostic_has_no_code() {
        let diagnostic = Diagnostic::error("something", 0);
        assert_eq!(diagnostic.code_string(), "FP0000");
        assert!(diagnostic.help().is_none());
    }
}
