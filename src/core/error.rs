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

//! Error types for field path parsing

use thiserror::Error;

pub use super::error_code::*;

/// Result type alias for field path operations
pub type Result<T> = std::result::Result<T, FieldPathError>;

/// A classified parse failure with the position it was detected at
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code}: {kind}: {message}{}", path.as_ref().map(|p| format!(" in path '{p}'")).unwrap_or_default())]
pub struct FieldPathError {
    /// Stable classification
    pub kind: ErrorKind,
    /// Stable code derived from `kind`
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Byte offset in the parsed text
    pub position: usize,
    /// The path (or order-by clause) being parsed, when known
    pub path: Option<String>,
}

impl FieldPathError {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            code: kind.code(),
            message: message.into(),
            position,
            path: None,
        }
    }

    /// Create a syntax error
    pub fn invalid_syntax(message: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::InvalidSyntax, message, position)
    }

    /// Create an invalid field error
    pub fn invalid_field(message: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::InvalidField, message, position)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::InternalError, message, position)
    }

    /// Create a sorting forbidden error
    pub fn sorting_forbidden(message: impl Into<String>, position: usize) -> Self {
        Self::new(ErrorKind::SortingForbidden, message, position)
    }

    /// Attach the text being parsed
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get error information with help text
    pub fn error_info(&self) -> &'static ErrorInfo {
        self.code.info()
    }

    pub fn is_invalid_syntax(&self) -> bool {
        self.kind == ErrorKind::InvalidSyntax
    }

    pub fn is_invalid_field(&self) -> bool {
        self.kind == ErrorKind::InvalidField
    }

    pub fn is_internal(&self) -> bool {
        self.kind == ErrorKind::InternalError
    }

    pub fn is_sorting_forbidden(&self) -> bool {
        self.kind == ErrorKind::SortingForbidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FieldPathError::invalid_field("unknown field 'nope'", 4).with_path("sub.nope");
        assert_eq!(
            err.to_string(),
            "FP0002: invalid field: unknown field 'nope' in path 'sub.nope'"
        );
        assert!(err.is_invalid_field());
        assert_eq!(err.position, 4);
    }

    #[test]
    fn test_error_code_follows_kind() {
        let err = FieldPathError::sorting_forbidden("no", 0);
        assert_eq!(err.code, FP0004);
        assert_eq!(err.error_info().title, "Ordering forbidden");
    }
}
