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

//! Stable error codes for field path parsing
//!
//! Every [`ErrorKind`] maps to exactly one code in the `FP0001` style so
//! callers can branch on a code that never changes between releases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error classification shared by all path parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Grammar violation: a specific token was required and something else was found
    InvalidSyntax,
    /// Semantic violation: unknown field, forbidden access, missing map key
    InvalidField,
    /// A schema or value shape the parsers do not model
    InternalError,
    /// Ordering by a field that forbids it
    SortingForbidden,
}

impl ErrorKind {
    /// Stable error code for this kind
    pub const fn code(self) -> ErrorCode {
        match self {
            ErrorKind::InvalidSyntax => FP0001,
            ErrorKind::InvalidField => FP0002,
            ErrorKind::InternalError => FP0003,
            ErrorKind::SortingForbidden => FP0004,
        }
    }

    /// Short human-readable name
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::InvalidSyntax => "invalid syntax",
            ErrorKind::InvalidField => "invalid field",
            ErrorKind::InternalError => "internal error",
            ErrorKind::SortingForbidden => "sorting forbidden",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error code following the compiler pattern (FP0001, FP0002, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    pub code: u16,
}

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self { code }
    }

    /// Get the full error code string (e.g., "FP0001")
    pub fn code_str(&self) -> String {
        format!("FP{:04}", self.code)
    }

    /// Get error information from the registry
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_REGISTRY.get_error_info(self)
    }

    /// Get human-readable description for this error code
    pub fn description(&self) -> &'static str {
        self.info().title
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FP{:04}", self.code)
    }
}

/// Error information attached to a code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Error code number
    pub code: u16,
    /// Human-readable error title
    pub title: &'static str,
    /// Detailed description of the error
    pub description: &'static str,
    /// Help information and suggested solutions
    pub help: &'static str,
}

impl ErrorInfo {
    pub const fn new(
        code: u16,
        title: &'static str,
        description: &'static str,
        help: &'static str,
    ) -> Self {
        Self {
            code,
            title,
            description,
            help,
        }
    }
}

/// Central error registry containing all error definitions
pub struct ErrorRegistry;

impl ErrorRegistry {
    /// Get error information for a given error code
    pub fn get_error_info(&self, error_code: &ErrorCode) -> &'static ErrorInfo {
        match error_code.code {
            1 => &FP0001_INFO,
            2 => &FP0002_INFO,
            3 => &FP0003_INFO,
            4 => &FP0004_INFO,
            _ => &UNKNOWN_ERROR_INFO,
        }
    }
}

/// Global error registry instance
pub static ERROR_REGISTRY: ErrorRegistry = ErrorRegistry;

pub const FP0001: ErrorCode = ErrorCode::new(1); // Invalid path syntax
pub const FP0002: ErrorCode = ErrorCode::new(2); // Invalid field
pub const FP0003: ErrorCode = ErrorCode::new(3); // Unsupported schema or value shape
pub const FP0004: ErrorCode = ErrorCode::new(4); // Ordering forbidden

static FP0001_INFO: ErrorInfo = ErrorInfo::new(
    1,
    "Invalid path syntax",
    "The path contains a token where the grammar requires a different one.",
    "Field paths are dot separated field names, map keys and '*' wildcards, e.g. 'sub.name' or 'labels.*'. Order-by clauses are comma separated paths with an optional 'asc' or 'desc'.",
);

static FP0002_INFO: ErrorInfo = ErrorInfo::new(
    2,
    "Invalid field",
    "The path names a field that does not exist, may not be used here, or a map key that is not present.",
    "Check the field name against the message schema and its field behavior annotations (input only, output only, immutable).",
);

static FP0003_INFO: ErrorInfo = ErrorInfo::new(
    3,
    "Unsupported schema or value",
    "The schema or the supplied message value has a shape the parser does not model.",
    "Make sure the message value was built for the same schema as the parser and that no legacy group fields are addressed.",
);

static FP0004_INFO: ErrorInfo = ErrorInfo::new(
    4,
    "Ordering forbidden",
    "The order-by clause references a field annotated as not orderable.",
    "Remove the field from the order-by clause or order by a different field.",
);

static UNKNOWN_ERROR_INFO: ErrorInfo = ErrorInfo::new(
    0,
    "Unknown error",
    "An error code without a registered description.",
    "",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_formatting() {
        assert_eq!(FP0001.code_str(), "FP0001");
        assert_eq!(ErrorKind::SortingForbidden.code().to_string(), "FP0004");
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(ErrorKind::InvalidField.code().description(), "Invalid field");
        assert_eq!(ErrorCode::new(999).info().code, 0);
    }
}
