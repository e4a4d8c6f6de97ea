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

//! Diagnostics for field path parsing
//!
//! Every parse failure is both returned as a [`FieldPathError`](crate::FieldPathError)
//! and reported to an optional [`ErrorHandler`]. [`DiagnosticCollector`] is the
//! stock handler that keeps them around for later rendering.

pub mod collector;
pub mod diagnostic;
pub mod formatter;

pub use collector::{DiagnosticCollector, ErrorHandler};
pub use diagnostic::{Diagnostic, Severity, SourceLocation};
pub use formatter::{DiagnosticFormat, DiagnosticFormatter, Format};
