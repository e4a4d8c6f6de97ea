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

//! Side-channel error reporting
//!
//! Parsers report every diagnostic to an optional [`ErrorHandler`] in
//! addition to returning the classified error. A handler that never aborts
//! lets a caller accumulate diagnostics over several parses.

use super::diagnostic::Diagnostic;
use super::formatter::{DiagnosticFormatter, Format};
use crate::core::FieldPathError;
use parking_lot::Mutex;
use std::sync::Arc;

/// Receives `(position, message)` for every diagnostic a parser emits
pub trait ErrorHandler: Send {
    /// Report a diagnostic at a byte offset
    fn report(&mut self, position: usize, message: &str);

    /// Report a classified error; defaults to [`ErrorHandler::report`]
    fn report_error(&mut self, error: &FieldPathError) {
        self.report(error.position, &error.message);
    }
}

impl<F> ErrorHandler for F
where
    F: FnMut(usize, &str) + Send,
{
    fn report(&mut self, position: usize, message: &str) {
        self(position, message)
    }
}

/// Collects diagnostics; clones share the same storage
#[derive(Debug, Clone)]
pub struct DiagnosticCollector {
    diagnostics: Arc<Mutex<Vec<Diagnostic>>>,
    max_diagnostics: usize,
}

impl Default for DiagnosticCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticCollector {
    /// Create a collector keeping at most 100 diagnostics
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    /// Create a collector keeping at most `max_diagnostics` diagnostics
    pub fn with_limit(max_diagnostics: usize) -> Self {
        Self {
            diagnostics: Arc::new(Mutex::new(Vec::new())),
            max_diagnostics,
        }
    }

    /// Add a diagnostic, dropping it once the limit is reached
    pub fn push(&self, diagnostic: Diagnostic) {
        let mut diagnostics = self.diagnostics.lock();
        if diagnostics.len() < self.max_diagnostics {
            diagnostics.push(diagnostic);
        }
    }

    /// Snapshot of the collected diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Remove and return every collected diagnostic
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.lock().iter().any(Diagnostic::is_error)
    }

    /// Render every diagnostic as text, pointing into `source` when a
    /// diagnostic carries no source text of its own
    pub fn render(&self, source: &str) -> String {
        let formatter = DiagnosticFormatter::new(Format::Text);
        self.diagnostics
            .lock()
            .iter()
            .map(|diagnostic| match diagnostic.source_text {
                Some(_) => formatter.format(diagnostic),
                None => formatter.format(&diagnostic.clone().with_source_text(source)),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ErrorHandler for DiagnosticCollector {
    fn report(&mut self, position: usize, message: &str) {
        self.push(Diagnostic::error(message, position));
    }

    fn report_error(&mut self, error: &FieldPathError) {
        self.push(Diagnostic::from_error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorKind;

    #[test]
    fn test_clones_share_storage() {
        let collector = DiagnosticCollector::new();
        let mut handler = collector.clone();

        handler.report(2, "first");
        handler.report_error(&FieldPathError::invalid_field("second", 5));

        let diagnostics = collector.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].kind, None);
        assert_eq!(diagnostics[1].kind, Some(ErrorKind::InvalidField));
        assert!(collector.has_errors());
    }

    #[test]
    fn test_limit_is_respected() {
        let mut collector = DiagnosticCollector::with_limit(1);
        collector.report(0, "kept");
        collector.report(1, "dropped");
        assert_eq!(collector.take().len(), 1);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_closure_handler() {
        let mut seen = Vec::new();
        {
            let mut handler = |position: usize, message: &str| {
                seen.push((position, message.to_string()));
            };
            handler.report_error(&FieldPathError::invalid_syntax("bad", 7));
        }
        assert_eq!(seen, vec![(7, "bad".to_string())]);
    }

    #[test]
    fn test_render_points_into_source() {
        let mut collector = DiagnosticCollector::new();
        collector.report(4, "unexpected '.'");
        let rendered = collector.render("sub..name");
        assert!(rendered.starts_with("error: unexpected '.'"), "{rendered}");
        assert!(rendered.contains("   | sub..name\n   |     ^\n"), "{rendered}");
    }
}
