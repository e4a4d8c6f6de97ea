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

//! Token cursor shared by the path parsers

use super::span::Spanned;
use super::tokenizer::{Scanner, Token};
use crate::core::{FieldPathError, Result};

/// Wraps the scanner with the error conventions of the path grammars
///
/// In strict mode (field masks) whitespace is a syntax error; in lenient
/// mode (order-by) it is skipped before every token.
pub(crate) struct PathCursor<'input> {
    scanner: Scanner<'input>,
    lenient: bool,
    depth: usize,
    max_depth: usize,
}

impl<'input> PathCursor<'input> {
    pub fn strict(text: &'input str, max_depth: usize) -> Self {
        Self {
            scanner: Scanner::new(text),
            lenient: false,
            depth: 0,
            max_depth,
        }
    }

    pub fn lenient(text: &'input str, max_depth: usize) -> Self {
        Self {
            lenient: true,
            ..Self::strict(text, max_depth)
        }
    }

    /// Next meaningful token; whitespace (strict mode) and illegal text are errors
    pub fn next(&mut self) -> Result<Spanned<Token<'input>>> {
        if self.lenient {
            self.scanner.skip_whitespace();
        }
        let token = self.scanner.next_token();
        match &token.value {
            Token::Whitespace => Err(FieldPathError::invalid_syntax(
                "unexpected whitespace",
                token.start,
            )),
            Token::Illegal(text) => Err(FieldPathError::invalid_syntax(
                format!("unexpected '{text}'"),
                token.start,
            )),
            _ => Ok(token),
        }
    }

    /// Non-consuming check of the next token
    pub fn peek<F>(&mut self, predicate: F) -> bool
    where
        F: FnOnce(&Token<'input>) -> bool,
    {
        if self.lenient {
            self.scanner.skip_whitespace();
        }
        self.scanner.peek(predicate)
    }

    pub fn at_end(&mut self) -> bool {
        self.peek(Token::is_eof)
    }

    /// Consume a `.` or fail naming what was found instead
    pub fn expect_period(&mut self, after: &str) -> Result<()> {
        let token = self.next()?;
        match token.value {
            Token::Period => Ok(()),
            other => Err(FieldPathError::invalid_syntax(
                format!("expected '.' after {after}, found {other}"),
                token.start,
            )),
        }
    }

    /// Count one more path segment against the depth limit
    pub fn enter(&mut self, position: usize) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(FieldPathError::invalid_syntax(
                format!("path exceeds the maximum depth of {}", self.max_depth),
                position,
            ));
        }
        Ok(())
    }

    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Input text a token was scanned from
    pub fn source(&self, token: &Spanned<Token<'input>>) -> &'input str {
        &self.scanner.input()[token.start..token.end]
    }
}
