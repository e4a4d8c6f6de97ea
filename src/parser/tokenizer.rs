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

//! Scanner for field paths and order-by clauses
//!
//! Tokens borrow from the input where possible; only string literals with
//! escapes allocate. The scanner never skips whitespace on its own so the
//! field-mask parsers can reject it while the order-by parser skips it.

use super::lexer::{Keyword, is_identifier_continue, is_identifier_start, keyword};
use super::span::Spanned;
use std::borrow::Cow;
use std::fmt;

/// A lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'input> {
    /// Field name or bare map key
    Identifier(&'input str),
    /// `.`
    Period,
    /// `,`
    Comma,
    /// `*`
    Asterisk,
    /// Quoted string, unescaped
    String(Cow<'input, str>),
    /// Signed integer literal (e.g. `653`, `-1`)
    Int(i64),
    /// Unsigned integer literal (e.g. `7u`)
    Uint(u64),
    /// `true` or `false`
    Bool(bool),
    /// `asc` in any letter case, keeping the source text
    Asc(&'input str),
    /// `desc` in any letter case, keeping the source text
    Desc(&'input str),
    /// A run of whitespace
    Whitespace,
    /// End of input
    Eof,
    /// Text that does not form a token
    Illegal(&'input str),
}

impl<'input> Token<'input> {
    /// Text usable as a field name: identifiers and sort keywords
    pub fn field_name(&self) -> Option<&'input str> {
        match self {
            Token::Identifier(name) | Token::Asc(name) | Token::Desc(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Eof)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{name}'"),
            Token::Period => f.write_str("'.'"),
            Token::Comma => f.write_str("','"),
            Token::Asterisk => f.write_str("'*'"),
            Token::String(s) => write!(f, "string {s:?}"),
            Token::Int(v) => write!(f, "integer {v}"),
            Token::Uint(v) => write!(f, "unsigned integer {v}u"),
            Token::Bool(v) => write!(f, "boolean {v}"),
            Token::Asc(text) | Token::Desc(text) => write!(f, "keyword '{text}'"),
            Token::Whitespace => f.write_str("whitespace"),
            Token::Eof => f.write_str("end of input"),
            Token::Illegal(text) => write!(f, "illegal text '{text}'"),
        }
    }
}

/// Single-pass scanner with non-consuming lookahead
#[derive(Debug, Clone)]
pub struct Scanner<'input> {
    input: &'input str,
    position: usize,
}

impl<'input> Scanner<'input> {
    /// Create a scanner over `input`
    pub fn new(input: &'input str) -> Self {
        Self { input, position: 0 }
    }

    /// Restart scanning over new text
    pub fn reset(&mut self, input: &'input str) {
        self.input = input;
        self.position = 0;
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn input(&self) -> &'input str {
        self.input
    }

    /// Check the next token without consuming it
    pub fn peek<F>(&self, predicate: F) -> bool
    where
        F: FnOnce(&Token<'input>) -> bool,
    {
        let mut lookahead = self.clone();
        predicate(&lookahead.next_token().value)
    }

    /// Advance past any whitespace
    pub fn skip_whitespace(&mut self) {
        let rest = &self.input[self.position..];
        let trimmed = rest.trim_start();
        self.position += rest.len() - trimmed.len();
    }

    /// Scan one token; at the end of input this keeps returning `Eof`
    pub fn next_token(&mut self) -> Spanned<Token<'input>> {
        let start = self.position;
        let Some(c) = self.current() else {
            return Spanned::new(Token::Eof, start, start);
        };

        let token = match c {
            '.' => self.single(Token::Period),
            ',' => self.single(Token::Comma),
            '*' => self.single(Token::Asterisk),
            '\'' | '"' => self.scan_string(c),
            '-' | '0'..='9' => self.scan_number(),
            c if c.is_whitespace() => {
                self.skip_whitespace();
                Token::Whitespace
            }
            c if is_identifier_start(c) => self.scan_identifier(),
            c => {
                self.position += c.len_utf8();
                Token::Illegal(&self.input[start..self.position])
            }
        };
        Spanned::new(token, start, self.position)
    }

    fn current(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn single(&mut self, token: Token<'input>) -> Token<'input> {
        self.position += 1;
        token
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(c) = self.current() {
            if !predicate(c) {
                break;
            }
            self.position += c.len_utf8();
        }
    }

    fn scan_identifier(&mut self) -> Token<'input> {
        let start = self.position;
        self.take_while(is_identifier_continue);
        let ident = &self.input[start..self.position];
        match keyword(ident) {
            Some(Keyword::True) => Token::Bool(true),
            Some(Keyword::False) => Token::Bool(false),
            Some(Keyword::Asc) => Token::Asc(ident),
            Some(Keyword::Desc) => Token::Desc(ident),
            None => Token::Identifier(ident),
        }
    }

    fn scan_number(&mut self) -> Token<'input> {
        let start = self.position;
        let negative = self.current() == Some('-');
        if negative {
            self.position += 1;
        }
        let digits_start = self.position;
        self.take_while(|c| c.is_ascii_digit());
        let digits = &self.input[digits_start..self.position];

        let unsigned = matches!(self.current(), Some('u' | 'U'));
        if unsigned {
            self.position += 1;
        }
        // `12ab` and `-` alone are not numbers
        self.take_while(is_identifier_continue);
        let text = &self.input[start..self.position];
        let suffix_len = usize::from(unsigned);
        if digits.is_empty() || digits_start + digits.len() + suffix_len != self.position {
            return Token::Illegal(text);
        }

        if unsigned {
            if negative {
                return Token::Illegal(text);
            }
            return digits.parse().map_or(Token::Illegal(text), Token::Uint);
        }
        let signed = &self.input[start..digits_start + digits.len()];
        signed.parse().map_or(Token::Illegal(text), Token::Int)
    }

    fn scan_string(&mut self, quote: char) -> Token<'input> {
        let start = self.position;
        self.position += 1;
        let body_start = self.position;
        let mut owned: Option<String> = None;

        while let Some(c) = self.current() {
            if c == quote {
                let body = &self.input[body_start..self.position];
                self.position += 1;
                return Token::String(match owned {
                    Some(s) => Cow::Owned(s),
                    None => Cow::Borrowed(body),
                });
            }
            if c == '\\' {
                let buffer = owned.get_or_insert_with(|| {
                    self.input[body_start..self.position].to_string()
                });
                self.position += 1;
                let escaped = match self.current() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some('r') => '\r',
                    Some('0') => '\0',
                    Some(c @ ('\\' | '\'' | '"')) => c,
                    Some(other) => {
                        self.position += other.len_utf8();
                        return Token::Illegal(&self.input[start..self.position]);
                    }
                    None => break,
                };
                buffer.push(escaped);
                self.position += escaped_len(escaped);
                continue;
            }
            if let Some(buffer) = owned.as_mut() {
                buffer.push(c);
            }
            self.position += c.len_utf8();
        }

        // Unterminated
        self.position = self.input.len();
        Token::Illegal(&self.input[start..])
    }
}

/// Source length of the character after a backslash
fn escaped_len(escaped: char) -> usize {
    match escaped {
        '\n' | '\t' | '\r' | '\0' => 1,
        c => c.len_utf8(),
    }
}

impl<'input> Iterator for Scanner<'input> {
    type Item = Spanned<Token<'input>>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        (!token.value.is_eof()).then_some(token)
    }
}
