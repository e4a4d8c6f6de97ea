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

//! Order-by parser
//!
//! Grammar: `field('.'field)* (ASC|DESC)? (',' field('.'field)* (ASC|DESC)?)*`.
//! Whitespace around commas and keywords is ignored.

use super::cursor::PathCursor;
use super::tokenizer::Token;
use crate::ast::{FieldSelector, OrderByExpr, OrderByFieldExpr, SortOrder, Traversal};
use crate::core::{FieldPathError, Result};
use crate::schema::{MessageInfo, SchemaMetadata};

pub(crate) struct OrderByParser<'a> {
    metadata: &'a SchemaMetadata,
    max_depth: usize,
}

impl<'a> OrderByParser<'a> {
    pub fn new(metadata: &'a SchemaMetadata, max_depth: usize) -> Self {
        Self {
            metadata,
            max_depth,
        }
    }

    pub fn parse(&self, text: &str) -> Result<OrderByExpr> {
        self.parse_clause(text).map_err(|e| e.with_path(text))
    }

    fn parse_clause(&self, text: &str) -> Result<OrderByExpr> {
        let root = self.metadata.root().ok_or_else(|| {
            FieldPathError::internal(
                format!("unknown message type '{}'", self.metadata.root_name()),
                0,
            )
        })?;
        let mut cursor = PathCursor::lenient(text, self.max_depth);
        if cursor.at_end() {
            return Err(FieldPathError::invalid_syntax(
                "order by clause is empty",
                cursor.position(),
            ));
        }

        let mut expr = OrderByExpr::default();
        loop {
            let field = self.parse_field(&mut cursor, root)?;
            let order = if cursor.peek(|t| matches!(t, Token::Asc(_))) {
                cursor.next()?;
                SortOrder::Asc
            } else if cursor.peek(|t| matches!(t, Token::Desc(_))) {
                cursor.next()?;
                SortOrder::Desc
            } else {
                SortOrder::Asc
            };
            expr.fields.push(OrderByFieldExpr { field, order });

            let token = cursor.next()?;
            match token.value {
                Token::Comma => continue,
                Token::Eof => break,
                other => {
                    return Err(FieldPathError::invalid_syntax(
                        format!("expected ',' or end of input, found {other}"),
                        token.start,
                    ));
                }
            }
        }
        Ok(expr)
    }

    /// One dotted field chain; every field must be singular and sortable
    fn parse_field(&self, cursor: &mut PathCursor<'_>, message: &'a MessageInfo) -> Result<FieldSelector> {
        let token = cursor.next()?;
        let Some(name) = token.value.field_name() else {
            return Err(FieldPathError::invalid_syntax(
                format!("expected field name, found {}", token.value),
                token.start,
            ));
        };
        // Oneof members are part of the field map
        let field = message.field(name).ok_or_else(|| {
            FieldPathError::invalid_field(
                format!("unknown field '{name}' in message '{}'", message.name),
                token.start,
            )
        })?;
        if !field.is_singular() {
            return Err(FieldPathError::invalid_field(
                format!(
                    "cannot order by {} field '{name}'",
                    if field.is_map() { "map" } else { "repeated" }
                ),
                token.start,
            ));
        }
        if field.ordering_forbidden {
            return Err(FieldPathError::sorting_forbidden(
                format!("ordering by field '{name}' is not allowed"),
                token.start,
            ));
        }
        cursor.enter(token.start)?;

        let mut selector = FieldSelector::new(field.message.clone(), name, field.complexity);
        if !cursor.peek(|t| *t == Token::Period) {
            return Ok(selector);
        }
        cursor.next()?;
        if !field.is_message() {
            return Err(FieldPathError::invalid_syntax(
                format!("field '{name}' of kind {} has no sub-fields", field.kind),
                cursor.position(),
            ));
        }
        let metadata = self.metadata;
        let nested = field
            .message_type
            .as_deref()
            .and_then(|type_name| metadata.message(type_name))
            .ok_or_else(|| {
                FieldPathError::internal(format!("no message type for field '{name}'"), token.start)
            })?;
        let child = self.parse_field(cursor, nested)?;
        selector.traversal = Some(Traversal::Field(Box::new(child)));
        Ok(selector)
    }
}
