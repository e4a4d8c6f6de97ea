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

//! Select-path parser
//!
//! Turns a field mask into one consolidated [`MessageSelect`]. Paths are
//! merged into a single tree held in the [`NodeArena`] so overlapping
//! paths reuse the nodes built by earlier ones.

use super::cursor::PathCursor;
use super::tokenizer::Token;
use crate::ast::{ArenaNode, MapKeyValue, MessageSelect, NodeArena, NodeId};
use crate::core::{FieldPathError, Result};
use crate::schema::{FieldInfo, MessageInfo, SchemaMetadata};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Message types currently being expanded on one branch
type Branch<'m> = SmallVec<[&'m str; 8]>;

pub(crate) struct SelectParser<'a> {
    metadata: &'a SchemaMetadata,
    arena: &'a mut NodeArena,
    max_depth: usize,
}

impl<'a> SelectParser<'a> {
    pub fn new(metadata: &'a SchemaMetadata, arena: &'a mut NodeArena, max_depth: usize) -> Self {
        Self {
            metadata,
            arena,
            max_depth,
        }
    }

    /// Parse and consolidate `paths`; `None` when there are none
    ///
    /// The arena is empty when this returns, whether it succeeded or not.
    pub fn parse<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<Option<MessageSelect>> {
        self.arena.clear();
        let result = self.parse_all(paths);
        self.arena.clear();
        result
    }

    fn parse_all<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<Option<MessageSelect>> {
        if paths.is_empty() {
            return Ok(None);
        }
        let metadata = self.metadata;
        let root = metadata.root().ok_or_else(|| {
            FieldPathError::internal(format!("unknown message type '{}'", metadata.root_name()), 0)
        })?;
        let root_node = self.arena.alloc_message()?;

        let mut seen = FxHashSet::default();
        for path in paths.iter().map(|p| p.as_ref()) {
            if !seen.insert(path) {
                continue;
            }
            let mut cursor = PathCursor::strict(path, self.max_depth);
            self.parse_in_message(&mut cursor, root, root_node)
                .map_err(|e| e.with_path(path))?;
        }
        self.arena.materialize(root_node).map(Some)
    }

    /// Parse the remainder of a path relative to `message`
    fn parse_in_message(
        &mut self,
        cursor: &mut PathCursor<'_>,
        message: &'a MessageInfo,
        node: NodeId,
    ) -> Result<()> {
        let token = cursor.next()?;
        if token.value == Token::Asterisk {
            if !cursor.at_end() {
                return Err(FieldPathError::invalid_syntax(
                    "'*' must be the last segment of a path",
                    token.start,
                ));
            }
            return self.expand_all(message, node, &mut Branch::new());
        }

        let Some(name) = token.value.field_name() else {
            return Err(FieldPathError::invalid_syntax(
                format!("expected field name or '*', found {}", token.value),
                token.start,
            ));
        };
        let field = message.field(name).ok_or_else(|| {
            FieldPathError::invalid_field(
                format!("unknown field '{name}' in message '{}'", message.name),
                token.start,
            )
        })?;
        if !field.is_selectable() {
            return Err(FieldPathError::invalid_field(
                format!("field '{name}' is input only"),
                token.start,
            ));
        }
        cursor.enter(token.start)?;

        let field_node = self.field_node(node, field)?;
        if cursor.at_end() {
            return self.select_terminal(field, field_node);
        }
        cursor.expect_period(&format!("field '{name}'"))?;

        if field.is_list() {
            self.parse_list_elements(cursor, field, field_node)
        } else if field.is_map() {
            self.parse_map_key(cursor, field, field_node)
        } else if field.is_message() {
            let nested = self.message_type(field, token.start)?;
            let child = self.message_traversal(field_node)?;
            self.parse_in_message(cursor, nested, child)
        } else {
            Err(FieldPathError::invalid_syntax(
                format!("field '{name}' of kind {} has no sub-fields", field.kind),
                cursor.position(),
            ))
        }
    }

    /// `list.*` optionally followed by `.sub_path` for message elements
    fn parse_list_elements(
        &mut self,
        cursor: &mut PathCursor<'_>,
        field: &'a FieldInfo,
        field_node: NodeId,
    ) -> Result<()> {
        let token = cursor.next()?;
        if token.value != Token::Asterisk {
            return Err(FieldPathError::invalid_syntax(
                format!(
                    "expected '*' after repeated field '{}', found {}",
                    field.name, token.value
                ),
                token.start,
            ));
        }
        if cursor.at_end() {
            return self.select_terminal(field, field_node);
        }
        cursor.expect_period("'*'")?;
        if !field.is_message() {
            return Err(FieldPathError::invalid_syntax(
                format!("elements of repeated field '{}' have no sub-fields", field.name),
                cursor.position(),
            ));
        }
        let nested = self.message_type(field, token.start)?;
        let child = self.message_traversal(field_node)?;
        self.parse_in_message(cursor, nested, child)
    }

    /// `map.key` or `map.*`, optionally followed by `.sub_path` for message values
    fn parse_map_key(
        &mut self,
        cursor: &mut PathCursor<'_>,
        field: &'a FieldInfo,
        field_node: NodeId,
    ) -> Result<()> {
        let token = cursor.next()?;
        let key_kind = field.map_key.ok_or_else(|| {
            FieldPathError::internal(format!("map field '{}' has no key kind", field.name), token.start)
        })?;
        let key = match &token.value {
            Token::Asterisk => MapKeyValue::Wildcard,
            other => key_kind
                .parse_key(other, cursor.source(&token))
                .map(MapKeyValue::Value)
                .ok_or_else(|| {
                    FieldPathError::invalid_syntax(
                        format!("expected {key_kind} key for map '{}', found {other}", field.name),
                        token.start,
                    )
                })?,
        };
        cursor.enter(token.start)?;

        let keys = self.map_keys_traversal(field_node)?;
        let key_node = self.key_node(keys, key)?;
        if cursor.at_end() {
            if field.is_message() {
                return self.expand_message_into(field, key_node, &mut Branch::new());
            }
            return Ok(());
        }
        cursor.expect_period("map key")?;
        if !field.is_message() {
            return Err(FieldPathError::invalid_syntax(
                format!("values of map '{}' have no sub-fields", field.name),
                cursor.position(),
            ));
        }
        let nested = self.message_type(field, token.start)?;
        let child = self.message_traversal(key_node)?;
        self.parse_in_message(cursor, nested, child)
    }

    /// A path ending at `field`: singular and repeated messages expand fully
    ///
    /// Anything already selected below the field is kept, so a leaf and a
    /// longer path through it merge the same way in either order.
    fn select_terminal(&mut self, field: &'a FieldInfo, field_node: NodeId) -> Result<()> {
        if field.is_message() && !field.is_map() {
            return self.expand_message_into(field, field_node, &mut Branch::new());
        }
        Ok(())
    }

    /// Select every readable field of `message` under `node`
    fn expand_all(
        &mut self,
        message: &'a MessageInfo,
        node: NodeId,
        branch: &mut Branch<'a>,
    ) -> Result<()> {
        branch.push(message.name.as_str());
        for field in message.fields().filter(|f| f.is_selectable()) {
            let field_node = self.field_node(node, field)?;
            if field.is_map() {
                if field.is_message() {
                    let keys = self.map_keys_traversal(field_node)?;
                    let key_node = self.key_node(keys, MapKeyValue::Wildcard)?;
                    self.expand_message_into(field, key_node, branch)?;
                }
            } else if field.is_message() {
                self.expand_message_into(field, field_node, branch)?;
            }
        }
        branch.pop();
        Ok(())
    }

    /// Expand the message type of `field` below `node`
    ///
    /// A type that is already being expanded higher up the same branch is
    /// left as a leaf.
    fn expand_message_into(
        &mut self,
        field: &'a FieldInfo,
        node: NodeId,
        branch: &mut Branch<'a>,
    ) -> Result<()> {
        let nested = self.message_type(field, 0)?;
        if branch.contains(&nested.name.as_str()) {
            log::debug!(
                "not expanding recursive type {} below field '{}'",
                nested.name,
                field.name
            );
            return Ok(());
        }
        let child = self.message_traversal(node)?;
        self.expand_all(nested, child, branch)
    }

    fn message_type(&self, field: &FieldInfo, position: usize) -> Result<&'a MessageInfo> {
        let metadata = self.metadata;
        field
            .message_type
            .as_deref()
            .and_then(|name| metadata.message(name))
            .ok_or_else(|| {
                FieldPathError::internal(
                    format!("no message type for field '{}'", field.name),
                    position,
                )
            })
    }

    /// Existing node for `field` under a message node, or a new one
    fn field_node(&mut self, message: NodeId, field: &FieldInfo) -> Result<NodeId> {
        if let Some(existing) = self.arena.message_field(message, &field.name)? {
            return Ok(existing);
        }
        let node = self.arena.alloc(ArenaNode::Field {
            message: field.message.clone(),
            field: field.name.clone(),
            complexity: field.complexity,
            traversal: None,
        })?;
        self.arena.push_field(message, &field.name, node)?;
        Ok(node)
    }

    /// Existing node for `key` under a map-keys node, or a new one
    fn key_node(&mut self, keys: NodeId, key: MapKeyValue) -> Result<NodeId> {
        if let Some(existing) = self.arena.map_key(keys, &key)? {
            return Ok(existing);
        }
        let node = self.arena.alloc(ArenaNode::MapKey {
            key,
            traversal: None,
        })?;
        self.arena.push_map_key(keys, node)?;
        Ok(node)
    }

    /// Message node below a field or key, created on first use
    fn message_traversal(&mut self, node: NodeId) -> Result<NodeId> {
        if let Some(existing) = self.arena.traversal(node)? {
            return Ok(existing);
        }
        let child = self.arena.alloc_message()?;
        self.arena.set_traversal(node, child)?;
        Ok(child)
    }

    /// Map-keys node below a map field, created on first use
    fn map_keys_traversal(&mut self, node: NodeId) -> Result<NodeId> {
        if let Some(existing) = self.arena.traversal(node)? {
            return Ok(existing);
        }
        let child = self.arena.alloc(ArenaNode::MapKeys { keys: Vec::new() })?;
        self.arena.set_traversal(node, child)?;
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Traversal, ValueExpr};
    use crate::core::ErrorKind;
    use crate::schema::introspect;
    use crate::testing;
    use pretty_assertions::assert_eq;

    fn select(paths: &[&str]) -> Result<Option<MessageSelect>> {
        let registry = testing::registry();
        let metadata = introspect(&registry, testing::MESSAGE)?;
        let mut arena = NodeArena::new();
        let result = SelectParser::new(&metadata, &mut arena, 32).parse(paths);
        assert!(arena.is_empty());
        result
    }

    #[test]
    fn test_empty_input_is_none() {
        assert_eq!(select(&[]).unwrap(), None);
    }

    #[test]
    fn test_sibling_paths_merge_in_first_seen_order() {
        let tree = select(&["sub.name", "sub.i32"]).unwrap().unwrap();
        assert_eq!(tree.names(), vec!["sub"]);
        let Some(Traversal::Message(sub)) = &tree.fields[0].traversal else {
            panic!("expected message traversal");
        };
        assert_eq!(sub.names(), vec!["name", "i32"]);
    }

    #[test]
    fn test_map_key_literal_is_typed() {
        let tree = select(&["map_i64_str.-3"]).unwrap().unwrap();
        let Some(Traversal::MapKeys(keys)) = &tree.fields[0].traversal else {
            panic!("expected map keys");
        };
        assert!(
            keys.get(&MapKeyValue::Value(ValueExpr::Int64(-3)))
                .is_some()
        );
    }

    #[test]
    fn test_sub_field_attaches_under_leaf_map() {
        let tree = select(&["map_str_msg", "map_str_msg.key.name"]).unwrap().unwrap();
        let Some(Traversal::MapKeys(keys)) = &tree.fields[0].traversal else {
            panic!("expected map keys");
        };
        let key = keys
            .get(&MapKeyValue::Value(ValueExpr::String("key".into())))
            .unwrap();
        let Some(Traversal::Message(value)) = &key.traversal else {
            panic!("expected message value");
        };
        assert_eq!(value.names(), vec!["name"]);
    }

    #[test]
    fn test_string_key_keeps_literal_spelling() {
        let tree = select(&["map_str_str.false"]).unwrap().unwrap();
        let Some(Traversal::MapKeys(keys)) = &tree.fields[0].traversal else {
            panic!("expected map keys");
        };
        assert!(
            keys.get(&MapKeyValue::Value(ValueExpr::String("false".into())))
                .is_some()
        );
    }

    #[test]
    fn test_arena_is_cleared_on_error() {
        let err = select(&["sub.name", "sub.nope"]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidField);
        assert_eq!(err.path.as_deref(), Some("sub.nope"));
    }
}
