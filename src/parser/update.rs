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

//! Update-path parser
//!
//! Walks each update-mask path against the schema and a live message value
//! at the same time, extracting the data every path assigns.

use super::config::ParserConfig;
use super::cursor::PathCursor;
use super::tokenizer::Token;
use crate::ast::{
    ArrayExpr, ArrayUpdateExpr, FieldSelector, MapEntryExpr, MapKeyExpr, MapKeyValue,
    MapValueExpr, Traversal, UpdateElement, UpdateExpr, UpdateValue, ValueExpr,
};
use crate::core::{FieldPathError, Result};
use crate::model::kind::to_map_key;
use crate::model::{Cardinality, Kind, MapKey, MessageValue, Value, WellKnownTime};
use crate::schema::{FieldInfo, MessageInfo, SchemaMetadata};
use rustc_hash::FxHashSet;

/// Schema and live value of the same message, advanced in lock-step
///
/// `value` is `None` when the message is not set.
#[derive(Debug, Clone, Copy)]
pub struct MessageCursor<'a> {
    pub info: &'a MessageInfo,
    pub value: Option<&'a MessageValue>,
}

impl<'a> MessageCursor<'a> {
    /// Pair a message schema with a value, rejecting a value of another type
    pub fn new(
        info: &'a MessageInfo,
        value: Option<&'a MessageValue>,
        position: usize,
    ) -> Result<Self> {
        if let Some(value) = value {
            if value.type_name() != info.name {
                return Err(FieldPathError::internal(
                    format!(
                        "value of type '{}' does not match message '{}'",
                        value.type_name(),
                        info.name
                    ),
                    position,
                ));
            }
        }
        Ok(Self { info, value })
    }

    /// Cursor for a field of this message
    pub fn field(&self, name: &str) -> Option<FieldCursor<'a>> {
        let info = self.info.field(name)?;
        Some(FieldCursor {
            info: info.as_ref(),
            value: self.value.and_then(|v| v.get(name)),
        })
    }

    /// Cursors for every field, in schema order
    pub fn fields(&self) -> impl Iterator<Item = FieldCursor<'a>> + 'a {
        let value = self.value;
        self.info.fields().map(move |info| FieldCursor {
            info: info.as_ref(),
            value: value.and_then(|v| v.get(&info.name)),
        })
    }
}

/// Schema and live value of one field; `value` is `None` when unset
#[derive(Debug, Clone, Copy)]
pub struct FieldCursor<'a> {
    pub info: &'a FieldInfo,
    pub value: Option<&'a Value>,
}

impl<'a> FieldCursor<'a> {
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Step into a singular message field
    pub fn message(&self, metadata: &'a SchemaMetadata, position: usize) -> Result<MessageCursor<'a>> {
        let info = message_type(metadata, self.info, position)?;
        let value = match self.value {
            None => None,
            Some(Value::Message(message)) => Some(message),
            Some(other) => return Err(value_mismatch(self.info, other, position)),
        };
        MessageCursor::new(info, value, position)
    }

    /// Live value stored under `key`; `None` when the map lacks it or is unset
    pub fn map_entry(&self, key: &MapKey, position: usize) -> Result<Option<&'a Value>> {
        match self.value {
            None => Ok(None),
            Some(Value::Map(entries)) => Ok(entries.get(key)),
            Some(other) => Err(value_mismatch(self.info, other, position)),
        }
    }
}

fn message_type<'m>(
    metadata: &'m SchemaMetadata,
    field: &FieldInfo,
    position: usize,
) -> Result<&'m MessageInfo> {
    field
        .message_type
        .as_deref()
        .and_then(|name| metadata.message(name))
        .ok_or_else(|| {
            FieldPathError::internal(format!("no message type for field '{}'", field.name), position)
        })
}

fn value_mismatch(field: &FieldInfo, value: &Value, position: usize) -> FieldPathError {
    FieldPathError::internal(
        format!(
            "field '{}' holds a {} value, expected {}",
            field.name,
            value.type_name(),
            match field.cardinality {
                Cardinality::Repeated => "list",
                Cardinality::Map => "map",
                Cardinality::Singular => field.kind.name(),
            }
        ),
        position,
    )
}

/// Outcome of resolving the rest of a path
enum Resolved<'a> {
    /// Non-updatable field skipped in lenient mode
    Skip,
    Assign(FieldSelector, UpdateValue),
    /// Trailing `*` over this message
    All(MessageCursor<'a>),
}

pub(crate) struct UpdateParser<'a> {
    metadata: &'a SchemaMetadata,
    config: ParserConfig,
}

impl<'a> UpdateParser<'a> {
    pub fn new(metadata: &'a SchemaMetadata, config: ParserConfig) -> Self {
        Self { metadata, config }
    }

    pub fn parse<S: AsRef<str>>(&self, message: &'a MessageValue, paths: &[S]) -> Result<UpdateExpr> {
        let root_info = self.metadata.root().ok_or_else(|| {
            FieldPathError::internal(
                format!("unknown message type '{}'", self.metadata.root_name()),
                0,
            )
        })?;
        let root = MessageCursor::new(root_info, Some(message), 0)?;

        let mut expr = UpdateExpr::default();
        let mut seen = FxHashSet::default();
        for path in paths.iter().map(|p| p.as_ref()) {
            if !seen.insert(path) {
                continue;
            }
            let mut cursor = PathCursor::strict(path, self.config.max_depth);
            let resolved = self
                .resolve(&mut cursor, root, false)
                .and_then(|resolved| match resolved {
                    Resolved::All(message) => Ok(self.enumerate(message, 0)?.elements),
                    Resolved::Assign(field, value) => Ok(vec![UpdateElement { field, value }]),
                    Resolved::Skip => Ok(Vec::new()),
                })
                .map_err(|e| e.with_path(path))?;
            expr.elements.extend(resolved);
        }
        Ok(expr)
    }

    /// Resolve the rest of a path relative to `message`
    ///
    /// `absent` is set once a nullable ancestor turned out to be unset; the
    /// remaining segments are still validated but the path resolves to null.
    fn resolve(
        &self,
        cursor: &mut PathCursor<'_>,
        message: MessageCursor<'a>,
        absent: bool,
    ) -> Result<Resolved<'a>> {
        let token = cursor.next()?;
        if token.value == Token::Asterisk {
            if !cursor.at_end() {
                return Err(FieldPathError::invalid_syntax(
                    "'*' must be the last segment of a path",
                    token.start,
                ));
            }
            return Ok(Resolved::All(message));
        }

        let Some(name) = token.value.field_name() else {
            return Err(FieldPathError::invalid_syntax(
                format!("expected field name or '*', found {}", token.value),
                token.start,
            ));
        };
        let field = message.field(name).ok_or_else(|| {
            FieldPathError::invalid_field(
                format!("unknown field '{name}' in message '{}'", message.info.name),
                token.start,
            )
        })?;
        let info = field.info;
        if !info.is_updatable() {
            let reason = if info.flags.output_only {
                "output only"
            } else {
                "immutable"
            };
            if self.config.ignore_non_updatable {
                log::debug!("skipping {reason} field '{name}' in update mask");
                return Ok(Resolved::Skip);
            }
            return Err(FieldPathError::invalid_field(
                format!("field '{name}' is {reason}"),
                token.start,
            ));
        }
        cursor.enter(token.start)?;

        let mut selector = FieldSelector::new(info.message.clone(), name, info.complexity);
        if cursor.at_end() {
            let value = self.terminal(field, absent, token.start)?;
            return Ok(Resolved::Assign(selector, value));
        }
        cursor.expect_period(&format!("field '{name}'"))?;

        if info.is_list() {
            return Err(FieldPathError::invalid_syntax(
                format!("repeated field '{name}' must be the last segment"),
                token.start,
            ));
        }
        if info.is_map() {
            return self.resolve_map_entry(cursor, field, selector);
        }
        if !info.is_message() {
            return Err(FieldPathError::invalid_syntax(
                format!("field '{name}' of kind {} has no sub-fields", info.kind),
                cursor.position(),
            ));
        }

        if !field.is_set() && !absent && !info.flags.nullable {
            return Err(FieldPathError::invalid_field(
                format!("message field '{name}' is not set"),
                token.start,
            ));
        }
        let absent = absent || !field.is_set();
        let nested = field.message(self.metadata, token.start)?;
        Ok(match self.resolve(cursor, nested, absent)? {
            Resolved::Skip => Resolved::Skip,
            Resolved::Assign(child, value) => {
                selector.traversal = Some(Traversal::Field(Box::new(child)));
                Resolved::Assign(selector, value)
            }
            Resolved::All(nested) => {
                let value = if absent {
                    UpdateValue::Value(ValueExpr::Null)
                } else {
                    UpdateValue::Update(self.enumerate(nested, token.start)?)
                };
                Resolved::Assign(selector, value)
            }
        })
    }

    /// `map.key` (and `map.key.sub_path` for message values); the key must exist
    fn resolve_map_entry(
        &self,
        cursor: &mut PathCursor<'_>,
        field: FieldCursor<'a>,
        mut selector: FieldSelector,
    ) -> Result<Resolved<'a>> {
        let info = field.info;
        let token = cursor.next()?;
        let key_kind = map_key_kind(info, token.start)?;
        let key = key_kind
            .parse_key(&token.value, cursor.source(&token))
            .ok_or_else(|| {
                FieldPathError::invalid_syntax(
                    format!("expected {key_kind} key for map '{}', found {}", info.name, token.value),
                    token.start,
                )
            })?;
        cursor.enter(token.start)?;

        let live_key = to_map_key(&key).ok_or_else(|| {
            FieldPathError::internal(format!("{key} is not a valid map key"), token.start)
        })?;
        let Some(entry) = field.map_entry(&live_key, token.start)? else {
            return Err(FieldPathError::invalid_field(
                format!("key {key} not found in map '{}'", info.name),
                token.start,
            ));
        };

        let mut key_expr = MapKeyExpr::new(MapKeyValue::Value(key));
        if cursor.at_end() {
            let value = self.extract_element(info, entry, token.start)?;
            selector.traversal = Some(Traversal::MapKey(Box::new(key_expr)));
            return Ok(Resolved::Assign(selector, value));
        }
        cursor.expect_period("map key")?;
        if !info.is_message() {
            return Err(FieldPathError::invalid_syntax(
                format!("values of map '{}' have no sub-fields", info.name),
                cursor.position(),
            ));
        }

        let Value::Message(entry) = entry else {
            return Err(value_mismatch(info, entry, token.start));
        };
        let nested = MessageCursor::new(
            message_type(self.metadata, info, token.start)?,
            Some(entry),
            token.start,
        )?;
        Ok(match self.resolve(cursor, nested, false)? {
            Resolved::Skip => Resolved::Skip,
            Resolved::Assign(child, value) => {
                key_expr.traversal = Some(Traversal::Field(Box::new(child)));
                selector.traversal = Some(Traversal::MapKey(Box::new(key_expr)));
                Resolved::Assign(selector, value)
            }
            Resolved::All(nested) => {
                selector.traversal = Some(Traversal::MapKey(Box::new(key_expr)));
                Resolved::Assign(
                    selector,
                    UpdateValue::Update(self.enumerate(nested, token.start)?),
                )
            }
        })
    }

    /// Value assigned by a path ending at `field`
    fn terminal(&self, field: FieldCursor<'a>, absent: bool, position: usize) -> Result<UpdateValue> {
        if absent {
            return Ok(UpdateValue::Value(ValueExpr::Null));
        }
        match field.value {
            Some(value) => self.extract(field.info, value, position),
            None => self.unset(field.info, position)?.ok_or_else(|| {
                FieldPathError::invalid_field(
                    format!("message field '{}' is not set", field.info.name),
                    position,
                )
            }),
        }
    }

    /// Value for an unset field; `None` when it has no meaningful empty value
    fn unset(&self, info: &FieldInfo, position: usize) -> Result<Option<UpdateValue>> {
        if info.kind == Kind::Group {
            return Err(unsupported(info, position));
        }
        if info.flags.nullable {
            return Ok(Some(UpdateValue::Value(ValueExpr::Null)));
        }
        Ok(match info.cardinality {
            Cardinality::Repeated if info.is_message() && self.well_known(info).is_none() => {
                Some(UpdateValue::ArrayUpdate(ArrayUpdateExpr::default()))
            }
            Cardinality::Repeated => Some(UpdateValue::Array(ArrayExpr::default())),
            Cardinality::Map => Some(UpdateValue::Map(MapValueExpr::default())),
            Cardinality::Singular => info.kind.default_value().map(UpdateValue::Value),
        })
    }

    /// Extract the full value of a set field
    fn extract(&self, info: &FieldInfo, value: &'a Value, position: usize) -> Result<UpdateValue> {
        match info.cardinality {
            Cardinality::Singular => self.extract_element(info, value, position),
            Cardinality::Repeated => {
                let Value::List(items) = value else {
                    return Err(value_mismatch(info, value, position));
                };
                self.extract_list(info, items, position)
            }
            Cardinality::Map => {
                let Value::Map(entries) = value else {
                    return Err(value_mismatch(info, value, position));
                };
                let key_kind = map_key_kind(info, position)?;
                let mut map = MapValueExpr::default();
                for (key, entry) in entries {
                    let key = key_kind.extract_key(key).ok_or_else(|| {
                        FieldPathError::internal(
                            format!("key {key} of map '{}' is not a {key_kind}", info.name),
                            position,
                        )
                    })?;
                    let value = self.extract_element(info, entry, position)?;
                    map.entries.push(MapEntryExpr { key, value });
                }
                Ok(UpdateValue::Map(map))
            }
        }
    }

    /// List elements; elements of the wrong shape become `None`
    fn extract_list(&self, info: &FieldInfo, items: &'a [Value], position: usize) -> Result<UpdateValue> {
        if !info.is_message() {
            return Ok(UpdateValue::Array(ArrayExpr {
                values: items.iter().map(|item| info.kind.extract(item)).collect(),
            }));
        }
        if let Some(time) = self.well_known(info) {
            return Ok(UpdateValue::Array(ArrayExpr {
                values: items
                    .iter()
                    .map(|item| item.as_message().and_then(|m| time.extract(m)))
                    .collect(),
            }));
        }

        let element_info = message_type(self.metadata, info, position)?;
        let mut array = ArrayUpdateExpr::default();
        for item in items {
            let element = match item {
                Value::Message(message) if message.type_name() == element_info.name => {
                    let cursor = MessageCursor::new(element_info, Some(message), position)?;
                    Some(self.enumerate(cursor, position)?)
                }
                _ => None,
            };
            array.values.push(element);
        }
        Ok(UpdateValue::ArrayUpdate(array))
    }

    /// A single scalar, time value or message (singular field or map value)
    fn extract_element(&self, info: &FieldInfo, value: &'a Value, position: usize) -> Result<UpdateValue> {
        if info.kind == Kind::Group {
            return Err(unsupported(info, position));
        }
        if !info.is_message() {
            return info
                .kind
                .extract(value)
                .map(UpdateValue::Value)
                .ok_or_else(|| value_mismatch(info, value, position));
        }

        let Value::Message(message) = value else {
            return Err(value_mismatch(info, value, position));
        };
        if let Some(time) = self.well_known(info) {
            return time.extract(message).map(UpdateValue::Value).ok_or_else(|| {
                FieldPathError::internal(
                    format!("field '{}' holds an out of range {:?}", info.name, time),
                    position,
                )
            });
        }
        let cursor = MessageCursor::new(
            message_type(self.metadata, info, position)?,
            Some(message),
            position,
        )?;
        Ok(UpdateValue::Update(self.enumerate(cursor, position)?))
    }

    /// Every updatable field of a message
    ///
    /// Unset oneof members are skipped, as are unset fields with neither a
    /// null nor an empty default.
    fn enumerate(&self, message: MessageCursor<'a>, position: usize) -> Result<UpdateExpr> {
        let mut expr = UpdateExpr::default();
        for field in message.fields() {
            let info = field.info;
            if !info.is_updatable() {
                continue;
            }
            let value = match field.value {
                Some(value) => self.extract(info, value, position)?,
                None if info.flags.is_oneof => continue,
                None => match self.unset(info, position)? {
                    Some(value) => value,
                    None => continue,
                },
            };
            expr.elements.push(UpdateElement {
                field: FieldSelector::new(info.message.clone(), info.name.clone(), info.complexity),
                value,
            });
        }
        Ok(expr)
    }

    fn well_known(&self, info: &FieldInfo) -> Option<WellKnownTime> {
        info.message_type
            .as_deref()
            .and_then(WellKnownTime::from_type_name)
    }
}

fn map_key_kind(info: &FieldInfo, position: usize) -> Result<Kind> {
    info.map_key.ok_or_else(|| {
        FieldPathError::internal(format!("map field '{}' has no key kind", info.name), position)
    })
}

fn unsupported(info: &FieldInfo, position: usize) -> FieldPathError {
    FieldPathError::internal(
        format!("field '{}' has unsupported kind {}", info.name, info.kind),
        position,
    )
}
