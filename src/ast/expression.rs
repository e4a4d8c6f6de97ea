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

//! Expression node model shared by the select, update and order-by parsers
//!
//! Trees are exclusively owned: dropping a root releases every node below
//! it depth-first. No node is shared between two trees.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use std::fmt;

/// A literal or extracted scalar value
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// Explicit null marker
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Enum ordinal
    Enum(i32),
    Timestamp(DateTime<Utc>),
    Duration(TimeDelta),
}

impl ValueExpr {
    pub fn is_null(&self) -> bool {
        matches!(self, ValueExpr::Null)
    }
}

impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueExpr::Null => f.write_str("null"),
            ValueExpr::Bool(v) => write!(f, "{v}"),
            ValueExpr::Int32(v) => write!(f, "{v}"),
            ValueExpr::Int64(v) => write!(f, "{v}"),
            ValueExpr::Uint32(v) => write!(f, "{v}u"),
            ValueExpr::Uint64(v) => write!(f, "{v}u"),
            ValueExpr::Float(v) => write!(f, "{v}"),
            ValueExpr::Double(v) => write!(f, "{v}"),
            ValueExpr::String(v) => write_path_key(f, v),
            ValueExpr::Bytes(v) => write!(f, "b{}", String::from_utf8_lossy(v).escape_debug()),
            ValueExpr::Enum(v) => write!(f, "{v}"),
            ValueExpr::Timestamp(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            ValueExpr::Duration(v) => write!(f, "{v}"),
        }
    }
}

/// Strings that scan as identifiers are written bare, anything else quoted
fn write_path_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    let mut chars = key.chars();
    let bare = chars
        .next()
        .is_some_and(|c| unicode_xid::UnicodeXID::is_xid_start(c) || c == '_')
        && chars.all(unicode_xid::UnicodeXID::is_xid_continue)
        && !matches!(key, "true" | "false");
    if bare {
        return f.write_str(key);
    }
    f.write_str("\"")?;
    for c in key.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

/// One schema-resolved field, optionally continuing into a child node
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelector {
    /// Full name of the message declaring the field
    pub message: String,
    pub field: String,
    pub complexity: u32,
    /// `None` marks a leaf
    pub traversal: Option<Traversal>,
}

/// What follows a field in a path
#[derive(Debug, Clone, PartialEq)]
pub enum Traversal {
    /// Next segment of a single chain (update and order-by paths)
    Field(Box<FieldSelector>),
    /// Consolidated sub-selection (select paths)
    Message(MessageSelect),
    /// Selected keys of a map (select paths)
    MapKeys(MapSelectKeys),
    /// A single addressed map key (update paths)
    MapKey(Box<MapKeyExpr>),
}

impl FieldSelector {
    pub fn new(message: impl Into<String>, field: impl Into<String>, complexity: u32) -> Self {
        Self {
            message: message.into(),
            field: field.into(),
            complexity,
            traversal: None,
        }
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = Some(traversal);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.traversal.is_none()
    }

    /// Next field of a single chain, if any
    pub fn next(&self) -> Option<&FieldSelector> {
        match &self.traversal {
            Some(Traversal::Field(next)) => Some(next),
            Some(Traversal::MapKey(key)) => match &key.traversal {
                Some(Traversal::Field(next)) => Some(next),
                _ => None,
            },
            _ => None,
        }
    }

    /// Last field of a single chain
    pub fn last(&self) -> &FieldSelector {
        let mut current = self;
        while let Some(next) = current.next() {
            current = next;
        }
        current
    }

    /// Sum of complexities of this field and everything below it
    pub fn total_complexity(&self) -> u64 {
        u64::from(self.complexity)
            + self
                .traversal
                .as_ref()
                .map_or(0, Traversal::total_complexity)
    }
}

impl Traversal {
    pub fn total_complexity(&self) -> u64 {
        match self {
            Traversal::Field(next) => next.total_complexity(),
            Traversal::Message(select) => select.total_complexity(),
            Traversal::MapKeys(keys) => keys.keys.iter().map(MapKeyExpr::total_complexity).sum(),
            Traversal::MapKey(key) => key.total_complexity(),
        }
    }
}

/// Writes single chains as dotted paths (`sub.map_i32_str.653`)
impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        match &self.traversal {
            Some(Traversal::Field(next)) => write!(f, ".{next}"),
            Some(Traversal::MapKey(key)) => write!(f, ".{key}"),
            _ => Ok(()),
        }
    }
}

/// Ordered set of selected fields; names are unique
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageSelect {
    pub fields: Vec<FieldSelector>,
}

impl MessageSelect {
    pub fn new(fields: Vec<FieldSelector>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSelector> {
        self.fields.iter().find(|f| f.field == name)
    }

    /// Selected field names in first-seen order
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.field.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSelector> {
        self.fields.iter()
    }

    /// Canonical field-mask paths, one per leaf
    pub fn paths(&self) -> Vec<String> {
        let mut collector = super::visitor::PathCollector::default();
        super::visitor::walk_message(&mut collector, self);
        collector.into_paths()
    }

    pub fn total_complexity(&self) -> u64 {
        let mut counter = super::visitor::ComplexityCounter::default();
        super::visitor::walk_message(&mut counter, self);
        counter.total
    }
}

impl<'a> IntoIterator for &'a MessageSelect {
    type Item = &'a FieldSelector;
    type IntoIter = std::slice::Iter<'a, FieldSelector>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// A map key in a path
#[derive(Debug, Clone, PartialEq)]
pub enum MapKeyValue {
    Wildcard,
    Value(ValueExpr),
}

impl fmt::Display for MapKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKeyValue::Wildcard => f.write_str("*"),
            MapKeyValue::Value(v) => write!(f, "{v}"),
        }
    }
}

/// One map key plus what is selected inside its value
#[derive(Debug, Clone, PartialEq)]
pub struct MapKeyExpr {
    pub key: MapKeyValue,
    pub traversal: Option<Traversal>,
}

impl MapKeyExpr {
    pub fn new(key: MapKeyValue) -> Self {
        Self {
            key,
            traversal: None,
        }
    }

    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = Some(traversal);
        self
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.key, MapKeyValue::Wildcard)
    }

    pub fn total_complexity(&self) -> u64 {
        self.traversal
            .as_ref()
            .map_or(0, Traversal::total_complexity)
    }
}

impl fmt::Display for MapKeyExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(Traversal::Field(next)) = &self.traversal {
            write!(f, ".{next}")?;
        }
        Ok(())
    }
}

/// Selected keys of a map field; keys are unique
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapSelectKeys {
    pub keys: Vec<MapKeyExpr>,
}

impl MapSelectKeys {
    pub fn get(&self, key: &MapKeyValue) -> Option<&MapKeyExpr> {
        self.keys.iter().find(|k| &k.key == key)
    }

    pub fn wildcard(&self) -> Option<&MapKeyExpr> {
        self.keys.iter().find(|k| k.is_wildcard())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Elements of a repeated scalar field; `None` marks an invalid element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayExpr {
    pub values: Vec<Option<ValueExpr>>,
}

/// Elements of a repeated message field; `None` marks an invalid element
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayUpdateExpr {
    pub values: Vec<Option<UpdateExpr>>,
}

/// One live map entry
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntryExpr {
    pub key: ValueExpr,
    /// A scalar value or, for message values, a full-field update
    pub value: UpdateValue,
}

/// Every live entry of a map field, in iteration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapValueExpr {
    pub entries: Vec<MapEntryExpr>,
}

impl MapValueExpr {
    pub fn get(&self, key: &ValueExpr) -> Option<&UpdateValue> {
        self.entries.iter().find(|e| &e.key == key).map(|e| &e.value)
    }
}

/// Value assigned by one update element
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Value(ValueExpr),
    Array(ArrayExpr),
    ArrayUpdate(ArrayUpdateExpr),
    Update(UpdateExpr),
    Map(MapValueExpr),
}

impl UpdateValue {
    pub fn as_value(&self) -> Option<&ValueExpr> {
        match self {
            UpdateValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_update(&self) -> Option<&UpdateExpr> {
        match self {
            UpdateValue::Update(u) => Some(u),
            _ => None,
        }
    }

    pub fn total_complexity(&self) -> u64 {
        match self {
            UpdateValue::Value(_) | UpdateValue::Array(_) => 0,
            UpdateValue::ArrayUpdate(array) => array
                .values
                .iter()
                .flatten()
                .map(UpdateExpr::total_complexity)
                .sum(),
            UpdateValue::Update(update) => update.total_complexity(),
            UpdateValue::Map(map) => map
                .entries
                .iter()
                .map(|e| e.value.total_complexity())
                .sum(),
        }
    }
}

impl From<ValueExpr> for UpdateValue {
    fn from(v: ValueExpr) -> Self {
        UpdateValue::Value(v)
    }
}

/// A field path paired with the value it assigns
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateElement {
    pub field: FieldSelector,
    pub value: UpdateValue,
}

/// Ordered list of update assignments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateExpr {
    pub elements: Vec<UpdateElement>,
}

impl UpdateExpr {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UpdateElement> {
        self.elements.iter()
    }

    /// Element whose dotted path renders as `path`
    pub fn get(&self, path: &str) -> Option<&UpdateElement> {
        self.elements.iter().find(|e| e.field.to_string() == path)
    }

    pub fn total_complexity(&self) -> u64 {
        self.elements
            .iter()
            .map(|e| e.field.total_complexity() + e.value.total_complexity())
            .sum()
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByFieldExpr {
    pub field: FieldSelector,
    pub order: SortOrder,
}

/// Sort keys in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderByExpr {
    pub fields: Vec<OrderByFieldExpr>,
}

impl OrderByExpr {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OrderByFieldExpr> {
        self.fields.iter()
    }

    pub fn total_complexity(&self) -> u64 {
        self.fields.iter().map(|f| f.field.total_complexity()).sum()
    }
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", key.field, key.order)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chain(names: &[&str]) -> FieldSelector {
        let mut iter = names.iter().rev();
        let mut node = FieldSelector::new("m", *iter.next().unwrap(), 1);
        for name in iter {
            node = FieldSelector::new("m", *name, 1).with_traversal(Traversal::Field(Box::new(node)));
        }
        node
    }

    #[test]
    fn test_chain_display_and_last() {
        let selector = chain(&["sub", "point", "x"]);
        assert_eq!(selector.to_string(), "sub.point.x");
        assert_eq!(selector.last().field, "x");
        assert_eq!(selector.total_complexity(), 3);
    }

    #[test]
    fn test_map_key_chain_display() {
        let selector = FieldSelector::new("m", "labels", 1).with_traversal(Traversal::MapKey(
            Box::new(MapKeyExpr::new(MapKeyValue::Value(ValueExpr::String("a b".into())))),
        ));
        assert_eq!(selector.to_string(), "labels.\"a b\"");
        assert!(selector.last().is_leaf());
    }

    #[test]
    fn test_order_by_display() {
        let expr = OrderByExpr {
            fields: vec![
                OrderByFieldExpr {
                    field: chain(&["a", "b"]),
                    order: SortOrder::Asc,
                },
                OrderByFieldExpr {
                    field: chain(&["c"]),
                    order: SortOrder::Desc,
                },
            ],
        };
        assert_eq!(expr.to_string(), "a.b asc, c desc");
        assert_eq!(expr.total_complexity(), 3);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ValueExpr::Null.to_string(), "null");
        assert_eq!(ValueExpr::String("key".into()).to_string(), "key");
        assert_eq!(ValueExpr::String("true".into()).to_string(), "\"true\"");
        assert_eq!(ValueExpr::Uint64(7).to_string(), "7u");
    }
}
