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

//! Visitor pattern for select tree traversal

use super::expression::{FieldSelector, MapKeyExpr, MapSelectKeys, MessageSelect, Traversal};
use smallvec::SmallVec;

/// Trait for visiting select tree nodes
///
/// Every method defaults to walking its children, so implementors only
/// override the nodes they care about.
pub trait SelectVisitor: Sized {
    /// Visit a message selection
    fn visit_message(&mut self, select: &MessageSelect) {
        walk_message(self, select)
    }

    /// Visit a selected field
    fn visit_field(&mut self, field: &FieldSelector) {
        walk_field(self, field)
    }

    /// Visit the selected keys of a map
    fn visit_map_keys(&mut self, keys: &MapSelectKeys) {
        walk_map_keys(self, keys)
    }

    /// Visit one selected map key
    fn visit_map_key(&mut self, key: &MapKeyExpr) {
        walk_map_key(self, key)
    }
}

pub fn walk_message<V: SelectVisitor>(visitor: &mut V, select: &MessageSelect) {
    for field in &select.fields {
        visitor.visit_field(field);
    }
}

pub fn walk_field<V: SelectVisitor>(visitor: &mut V, field: &FieldSelector) {
    if let Some(traversal) = &field.traversal {
        walk_traversal(visitor, traversal);
    }
}

pub fn walk_map_keys<V: SelectVisitor>(visitor: &mut V, keys: &MapSelectKeys) {
    for key in &keys.keys {
        visitor.visit_map_key(key);
    }
}

pub fn walk_map_key<V: SelectVisitor>(visitor: &mut V, key: &MapKeyExpr) {
    if let Some(traversal) = &key.traversal {
        walk_traversal(visitor, traversal);
    }
}

pub fn walk_traversal<V: SelectVisitor>(visitor: &mut V, traversal: &Traversal) {
    match traversal {
        Traversal::Field(next) => visitor.visit_field(next),
        Traversal::Message(select) => visitor.visit_message(select),
        Traversal::MapKeys(keys) => visitor.visit_map_keys(keys),
        Traversal::MapKey(key) => visitor.visit_map_key(key),
    }
}

/// Collects one dotted path per leaf
#[derive(Debug, Default)]
pub struct PathCollector {
    stack: SmallVec<[String; 8]>,
    paths: Vec<String>,
}

impl PathCollector {
    pub fn into_paths(self) -> Vec<String> {
        self.paths
    }

    fn emit(&mut self) {
        self.paths.push(self.stack.join("."));
    }

    fn descend(&mut self, segment: String, traversal: Option<&Traversal>) {
        self.stack.push(segment);
        match traversal {
            None => self.emit(),
            Some(Traversal::Message(select)) if select.is_empty() => self.emit(),
            Some(Traversal::MapKeys(keys)) if keys.is_empty() => self.emit(),
            Some(traversal) => walk_traversal(self, traversal),
        }
        self.stack.pop();
    }
}

impl SelectVisitor for PathCollector {
    fn visit_field(&mut self, field: &FieldSelector) {
        self.descend(field.field.clone(), field.traversal.as_ref());
    }

    fn visit_map_key(&mut self, key: &MapKeyExpr) {
        self.descend(key.key.to_string(), key.traversal.as_ref());
    }
}

/// Sums field complexities over a tree
#[derive(Debug, Default)]
pub struct ComplexityCounter {
    pub total: u64,
}

impl SelectVisitor for ComplexityCounter {
    fn visit_field(&mut self, field: &FieldSelector) {
        self.total += u64::from(field.complexity);
        walk_field(self, field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MapKeyValue, ValueExpr};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_paths_cover_every_leaf() {
        let select = MessageSelect::new(vec![
            FieldSelector::new("m", "str", 1),
            FieldSelector::new("m", "sub", 2).with_traversal(Traversal::Message(
                MessageSelect::new(vec![
                    FieldSelector::new("s", "name", 1),
                    FieldSelector::new("s", "i32", 1),
                ]),
            )),
            FieldSelector::new("m", "labels", 1).with_traversal(Traversal::MapKeys(
                MapSelectKeys {
                    keys: vec![
                        MapKeyExpr::new(MapKeyValue::Wildcard),
                        MapKeyExpr::new(MapKeyValue::Value(ValueExpr::Int64(7))),
                    ],
                },
            )),
        ]);

        assert_eq!(
            select.paths(),
            vec!["str", "sub.name", "sub.i32", "labels.*", "labels.7"]
        );
        assert_eq!(select.total_complexity(), 6);
    }
}
