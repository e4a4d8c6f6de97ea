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

//! Index-based node arena for building select trees
//!
//! The select parser merges overlapping paths in place, which needs
//! mutable access to nodes deep inside a partially built tree. Nodes live
//! in a flat `Vec` and link to each other by [`NodeId`]; once a parse
//! succeeds the tree is materialized into owned [`MessageSelect`] nodes and
//! the arena is cleared. Clearing keeps the allocation for the next parse.

use super::expression::{FieldSelector, MapKeyExpr, MapKeyValue, MapSelectKeys, MessageSelect, Traversal};
use crate::core::{FieldPathError, Result};
use rustc_hash::FxHashMap;

/// Index of a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Arena-resident node
#[derive(Debug, Clone)]
pub enum ArenaNode {
    Field {
        message: String,
        field: String,
        complexity: u32,
        traversal: Option<NodeId>,
    },
    Message {
        fields: Vec<NodeId>,
        index: FxHashMap<String, NodeId>,
    },
    MapKeys {
        keys: Vec<NodeId>,
    },
    MapKey {
        key: MapKeyValue,
        traversal: Option<NodeId>,
    },
}

/// Arena allocator for select tree nodes
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Allocate a new node in the arena
    ///
    /// Fails once the arena holds more nodes than a `NodeId` can address.
    pub fn alloc(&mut self, node: ArenaNode) -> Result<NodeId> {
        let index = u32::try_from(self.nodes.len()).map_err(|_| {
            FieldPathError::internal(format!("arena is full at {} nodes", self.nodes.len()), 0)
        })?;
        self.nodes.push(node);
        Ok(NodeId(index))
    }

    /// Allocate an empty message selection
    pub fn alloc_message(&mut self) -> Result<NodeId> {
        self.alloc(ArenaNode::Message {
            fields: Vec::new(),
            index: FxHashMap::default(),
        })
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&ArenaNode> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ArenaNode> {
        self.nodes.get_mut(id.index())
    }

    /// Release every node, keeping the allocation
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Field of a message node by name
    pub fn message_field(&self, message: NodeId, name: &str) -> Result<Option<NodeId>> {
        match self.get(message) {
            Some(ArenaNode::Message { index, .. }) => Ok(index.get(name).copied()),
            _ => Err(mismatch(message, "message")),
        }
    }

    /// Append a field to a message node
    pub fn push_field(&mut self, message: NodeId, name: &str, field: NodeId) -> Result<()> {
        match self.get_mut(message) {
            Some(ArenaNode::Message { fields, index }) => {
                fields.push(field);
                index.insert(name.to_string(), field);
                Ok(())
            }
            _ => Err(mismatch(message, "message")),
        }
    }

    /// Key of a map-keys node equal to `key`
    pub fn map_key(&self, keys: NodeId, key: &MapKeyValue) -> Result<Option<NodeId>> {
        let Some(ArenaNode::MapKeys { keys: ids }) = self.get(keys) else {
            return Err(mismatch(keys, "map keys"));
        };
        for id in ids {
            if let Some(ArenaNode::MapKey { key: existing, .. }) = self.get(*id) {
                if existing == key {
                    return Ok(Some(*id));
                }
            }
        }
        Ok(None)
    }

    /// Append a key to a map-keys node
    pub fn push_map_key(&mut self, keys: NodeId, key: NodeId) -> Result<()> {
        match self.get_mut(keys) {
            Some(ArenaNode::MapKeys { keys: ids }) => {
                ids.push(key);
                Ok(())
            }
            _ => Err(mismatch(keys, "map keys")),
        }
    }

    /// Traversal slot of a field or map-key node
    pub fn traversal(&self, id: NodeId) -> Result<Option<NodeId>> {
        match self.get(id) {
            Some(ArenaNode::Field { traversal, .. } | ArenaNode::MapKey { traversal, .. }) => {
                Ok(*traversal)
            }
            _ => Err(mismatch(id, "field or map key")),
        }
    }

    /// Set the traversal slot of a field or map-key node
    pub fn set_traversal(&mut self, id: NodeId, child: NodeId) -> Result<()> {
        match self.get_mut(id) {
            Some(ArenaNode::Field { traversal, .. } | ArenaNode::MapKey { traversal, .. }) => {
                *traversal = Some(child);
                Ok(())
            }
            _ => Err(mismatch(id, "field or map key")),
        }
    }

    /// Build an owned tree from a message node
    pub fn materialize(&self, root: NodeId) -> Result<MessageSelect> {
        match self.get(root) {
            Some(ArenaNode::Message { fields, .. }) => Ok(MessageSelect::new(
                fields
                    .iter()
                    .map(|id| self.materialize_field(*id))
                    .collect::<Result<_>>()?,
            )),
            _ => Err(mismatch(root, "message")),
        }
    }

    fn materialize_field(&self, id: NodeId) -> Result<FieldSelector> {
        match self.get(id) {
            Some(ArenaNode::Field {
                message,
                field,
                complexity,
                traversal,
            }) => {
                let mut selector = FieldSelector::new(message.clone(), field.clone(), *complexity);
                if let Some(child) = traversal {
                    selector.traversal = Some(self.materialize_traversal(*child)?);
                }
                Ok(selector)
            }
            _ => Err(mismatch(id, "field")),
        }
    }

    fn materialize_traversal(&self, id: NodeId) -> Result<Traversal> {
        match self.get(id) {
            Some(ArenaNode::Message { .. }) => Ok(Traversal::Message(self.materialize(id)?)),
            Some(ArenaNode::Field { .. }) => {
                Ok(Traversal::Field(Box::new(self.materialize_field(id)?)))
            }
            Some(ArenaNode::MapKeys { keys }) => Ok(Traversal::MapKeys(MapSelectKeys {
                keys: keys
                    .iter()
                    .map(|key| self.materialize_map_key(*key))
                    .collect::<Result<_>>()?,
            })),
            Some(ArenaNode::MapKey { .. }) => {
                Ok(Traversal::MapKey(Box::new(self.materialize_map_key(id)?)))
            }
            None => Err(mismatch(id, "node")),
        }
    }

    fn materialize_map_key(&self, id: NodeId) -> Result<MapKeyExpr> {
        match self.get(id) {
            Some(ArenaNode::MapKey { key, traversal }) => {
                let mut expr = MapKeyExpr::new(key.clone());
                if let Some(child) = traversal {
                    expr.traversal = Some(self.materialize_traversal(*child)?);
                }
                Ok(expr)
            }
            _ => Err(mismatch(id, "map key")),
        }
    }
}

fn mismatch(id: NodeId, expected: &str) -> FieldPathError {
    FieldPathError::internal(format!("arena node {} is not a {expected}", id.index()), 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ValueExpr;
    use crate::core::ErrorKind;

    fn field(arena: &mut NodeArena, name: &str) -> NodeId {
        arena
            .alloc(ArenaNode::Field {
                message: "test.M".into(),
                field: name.into(),
                complexity: 1,
                traversal: None,
            })
            .unwrap()
    }

    #[test]
    fn test_build_and_materialize() {
        let mut arena = NodeArena::new();
        let root = arena.alloc_message().unwrap();
        let a = field(&mut arena, "a");
        arena.push_field(root, "a", a).unwrap();
        let keys = arena.alloc(ArenaNode::MapKeys { keys: vec![] }).unwrap();
        arena.set_traversal(a, keys).unwrap();
        let key = arena
            .alloc(ArenaNode::MapKey {
                key: MapKeyValue::Value(ValueExpr::String("k".into())),
                traversal: None,
            })
            .unwrap();
        arena.push_map_key(keys, key).unwrap();

        assert_eq!(arena.message_field(root, "a").unwrap(), Some(a));
        assert_eq!(
            arena
                .map_key(keys, &MapKeyValue::Value(ValueExpr::String("k".into())))
                .unwrap(),
            Some(key)
        );
        assert_eq!(arena.map_key(keys, &MapKeyValue::Wildcard).unwrap(), None);

        let select = arena.materialize(root).unwrap();
        assert_eq!(select.paths(), vec!["a.k"]);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut arena = NodeArena::with_capacity(4);
        for name in ["a", "b", "c"] {
            field(&mut arena, name);
        }
        let capacity = arena.capacity();
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), capacity);
    }

    #[test]
    fn test_wrong_node_type_is_internal_error() {
        let mut arena = NodeArena::new();
        let a = field(&mut arena, "a");
        let err = arena.materialize(a).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalError);
    }

    #[test]
    fn test_ids_follow_allocation_order() {
        let mut arena = NodeArena::new();
        let root = arena.alloc_message().unwrap();
        let a = field(&mut arena, "a");
        assert_eq!(root.index(), 0);
        assert_eq!(a.index(), 1);
        assert_eq!(arena.len(), 2);
    }
}
