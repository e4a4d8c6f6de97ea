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

//! Schema introspection
//!
//! Walks a root message type and every message reachable from it, deriving
//! per-field metadata once. The result is immutable and shared behind an
//! `Arc` by the cache.

use crate::core::{FieldPathError, Result};
use crate::model::{
    Cardinality, FieldBehavior, FieldDescriptor, Kind, MessageDescriptor, SchemaProvider,
};
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// Access and presence flags derived from behavior annotations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    pub input_only: bool,
    pub output_only: bool,
    pub immutable: bool,
    pub required: bool,
    pub nullable: bool,
    pub is_oneof: bool,
}

/// Derived, immutable metadata for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    /// Full name of the declaring message
    pub message: String,
    /// Element kind for lists, value kind for maps
    pub kind: Kind,
    pub cardinality: Cardinality,
    /// Element/value message type when `kind` is a message
    pub message_type: Option<String>,
    pub enum_type: Option<String>,
    pub map_key: Option<Kind>,
    pub oneof: Option<String>,
    pub flags: FieldFlags,
    pub filtering_forbidden: bool,
    pub ordering_forbidden: bool,
    /// Positive weight, 1 unless annotated
    pub complexity: u32,
}

impl FieldInfo {
    /// Derive metadata from a declaration
    pub fn from_descriptor(message: &str, field: &FieldDescriptor) -> Self {
        let required = field.has_behavior(FieldBehavior::Required);
        let immutable = field.has_behavior(FieldBehavior::Immutable);
        let singular = field.cardinality == Cardinality::Singular;
        let optional_scalar = singular
            && !field.kind.is_message()
            && (field.has_behavior(FieldBehavior::Optional) || field.proto3_optional);
        let nullable = !required
            && !immutable
            && (field.nullable || field.kind == Kind::Message || optional_scalar);

        let query = field.query.unwrap_or_default();
        Self {
            name: field.name.clone(),
            message: message.to_string(),
            kind: field.kind,
            cardinality: field.cardinality,
            message_type: field.message_type.clone(),
            enum_type: field.enum_type.clone(),
            map_key: field.map_key,
            oneof: field.oneof.clone(),
            flags: FieldFlags {
                input_only: field.has_behavior(FieldBehavior::InputOnly),
                output_only: field.has_behavior(FieldBehavior::OutputOnly),
                immutable,
                required,
                nullable,
                is_oneof: field.oneof.is_some(),
            },
            filtering_forbidden: query.filtering_forbidden,
            ordering_forbidden: query.ordering_forbidden,
            complexity: query.weight.max(1),
        }
    }

    pub fn is_list(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    pub fn is_map(&self) -> bool {
        self.cardinality == Cardinality::Map
    }

    pub fn is_singular(&self) -> bool {
        self.cardinality == Cardinality::Singular
    }

    /// Element (or map value) is a message
    pub fn is_message(&self) -> bool {
        self.kind == Kind::Message
    }

    /// May appear in a read mask
    pub fn is_selectable(&self) -> bool {
        !self.flags.input_only
    }

    /// May appear in an update mask
    pub fn is_updatable(&self) -> bool {
        !self.flags.immutable && !self.flags.output_only
    }
}

/// Fields of one message type, declared fields first, then oneof members
#[derive(Debug, Clone, Default)]
pub struct MessageInfo {
    pub name: String,
    fields: IndexMap<String, Arc<FieldInfo>>,
    oneofs: IndexMap<String, SmallVec<[String; 4]>>,
}

impl MessageInfo {
    fn from_descriptor(message: &MessageDescriptor) -> Self {
        let mut info = MessageInfo {
            name: message.name.clone(),
            ..Default::default()
        };
        for field in message.all_fields() {
            info.fields.insert(
                field.name.clone(),
                Arc::new(FieldInfo::from_descriptor(&message.name, field)),
            );
        }
        for oneof in &message.oneofs {
            info.oneofs.insert(
                oneof.name.clone(),
                oneof.fields.iter().map(|f| f.name.clone()).collect(),
            );
        }
        info
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldInfo>> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldInfo>> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Oneof names with their member field names
    pub fn oneofs(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.oneofs
            .iter()
            .map(|(name, members)| (name.as_str(), members.as_slice()))
    }
}

/// Field metadata for a root type and everything reachable from it
#[derive(Debug, Clone)]
pub struct SchemaMetadata {
    root: String,
    messages: IndexMap<String, MessageInfo>,
}

impl SchemaMetadata {
    /// Full name of the root message type
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// The root message
    pub fn root(&self) -> Option<&MessageInfo> {
        self.messages.get(&self.root)
    }

    pub fn message(&self, name: &str) -> Option<&MessageInfo> {
        self.messages.get(name)
    }

    pub fn field(&self, message: &str, name: &str) -> Option<&Arc<FieldInfo>> {
        self.messages.get(message)?.field(name)
    }

    /// Reachable message types in discovery order, root first
    pub fn message_names(&self) -> impl Iterator<Item = &str> {
        self.messages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Introspect `root` and every message type reachable from it
///
/// Recursive schemas terminate through a visited set keyed by type name.
pub fn introspect(provider: &dyn SchemaProvider, root: &str) -> Result<SchemaMetadata> {
    let mut visited = FxHashSet::default();
    let mut pending = vec![root.to_string()];
    let mut messages = IndexMap::new();
    visited.insert(root.to_string());

    while let Some(name) = pending.pop() {
        let descriptor = provider.message(&name).ok_or_else(|| {
            FieldPathError::internal(format!("unknown message type '{name}'"), 0)
        })?;
        let info = MessageInfo::from_descriptor(descriptor);
        log::trace!("introspected {} ({} fields)", name, info.len());

        for field in info.fields() {
            if !field.is_message() {
                continue;
            }
            let Some(nested) = &field.message_type else {
                return Err(FieldPathError::internal(
                    format!("message field '{}.{}' has no message type", name, field.name),
                    0,
                ));
            };
            if visited.insert(nested.clone()) {
                pending.push(nested.clone());
            }
        }
        messages.insert(name, info);
    }

    Ok(SchemaMetadata {
        root: root.to_string(),
        messages,
    })
}
