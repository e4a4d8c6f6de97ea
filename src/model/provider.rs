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

//! Schema provider trait and the in-memory registry

use super::descriptor::{FieldDescriptor, Kind, MessageDescriptor};
use crate::core::{FieldPathError, Result};
use indexmap::IndexMap;
use std::sync::Arc;

/// Full name of the well-known timestamp message
pub const TIMESTAMP_TYPE: &str = "google.protobuf.Timestamp";
/// Full name of the well-known duration message
pub const DURATION_TYPE: &str = "google.protobuf.Duration";

/// Source of message descriptors
pub trait SchemaProvider: Send + Sync {
    /// Look a message type up by its fully qualified name
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor>;
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Arc<T> {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        (**self).message(full_name)
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for &T {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        (**self).message(full_name)
    }
}

/// In-memory schema provider
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    messages: IndexMap<String, MessageDescriptor>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Create a registry holding the well-known time messages
    pub fn new() -> Self {
        let mut registry = Self {
            messages: IndexMap::new(),
        };
        for name in [TIMESTAMP_TYPE, DURATION_TYPE] {
            registry.register(
                MessageDescriptor::new(name)
                    .with_field(FieldDescriptor::new("seconds", Kind::Int64))
                    .with_field(FieldDescriptor::new("nanos", Kind::Int32)),
            );
        }
        registry
    }

    /// Add (or replace) a message type
    pub fn register(&mut self, message: MessageDescriptor) -> &mut Self {
        self.messages.insert(message.name.clone(), message);
        self
    }

    /// Builder form of [`SchemaRegistry::register`]
    pub fn with_message(mut self, message: MessageDescriptor) -> Self {
        self.register(message);
        self
    }

    /// Load a JSON array of message descriptors on top of the well-known types
    pub fn from_json(json: &str) -> Result<Self> {
        let messages: Vec<MessageDescriptor> = serde_json::from_str(json)
            .map_err(|e| FieldPathError::internal(format!("invalid schema document: {e}"), 0))?;
        let mut registry = Self::new();
        for message in messages {
            registry.register(message);
        }
        Ok(registry)
    }

    pub fn contains(&self, full_name: &str) -> bool {
        self.messages.contains_key(full_name)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Registered messages in registration order
    pub fn messages(&self) -> impl Iterator<Item = &MessageDescriptor> {
        self.messages.values()
    }
}

impl SchemaProvider for SchemaRegistry {
    fn message(&self, full_name: &str) -> Option<&MessageDescriptor> {
        self.messages.get(full_name)
    }
}
