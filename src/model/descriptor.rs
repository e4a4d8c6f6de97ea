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

//! Message and field descriptors
//!
//! A minimal reflection model of protobuf-style messages. Descriptors are
//! plain data and derive serde so a whole schema can be loaded from JSON.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Wire kind of a field (or of a list element / map value)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Bool,
    Int32,
    Sint32,
    Sfixed32,
    Int64,
    Sint64,
    Sfixed64,
    Uint32,
    Fixed32,
    Uint64,
    Fixed64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
    /// Legacy group encoding, not modelled by any parser
    Group,
}

impl Kind {
    /// Returns true for message-typed kinds
    pub fn is_message(self) -> bool {
        matches!(self, Kind::Message | Kind::Group)
    }

    /// Protobuf spelling of the kind
    pub fn name(self) -> &'static str {
        match self {
            Kind::Bool => "bool",
            Kind::Int32 => "int32",
            Kind::Sint32 => "sint32",
            Kind::Sfixed32 => "sfixed32",
            Kind::Int64 => "int64",
            Kind::Sint64 => "sint64",
            Kind::Sfixed64 => "sfixed64",
            Kind::Uint32 => "uint32",
            Kind::Fixed32 => "fixed32",
            Kind::Uint64 => "uint64",
            Kind::Fixed64 => "fixed64",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Bytes => "bytes",
            Kind::Enum => "enum",
            Kind::Message => "message",
            Kind::Group => "group",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many values a field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
    Map,
}

/// Behavior annotations (`google.api.field_behavior` style)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldBehavior {
    Optional,
    Required,
    OutputOnly,
    InputOnly,
    Immutable,
    UnorderedList,
    NonEmptyDefault,
    Identifier,
}

/// Query annotations controlling filter/order eligibility and cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub filtering_forbidden: bool,
    pub ordering_forbidden: bool,
    /// Complexity weight; 0 means unset
    pub weight: u32,
}

/// A single field declaration
///
/// For lists `kind` and `message_type` describe the element; for maps they
/// describe the value and `map_key` holds the key kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: Kind,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_key: Option<Kind>,
    /// Name of the enclosing oneof, set when the field is a oneof member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof: Option<String>,
    /// proto3 `optional` keyword (explicit presence)
    #[serde(default)]
    pub proto3_optional: bool,
    #[serde(default)]
    pub behaviors: SmallVec<[FieldBehavior; 2]>,
    /// Explicit nullable annotation
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryOptions>,
}

impl FieldDescriptor {
    /// A singular field of the given kind
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            cardinality: Cardinality::Singular,
            message_type: None,
            enum_type: None,
            map_key: None,
            oneof: None,
            proto3_optional: false,
            behaviors: SmallVec::new(),
            nullable: false,
            query: None,
        }
    }

    /// A singular message field
    pub fn message(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        let mut field = Self::new(name, Kind::Message);
        field.message_type = Some(message_type.into());
        field
    }

    /// A singular enum field
    pub fn enumeration(name: impl Into<String>, enum_type: impl Into<String>) -> Self {
        let mut field = Self::new(name, Kind::Enum);
        field.enum_type = Some(enum_type.into());
        field
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    /// Turn the field into a map keyed by `key`; the current kind becomes the value kind
    pub fn map(mut self, key: Kind) -> Self {
        self.cardinality = Cardinality::Map;
        self.map_key = Some(key);
        self
    }

    pub fn with_behavior(mut self, behavior: FieldBehavior) -> Self {
        if !self.behaviors.contains(&behavior) {
            self.behaviors.push(behavior);
        }
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.proto3_optional = true;
        self
    }

    pub fn filtering_forbidden(mut self) -> Self {
        self.query.get_or_insert_with(QueryOptions::default).filtering_forbidden = true;
        self
    }

    pub fn ordering_forbidden(mut self) -> Self {
        self.query.get_or_insert_with(QueryOptions::default).ordering_forbidden = true;
        self
    }

    pub fn with_weight(mut self, weight: u32) -> Self {
        self.query.get_or_insert_with(QueryOptions::default).weight = weight;
        self
    }

    /// Check for a behavior annotation
    pub fn has_behavior(&self, behavior: FieldBehavior) -> bool {
        self.behaviors.contains(&behavior)
    }
}

/// A oneof group and its member fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneofDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

/// A message type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Fully qualified name, e.g. `test.Message`
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub oneofs: Vec<OneofDescriptor>,
}

impl MessageDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            oneofs: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a oneof; its members are tagged with the oneof name
    pub fn with_oneof(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = FieldDescriptor>,
    ) -> Self {
        let name = name.into();
        let fields = fields
            .into_iter()
            .map(|mut field| {
                field.oneof = Some(name.clone());
                field
            })
            .collect();
        self.oneofs.push(OneofDescriptor { name, fields });
        self
    }

    /// Look a field up by name, searching declared fields then oneof members
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.all_fields().find(|field| field.name == name)
    }

    /// Declared fields followed by oneof members
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .chain(self.oneofs.iter().flat_map(|oneof| oneof.fields.iter()))
    }
}
