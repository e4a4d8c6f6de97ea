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

//! Schema and value reflection model
//!
//! Parsers consume schemas through the [`SchemaProvider`] trait and live
//! data through [`MessageValue`]. Kind-dependent behavior is centralised in
//! the capability table of [`kind`].

pub mod descriptor;
pub mod kind;
pub mod provider;
pub mod value;

pub use descriptor::{
    Cardinality, FieldBehavior, FieldDescriptor, Kind, MessageDescriptor, OneofDescriptor,
    QueryOptions,
};
pub use kind::{ValueClass, WellKnownTime};
pub use provider::{DURATION_TYPE, SchemaProvider, SchemaRegistry, TIMESTAMP_TYPE};
pub use value::{MapKey, MessageValue, Value};
