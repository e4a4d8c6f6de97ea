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

//! Test fixtures
//!
//! A small schema exercising every kind, cardinality and behavior flag the
//! parsers care about, plus a populated value of its root message. Used by
//! the unit tests, the integration tests and the benchmarks.

use crate::model::{
    DURATION_TYPE, FieldBehavior, FieldDescriptor, Kind, MessageDescriptor, MessageValue,
    SchemaRegistry, TIMESTAMP_TYPE, Value,
};

pub const MESSAGE: &str = "test.Message";
pub const SUB: &str = "test.Sub";
pub const POINT: &str = "test.Point";
pub const NODE: &str = "test.Node";

/// `test.Message`
pub fn message_descriptor() -> MessageDescriptor {
    MessageDescriptor::new(MESSAGE)
        .with_field(FieldDescriptor::new("str", Kind::String))
        .with_field(FieldDescriptor::new("i32", Kind::Int32))
        .with_field(FieldDescriptor::new("i64", Kind::Int64))
        .with_field(FieldDescriptor::new("u32", Kind::Uint32))
        .with_field(FieldDescriptor::new("u64", Kind::Uint64))
        .with_field(FieldDescriptor::new("float", Kind::Float))
        .with_field(FieldDescriptor::new("double", Kind::Double))
        .with_field(FieldDescriptor::new("bool", Kind::Bool))
        .with_field(FieldDescriptor::new("bytes", Kind::Bytes))
        .with_field(FieldDescriptor::enumeration("enum", "test.Enum"))
        .with_field(
            FieldDescriptor::new("input_only_str", Kind::String)
                .with_behavior(FieldBehavior::InputOnly),
        )
        .with_field(
            FieldDescriptor::new("output_only_str", Kind::String)
                .with_behavior(FieldBehavior::OutputOnly),
        )
        .with_field(
            FieldDescriptor::new("immutable_str", Kind::String)
                .with_behavior(FieldBehavior::Immutable),
        )
        .with_field(FieldDescriptor::new("nullable_str", Kind::String).nullable())
        .with_field(FieldDescriptor::message("sub", SUB))
        .with_field(FieldDescriptor::message("rp_sub", SUB).repeated())
        .with_field(FieldDescriptor::new("rp_str", Kind::String).repeated())
        .with_field(FieldDescriptor::new("rp_i64", Kind::Int64).repeated())
        .with_field(FieldDescriptor::message("map_str_msg", SUB).map(Kind::String))
        .with_field(FieldDescriptor::new("map_str_str", Kind::String).map(Kind::String))
        .with_field(FieldDescriptor::new("map_bool_i32", Kind::Int32).map(Kind::Bool))
        .with_field(FieldDescriptor::new("map_i64_str", Kind::String).map(Kind::Int64))
        .with_field(FieldDescriptor::message("point", POINT))
        .with_field(
            FieldDescriptor::message("required_point", POINT)
                .with_behavior(FieldBehavior::Required),
        )
        .with_field(FieldDescriptor::message("ts", TIMESTAMP_TYPE))
        .with_field(FieldDescriptor::message("dur", DURATION_TYPE))
        .with_field(FieldDescriptor::new("no_order", Kind::Int32).ordering_forbidden())
        .with_field(FieldDescriptor::new("weighted", Kind::Int32).with_weight(5))
        .with_field(FieldDescriptor::new("desc", Kind::String))
        .with_field(FieldDescriptor::message("node", NODE))
        .with_oneof(
            "choice",
            [
                FieldDescriptor::new("one_str", Kind::String),
                FieldDescriptor::new("one_i32", Kind::Int32),
            ],
        )
}

/// `test.Sub`
pub fn sub_descriptor() -> MessageDescriptor {
    MessageDescriptor::new(SUB)
        .with_field(FieldDescriptor::new("name", Kind::String))
        .with_field(FieldDescriptor::new("i32", Kind::Int32))
        .with_field(FieldDescriptor::new("map_i32_str", Kind::String).map(Kind::Int32))
        .with_field(FieldDescriptor::new("no_order", Kind::String).ordering_forbidden())
        .with_field(
            FieldDescriptor::new("output_only_i64", Kind::Int64)
                .with_behavior(FieldBehavior::OutputOnly),
        )
}

/// `test.Point`
pub fn point_descriptor() -> MessageDescriptor {
    MessageDescriptor::new(POINT)
        .with_field(FieldDescriptor::new("x", Kind::Int32))
        .with_field(FieldDescriptor::new("y", Kind::Double))
}

/// `test.Node`, a self-referencing message
pub fn node_descriptor() -> MessageDescriptor {
    MessageDescriptor::new(NODE)
        .with_field(FieldDescriptor::new("name", Kind::String))
        .with_field(FieldDescriptor::message("child", NODE))
}

/// Registry holding every fixture message
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with_message(message_descriptor())
        .with_message(sub_descriptor())
        .with_message(point_descriptor())
        .with_message(node_descriptor())
}

pub fn sub(name: &str) -> MessageValue {
    MessageValue::new(SUB).with("name", name)
}

pub fn point(x: i32, y: f64) -> MessageValue {
    MessageValue::new(POINT).with("x", x).with("y", y)
}

/// A populated `test.Message`
pub fn message() -> MessageValue {
    MessageValue::new(MESSAGE)
        .with("str", "test")
        .with("i32", 42i32)
        .with("i64", -7i64)
        .with("u32", 7u32)
        .with("u64", 8u64)
        .with("float", 1.5f32)
        .with("double", 2.25f64)
        .with("bool", true)
        .with("bytes", b"raw".to_vec())
        .with("enum", Value::Enum(2))
        .with("immutable_str", "fixed")
        .with("output_only_str", "computed")
        .with(
            "sub",
            sub("sub")
                .with("i32", 1i32)
                .with("map_i32_str", Value::map([(653i32, "six"), (1i32, "one")]))
                .with("output_only_i64", 9i64),
        )
        .with("rp_sub", Value::list([sub("a"), sub("b")]))
        .with("rp_str", Value::list(["x", "y"]))
        .with("rp_i64", Value::list([1i64, 2]))
        .with("map_str_msg", Value::map([("key", sub("k"))]))
        .with("map_str_str", Value::map([("a", "b")]))
        .with("point", point(42, 43.24))
        .with("required_point", point(1, 2.0))
        .with(
            "ts",
            MessageValue::new(TIMESTAMP_TYPE).with("seconds", 1_700_000_000i64),
        )
        .with("dur", MessageValue::new(DURATION_TYPE).with("seconds", 5i64))
        .with("one_str", "picked")
}
