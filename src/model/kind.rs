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

//! Field kind capability table
//!
//! Every kind-dependent decision the parsers make goes through here:
//! parsing a literal map key, extracting a live value, and producing the
//! empty default for an absent field.

use super::descriptor::Kind;
use super::provider::{DURATION_TYPE, TIMESTAMP_TYPE};
use super::value::{MapKey, MessageValue, Value};
use crate::ast::ValueExpr;
use crate::parser::Token;
use chrono::{DateTime, TimeDelta, Utc};

/// Representation family of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueClass {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Enum,
    Message,
    Unsupported,
}

impl Kind {
    /// Collapse wire encodings onto their value representation
    pub fn value_class(self) -> ValueClass {
        match self {
            Kind::Bool => ValueClass::Bool,
            Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => ValueClass::Int32,
            Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => ValueClass::Int64,
            Kind::Uint32 | Kind::Fixed32 => ValueClass::Uint32,
            Kind::Uint64 | Kind::Fixed64 => ValueClass::Uint64,
            Kind::Float => ValueClass::Float,
            Kind::Double => ValueClass::Double,
            Kind::String => ValueClass::String,
            Kind::Bytes => ValueClass::Bytes,
            Kind::Enum => ValueClass::Enum,
            Kind::Message => ValueClass::Message,
            Kind::Group => ValueClass::Unsupported,
        }
    }

    /// Kinds allowed as map keys
    pub fn is_valid_map_key(self) -> bool {
        matches!(
            self.value_class(),
            ValueClass::Bool
                | ValueClass::Int32
                | ValueClass::Int64
                | ValueClass::Uint32
                | ValueClass::Uint64
                | ValueClass::String
        )
    }

    /// Parse a path token as a literal of this kind; `None` on type mismatch
    pub fn parse_literal(self, token: &Token<'_>) -> Option<ValueExpr> {
        match (self.value_class(), token) {
            (ValueClass::Bool, Token::Bool(v)) => Some(ValueExpr::Bool(*v)),
            (ValueClass::Int32, Token::Int(v)) => i32::try_from(*v).ok().map(ValueExpr::Int32),
            (ValueClass::Int64, Token::Int(v)) => Some(ValueExpr::Int64(*v)),
            (ValueClass::Uint32, Token::Uint(v)) => u32::try_from(*v).ok().map(ValueExpr::Uint32),
            (ValueClass::Uint32, Token::Int(v)) => u32::try_from(*v).ok().map(ValueExpr::Uint32),
            (ValueClass::Uint64, Token::Uint(v)) => Some(ValueExpr::Uint64(*v)),
            (ValueClass::Uint64, Token::Int(v)) => u64::try_from(*v).ok().map(ValueExpr::Uint64),
            (ValueClass::String, Token::String(s)) => Some(ValueExpr::String(s.to_string())),
            (ValueClass::String, token) => token
                .field_name()
                .map(|name| ValueExpr::String(name.to_string())),
            _ => None,
        }
    }

    /// Parse a map key token; `text` is the source the token was scanned from
    ///
    /// String keys also accept unquoted tokens that scan as booleans or
    /// numbers, spelled exactly as written.
    pub fn parse_key(self, token: &Token<'_>, text: &str) -> Option<ValueExpr> {
        match (self.value_class(), token) {
            (ValueClass::String, Token::Bool(_) | Token::Int(_) | Token::Uint(_)) => {
                Some(ValueExpr::String(text.to_string()))
            }
            _ => self.parse_literal(token),
        }
    }

    /// Extract a live value; `None` when the value does not have this kind
    pub fn extract(self, value: &Value) -> Option<ValueExpr> {
        match (self.value_class(), value) {
            (ValueClass::Bool, Value::Bool(v)) => Some(ValueExpr::Bool(*v)),
            (ValueClass::Int32, Value::I32(v)) => Some(ValueExpr::Int32(*v)),
            (ValueClass::Int64, Value::I64(v)) => Some(ValueExpr::Int64(*v)),
            (ValueClass::Uint32, Value::U32(v)) => Some(ValueExpr::Uint32(*v)),
            (ValueClass::Uint64, Value::U64(v)) => Some(ValueExpr::Uint64(*v)),
            (ValueClass::Float, Value::F32(v)) => Some(ValueExpr::Float(*v)),
            (ValueClass::Double, Value::F64(v)) => Some(ValueExpr::Double(*v)),
            (ValueClass::String, Value::String(v)) => Some(ValueExpr::String(v.clone())),
            (ValueClass::Bytes, Value::Bytes(v)) => Some(ValueExpr::Bytes(v.clone())),
            (ValueClass::Enum, Value::Enum(v)) => Some(ValueExpr::Enum(*v)),
            _ => None,
        }
    }

    /// Convert a live map key into a literal; `None` on kind mismatch
    pub fn extract_key(self, key: &MapKey) -> Option<ValueExpr> {
        match (self.value_class(), key) {
            (ValueClass::Bool, MapKey::Bool(v)) => Some(ValueExpr::Bool(*v)),
            (ValueClass::Int32, MapKey::I32(v)) => Some(ValueExpr::Int32(*v)),
            (ValueClass::Int64, MapKey::I64(v)) => Some(ValueExpr::Int64(*v)),
            (ValueClass::Uint32, MapKey::U32(v)) => Some(ValueExpr::Uint32(*v)),
            (ValueClass::Uint64, MapKey::U64(v)) => Some(ValueExpr::Uint64(*v)),
            (ValueClass::String, MapKey::String(v)) => Some(ValueExpr::String(v.clone())),
            _ => None,
        }
    }

    /// Empty default for an unset field; `None` when no meaningful default exists
    pub fn default_value(self) -> Option<ValueExpr> {
        match self.value_class() {
            ValueClass::Bool => Some(ValueExpr::Bool(false)),
            ValueClass::Int32 => Some(ValueExpr::Int32(0)),
            ValueClass::Int64 => Some(ValueExpr::Int64(0)),
            ValueClass::Uint32 => Some(ValueExpr::Uint32(0)),
            ValueClass::Uint64 => Some(ValueExpr::Uint64(0)),
            ValueClass::Float => Some(ValueExpr::Float(0.0)),
            ValueClass::Double => Some(ValueExpr::Double(0.0)),
            ValueClass::String => Some(ValueExpr::String(String::new())),
            ValueClass::Bytes => Some(ValueExpr::Bytes(Vec::new())),
            ValueClass::Enum => Some(ValueExpr::Enum(0)),
            ValueClass::Message | ValueClass::Unsupported => None,
        }
    }
}

/// Convert a literal key back into a live map key
pub fn to_map_key(key: &ValueExpr) -> Option<MapKey> {
    match key {
        ValueExpr::Bool(v) => Some(MapKey::Bool(*v)),
        ValueExpr::Int32(v) => Some(MapKey::I32(*v)),
        ValueExpr::Int64(v) => Some(MapKey::I64(*v)),
        ValueExpr::Uint32(v) => Some(MapKey::U32(*v)),
        ValueExpr::Uint64(v) => Some(MapKey::U64(*v)),
        ValueExpr::String(v) => Some(MapKey::String(v.clone())),
        _ => None,
    }
}

/// Well-known messages extracted as a single time value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownTime {
    Timestamp,
    Duration,
}

impl WellKnownTime {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            TIMESTAMP_TYPE => Some(WellKnownTime::Timestamp),
            DURATION_TYPE => Some(WellKnownTime::Duration),
            _ => None,
        }
    }

    /// Combine `seconds`/`nanos`; `None` when out of range or mistyped
    pub fn extract(self, message: &MessageValue) -> Option<ValueExpr> {
        let seconds = match message.get("seconds") {
            Some(Value::I64(v)) => *v,
            None => 0,
            Some(_) => return None,
        };
        let nanos = match message.get("nanos") {
            Some(Value::I32(v)) => *v,
            None => 0,
            Some(_) => return None,
        };
        match self {
            WellKnownTime::Timestamp => {
                let nanos = u32::try_from(nanos).ok()?;
                DateTime::<Utc>::from_timestamp(seconds, nanos).map(ValueExpr::Timestamp)
            }
            WellKnownTime::Duration => TimeDelta::try_seconds(seconds)?
                .checked_add(&TimeDelta::nanoseconds(i64::from(nanos)))
                .map(ValueExpr::Duration),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[test]
    fn test_parse_literal_by_kind() {
        assert_eq!(
            Kind::Int32.parse_literal(&Token::Int(653)),
            Some(ValueExpr::Int32(653))
        );
        assert_eq!(Kind::Int32.parse_literal(&Token::Int(i64::MAX)), None);
        assert_eq!(Kind::Uint64.parse_literal(&Token::Int(-1)), None);
        assert_eq!(
            Kind::Fixed32.parse_literal(&Token::Uint(5)),
            Some(ValueExpr::Uint32(5))
        );
        assert_eq!(
            Kind::String.parse_literal(&Token::Identifier("key")),
            Some(ValueExpr::String("key".into()))
        );
        assert_eq!(
            Kind::String.parse_literal(&Token::String(Cow::Borrowed("a.b"))),
            Some(ValueExpr::String("a.b".into()))
        );
        assert_eq!(Kind::String.parse_literal(&Token::Int(1)), None);
        assert_eq!(Kind::Bool.parse_literal(&Token::Identifier("x")), None);
    }

    #[test]
    fn test_string_map_keys_keep_source_spelling() {
        assert_eq!(
            Kind::String.parse_key(&Token::Bool(true), "true"),
            Some(ValueExpr::String("true".into()))
        );
        assert_eq!(
            Kind::String.parse_key(&Token::Int(7), "007"),
            Some(ValueExpr::String("007".into()))
        );
        assert_eq!(
            Kind::String.parse_key(&Token::Uint(5), "5u"),
            Some(ValueExpr::String("5u".into()))
        );
        assert_eq!(
            Kind::Int64.parse_key(&Token::Int(-3), "-3"),
            Some(ValueExpr::Int64(-3))
        );
        assert_eq!(Kind::Bool.parse_key(&Token::Int(1), "1"), None);
    }

    #[test]
    fn test_extract_rejects_mismatch() {
        assert_eq!(Kind::Sint64.extract(&Value::I64(-4)), Some(ValueExpr::Int64(-4)));
        assert_eq!(Kind::Int64.extract(&Value::I32(4)), None);
        assert_eq!(Kind::Message.extract(&Value::I32(4)), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Kind::String.default_value(), Some(ValueExpr::String(String::new())));
        assert_eq!(Kind::Message.default_value(), None);
        assert_eq!(Kind::Group.default_value(), None);
        assert!(Kind::Uint32.is_valid_map_key());
        assert!(!Kind::Double.is_valid_map_key());
        assert!(!Kind::Bytes.is_valid_map_key());
    }

    #[test]
    fn test_well_known_time() {
        let ts = MessageValue::new(TIMESTAMP_TYPE)
            .with("seconds", 1_700_000_000i64)
            .with("nanos", 5i32);
        let Some(ValueExpr::Timestamp(value)) = WellKnownTime::Timestamp.extract(&ts) else {
            panic!("expected timestamp");
        };
        assert_eq!(value.timestamp(), 1_700_000_000);
        assert_eq!(value.timestamp_subsec_nanos(), 5);

        let dur = MessageValue::new(DURATION_TYPE)
            .with("seconds", -1i64)
            .with("nanos", -500_000_000i32);
        assert_eq!(
            WellKnownTime::Duration.extract(&dur),
            Some(ValueExpr::Duration(TimeDelta::milliseconds(-1500)))
        );

        let bad = MessageValue::new(TIMESTAMP_TYPE).with("nanos", -1i32);
        assert_eq!(WellKnownTime::Timestamp.extract(&bad), None);
    }
}
