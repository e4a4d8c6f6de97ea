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

//! Schema-bound field paths for resource-oriented APIs
//!
//! Parses read masks, update masks and order-by clauses against a message
//! schema and produces typed expression trees for query layers to consume.
//!
//! ```
//! use fieldpath::{FieldPathParser, testing};
//!
//! let registry = testing::registry();
//! let mut parser = FieldPathParser::new(&registry, testing::MESSAGE)?;
//!
//! let select = parser.parse_select(&["sub.name", "sub.i32"])?.unwrap();
//! assert_eq!(select.paths(), vec!["sub.name", "sub.i32"]);
//!
//! let order = parser.parse_order_by("i64 ASC, float DESC")?;
//! assert_eq!(order.to_string(), "i64 asc, float desc");
//! # Ok::<(), fieldpath::FieldPathError>(())
//! ```

pub mod ast;
pub mod core;
pub mod diagnostics;
pub mod model;
pub mod parser;
pub mod schema;

#[doc(hidden)]
pub mod testing;

pub use crate::ast::{
    FieldSelector, MessageSelect, OrderByExpr, OrderByFieldExpr, SortOrder, UpdateExpr,
    UpdateValue, ValueExpr,
};
pub use crate::core::{ErrorKind, FieldPathError, Result};
pub use crate::diagnostics::{Diagnostic, DiagnosticCollector, ErrorHandler};
pub use crate::model::{
    FieldDescriptor, Kind, MessageDescriptor, MessageValue, SchemaProvider, SchemaRegistry, Value,
};
pub use crate::parser::{
    FieldPathParser, ParserConfig, parse_order_by, parse_select, parse_update,
};
pub use crate::schema::{SchemaCache, SchemaMetadata, introspect};
