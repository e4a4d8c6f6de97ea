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

//! Field path parsers
//!
//! [`FieldPathParser`] binds a schema provider and a root message type and
//! exposes the three parsers. Every failure is returned as a
//! [`FieldPathError`] and also reported to the installed [`ErrorHandler`].

pub mod config;
mod cursor;
pub mod lexer;
mod order_by;
mod select;
pub mod span;
pub mod tokenizer;
pub mod update;

pub use config::ParserConfig;
pub use span::Spanned;
pub use tokenizer::{Scanner, Token};
pub use update::{FieldCursor, MessageCursor};

use crate::ast::{MessageSelect, NodeArena, OrderByExpr, UpdateExpr};
use crate::core::{FieldPathError, Result};
use crate::diagnostics::ErrorHandler;
use crate::model::{MessageValue, SchemaProvider};
use crate::schema::{SchemaCache, SchemaMetadata, introspect};
use order_by::OrderByParser;
use select::SelectParser;
use std::fmt;
use std::sync::Arc;
use update::UpdateParser;

/// Parser bound to one root message type
///
/// Holds mutable per-parse state, so one instance must not be used from
/// several threads at once. Share a [`SchemaCache`] instead.
pub struct FieldPathParser<'p> {
    provider: &'p dyn SchemaProvider,
    cache: Option<SchemaCache>,
    metadata: Arc<SchemaMetadata>,
    config: ParserConfig,
    handler: Option<Box<dyn ErrorHandler>>,
    arena: NodeArena,
}

impl fmt::Debug for FieldPathParser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldPathParser")
            .field("root", &self.metadata.root_name())
            .field("config", &self.config)
            .field("cached", &self.cache.is_some())
            .field("has_error_handler", &self.handler.is_some())
            .finish()
    }
}

impl<'p> FieldPathParser<'p> {
    /// Create a parser for `root`, introspecting its schema
    pub fn new(provider: &'p dyn SchemaProvider, root: &str) -> Result<Self> {
        let metadata = Arc::new(introspect(provider, root)?);
        Ok(Self::from_parts(provider, None, metadata))
    }

    /// Create a parser for `root`, taking its schema from a shared cache
    pub fn with_cache(provider: &'p dyn SchemaProvider, root: &str, cache: SchemaCache) -> Result<Self> {
        let metadata = cache.get_or_introspect(provider, root)?;
        Ok(Self::from_parts(provider, Some(cache), metadata))
    }

    fn from_parts(
        provider: &'p dyn SchemaProvider,
        cache: Option<SchemaCache>,
        metadata: Arc<SchemaMetadata>,
    ) -> Self {
        Self {
            provider,
            cache,
            metadata,
            config: ParserConfig::default(),
            handler: None,
            arena: NodeArena::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ParserConfig {
        &mut self.config
    }

    /// Install a side-channel error handler
    pub fn set_error_handler(&mut self, handler: impl ErrorHandler + 'static) {
        self.handler = Some(Box::new(handler));
    }

    /// Remove the error handler, returning it
    pub fn take_error_handler(&mut self) -> Option<Box<dyn ErrorHandler>> {
        self.handler.take()
    }

    /// Rebind the parser to another root message type
    pub fn reset(&mut self, root: &str) -> Result<()> {
        let metadata = match &self.cache {
            Some(cache) => cache.get_or_introspect(self.provider, root),
            None => introspect(self.provider, root).map(Arc::new),
        };
        match metadata {
            Ok(metadata) => {
                self.metadata = metadata;
                self.arena.clear();
                Ok(())
            }
            Err(err) => Err(self.report(err)),
        }
    }

    /// Schema metadata of the current root type
    pub fn metadata(&self) -> &Arc<SchemaMetadata> {
        &self.metadata
    }

    /// Parse a read mask into a consolidated selection; `None` for no paths
    pub fn parse_select<S: AsRef<str>>(&mut self, paths: &[S]) -> Result<Option<MessageSelect>> {
        let result =
            SelectParser::new(&self.metadata, &mut self.arena, self.config.max_depth).parse(paths);
        result.map_err(|err| self.report(err))
    }

    /// Parse an update mask against a live message value
    pub fn parse_update<S: AsRef<str>>(
        &mut self,
        message: &MessageValue,
        paths: &[S],
    ) -> Result<UpdateExpr> {
        let result = UpdateParser::new(&self.metadata, self.config).parse(message, paths);
        result.map_err(|err| self.report(err))
    }

    /// Parse an order-by clause
    pub fn parse_order_by(&mut self, text: &str) -> Result<OrderByExpr> {
        let result = OrderByParser::new(&self.metadata, self.config.max_depth).parse(text);
        result.map_err(|err| self.report(err))
    }

    fn report(&mut self, err: FieldPathError) -> FieldPathError {
        log::debug!("rejected field path: {err}");
        if let Some(handler) = self.handler.as_mut() {
            handler.report_error(&err);
        }
        err
    }
}

/// Parse a read mask for `root` with a one-shot parser
pub fn parse_select<S: AsRef<str>>(
    provider: &dyn SchemaProvider,
    root: &str,
    paths: &[S],
) -> Result<Option<MessageSelect>> {
    FieldPathParser::new(provider, root)?.parse_select(paths)
}

/// Parse an update mask for the type of `message` with a one-shot parser
pub fn parse_update<S: AsRef<str>>(
    provider: &dyn SchemaProvider,
    message: &MessageValue,
    paths: &[S],
) -> Result<UpdateExpr> {
    FieldPathParser::new(provider, message.type_name())?.parse_update(message, paths)
}

/// Parse an order-by clause for `root` with a one-shot parser
pub fn parse_order_by(provider: &dyn SchemaProvider, root: &str, text: &str) -> Result<OrderByExpr> {
    FieldPathParser::new(provider, root)?.parse_order_by(text)
}
