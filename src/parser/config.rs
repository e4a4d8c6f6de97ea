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

//! Parser configuration options

use serde::{Deserialize, Serialize};

/// Configuration shared by the select, update and order-by parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Skip immutable and output-only paths in update masks instead of failing
    pub ignore_non_updatable: bool,

    /// Maximum number of segments in a single path
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            ignore_non_updatable: false,
            max_depth: 32,
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether non-updatable fields are skipped
    pub fn with_ignore_non_updatable(mut self, ignore: bool) -> Self {
        self.ignore_non_updatable = ignore;
        self
    }

    /// Set the maximum path depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert!(!config.ignore_non_updatable);
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_partial_json() {
        let config: ParserConfig = serde_json::from_str(r#"{"ignore_non_updatable": true}"#).unwrap();
        assert_eq!(config, ParserConfig::new().with_ignore_non_updatable(true));
    }
}
