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

//! Shared schema metadata cache

use super::introspector::{SchemaMetadata, introspect};
use crate::core::Result;
use crate::model::SchemaProvider;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for cache performance monitoring
#[derive(Debug, Default)]
pub struct CacheStatistics {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStatistics {
    /// Record a cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Reset all statistics to zero
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Thread-safe cache of introspected schemas, keyed by root type name
///
/// Clones share the same entries. Metadata is immutable once built, so this
/// is the one piece of parser state that can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    entries: Arc<DashMap<String, Arc<SchemaMetadata>>>,
    stats: Arc<CacheStatistics>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached metadata for `root`, introspecting it on first use
    pub fn get_or_introspect(
        &self,
        provider: &dyn SchemaProvider,
        root: &str,
    ) -> Result<Arc<SchemaMetadata>> {
        if let Some(entry) = self.entries.get(root) {
            self.stats.record_hit();
            log::trace!("schema cache hit for {root}");
            return Ok(Arc::clone(entry.value()));
        }

        self.stats.record_miss();
        log::trace!("schema cache miss for {root}");
        let metadata = Arc::new(introspect(provider, root)?);
        // A concurrent miss may have won the race; keep the first entry
        let entry = self
            .entries
            .entry(root.to_string())
            .or_insert_with(|| Arc::clone(&metadata));
        Ok(Arc::clone(entry.value()))
    }

    /// Cached metadata without introspecting
    pub fn get(&self, root: &str) -> Option<Arc<SchemaMetadata>> {
        self.entries.get(root).map(|entry| Arc::clone(entry.value()))
    }

    /// Drop the entry for `root`
    pub fn invalidate(&self, root: &str) -> bool {
        self.entries.remove(root).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> &CacheStatistics {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_second_lookup_hits() {
        let registry = testing::registry();
        let cache = SchemaCache::new();

        let first = cache.get_or_introspect(&registry, testing::MESSAGE).unwrap();
        let second = cache.get_or_introspect(&registry, testing::MESSAGE).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().hit_rate(), 0.5);
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = testing::registry();
        let cache = SchemaCache::new();
        let shared = cache.clone();

        shared.get_or_introspect(&registry, testing::SUB).unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(testing::SUB).is_some());
        assert!(cache.invalidate(testing::SUB));
        assert!(shared.is_empty());
    }

    #[test]
    fn test_failed_introspection_is_not_cached() {
        let registry = testing::registry();
        let cache = SchemaCache::new();
        assert!(cache.get_or_introspect(&registry, "no.Such").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_shared_across_threads() {
        let registry = Arc::new(testing::registry());
        let cache = SchemaCache::new();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let cache = cache.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_introspect(registry.as_ref(), testing::MESSAGE)
                        .map(|m| m.len())
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().unwrap() > 1);
        }
        assert_eq!(cache.len(), 1);
    }
}
