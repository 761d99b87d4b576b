//! Session cache of parsed workbooks keyed by source and content hash

use crate::error::Result;
use crate::reader::{Workbook, read_workbook_from_bytes};
use crate::schema::Schema;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    identity: String,
    hash: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

/// Bounded LRU of parsed workbooks.
///
/// Loading the same bytes under the same identity returns the cached
/// snapshot. Loading new bytes under a known identity drops the entry for
/// the old content before inserting the new one.
///
/// The key is the identity and the content hash only. The schema passed to
/// [`WorkbookCache::get_or_load`] is used on a miss and ignored on a hit, so
/// one cache must only ever be used with one schema. [`crate::Dashboard`]
/// owns its schema and its cache together for this reason.
pub struct WorkbookCache {
    entries: LruCache<CacheKey, Arc<Workbook>>,
    stats: CacheStats,
}

impl WorkbookCache {
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Return the cached workbook for `(identity, sha256(bytes))`, or parse
    /// and bind `bytes` with `schema` and cache the result. A hit returns the
    /// workbook as it was bound on the original miss, whatever `schema` is.
    pub fn get_or_load(
        &mut self,
        identity: &str,
        bytes: &[u8],
        schema: &Schema,
    ) -> Result<Arc<Workbook>> {
        let key = CacheKey {
            identity: identity.to_string(),
            hash: content_hash(bytes),
        };

        if let Some(workbook) = self.entries.get(&key) {
            self.stats.hits += 1;
            info!(identity, hash = %key.hash, "workbook cache hit");
            return Ok(Arc::clone(workbook));
        }
        self.stats.misses += 1;

        let workbook = Arc::new(read_workbook_from_bytes(identity, bytes, schema)?);

        let stale: Vec<CacheKey> = self
            .entries
            .iter()
            .filter(|(k, _)| k.identity == key.identity)
            .map(|(k, _)| k.clone())
            .collect();
        for old in stale {
            debug!(identity, old_hash = %old.hash, "dropping workbook for replaced content");
            self.entries.pop(&old);
            self.stats.invalidations += 1;
        }

        if let Some((evicted, _)) = self.entries.push(key, Arc::clone(&workbook)) {
            debug!(identity = %evicted.identity, "workbook evicted");
        }
        Ok(workbook)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Lowercase hex SHA-256 of the content
pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .fold(String::with_capacity(64), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::test_fixtures::workbook_bytes;

    #[test]
    fn test_content_hash() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_content_is_a_hit() {
        let mut cache = WorkbookCache::new(4);
        let bytes = workbook_bytes(&[100.0, 150.0]);
        let schema = Schema::builtin();

        let first = cache.get_or_load("upload.xlsx", &bytes, &schema).unwrap();
        let second = cache.get_or_load("upload.xlsx", &bytes, &schema).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_hit_keeps_original_binding() {
        let mut cache = WorkbookCache::new(4);
        let bytes = workbook_bytes(&[100.0, 150.0]);
        let mut strict = DashboardConfig::default();
        strict.global.strict_schema = Some(true);

        let first = cache
            .get_or_load("upload.xlsx", &bytes, &Schema::builtin())
            .unwrap();
        let second = cache
            .get_or_load("upload.xlsx", &bytes, &Schema::from_config(&strict))
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_new_content_invalidates() {
        let mut cache = WorkbookCache::new(4);
        let schema = Schema::builtin();

        let old = cache
            .get_or_load("upload.xlsx", &workbook_bytes(&[100.0]), &schema)
            .unwrap();
        let new = cache
            .get_or_load("upload.xlsx", &workbook_bytes(&[100.0, 150.0]), &schema)
            .unwrap();

        assert!(!Arc::ptr_eq(&old, &new));
        assert_eq!(new.summary.height(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().invalidations, 1);
        // The old snapshot stays valid for whoever still holds it
        assert_eq!(old.summary.height(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = WorkbookCache::new(2);
        let schema = Schema::builtin();
        let bytes = workbook_bytes(&[100.0]);

        cache.get_or_load("a.xlsx", &bytes, &schema).unwrap();
        cache.get_or_load("b.xlsx", &bytes, &schema).unwrap();
        cache.get_or_load("a.xlsx", &bytes, &schema).unwrap();
        cache.get_or_load("c.xlsx", &bytes, &schema).unwrap();

        assert_eq!(cache.len(), 2);
        // b was least recently used
        cache.get_or_load("b.xlsx", &bytes, &schema).unwrap();
        assert_eq!(cache.stats().misses, 4);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mut cache = WorkbookCache::new(2);
        assert!(cache
            .get_or_load("bad.xlsx", b"not a workbook", &Schema::builtin())
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_and_clear() {
        let mut cache = WorkbookCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache
            .get_or_load("a.xlsx", &workbook_bytes(&[1.0]), &Schema::builtin())
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
