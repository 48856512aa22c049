use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ember_dns_application::ports::RecordCache;
use hickory_proto::rr::{Record, RecordType};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Cache key: record type plus ASCII-lowercased owner name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub record_type: RecordType,
    pub name: String,
}

impl CacheKey {
    pub fn new(record_type: RecordType, name: &str) -> Self {
        Self {
            record_type,
            name: name.to_ascii_lowercase(),
        }
    }
}

/// One cached record set with a single entry-level deadline.
///
/// Expiry is not tracked per record: a merge rekeys the whole set's
/// deadline from the merged record's TTL.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub records: Vec<Record>,
    /// Absolute expiry, epoch seconds.
    pub expires_at: u64,
}

impl CacheEntry {
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}

#[derive(Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub insertions: AtomicU64,
    pub expired_removals: AtomicU64,
}

impl CacheMetrics {
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let total = hits + self.misses.load(Ordering::Relaxed) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }
}

pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// TTL-bounded record store. Expired entries are removed lazily on read;
/// there is no background sweep, so memory is bounded by the number of
/// distinct (type, name) keys ever cached.
pub struct DnsCache {
    entries: DashMap<CacheKey, CacheEntry, FxBuildHasher>,
    metrics: Arc<CacheMetrics>,
}

impl DnsCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(1024, FxBuildHasher::default()),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Expiry-aware lookup against an explicit clock. The expired branch
    /// removes the entry under the shard lock, so a concurrent merge for
    /// the same key cannot interleave with the delete.
    pub fn get_at(
        &self,
        record_type: RecordType,
        name: &str,
        now: u64,
    ) -> Option<Vec<Record>> {
        let key = CacheKey::new(record_type, name);

        if self
            .entries
            .remove_if(&key, |_, entry| entry.is_expired_at(now))
            .is_some()
        {
            debug!(name = %key.name, record_type = %record_type, "Expired entry removed");
            self.metrics.expired_removals.fetch_add(1, Ordering::Relaxed);
            self.metrics.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        match self.entries.get(&key) {
            Some(entry) => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.records.clone())
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Replaces the entry for the key; no merging with prior records.
    pub fn insert_at(
        &self,
        record_type: RecordType,
        name: &str,
        records: Vec<Record>,
        ttl: u32,
        now: u64,
    ) {
        let key = CacheKey::new(record_type, name);
        self.entries.insert(
            key,
            CacheEntry {
                records,
                expires_at: now + u64::from(ttl),
            },
        );
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Appends one record under the entry lock. An entry already expired
    /// at merge time is treated as absent and restarted from scratch. The
    /// whole set's deadline is rekeyed from `ttl`, so the latest merge
    /// wins for every record sharing the key.
    pub fn merge_at(
        &self,
        record_type: RecordType,
        name: &str,
        record: Record,
        ttl: u32,
        now: u64,
    ) {
        let key = CacheKey::new(record_type, name);
        let expires_at = now + u64::from(ttl);

        match self.entries.entry(key) {
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                if entry.is_expired_at(now) {
                    entry.records.clear();
                }
                entry.records.push(record);
                entry.expires_at = expires_at;
            }
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry {
                    records: vec![record],
                    expires_at,
                });
            }
        }
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Full contents for snapshot writing. Expired entries are included
    /// as-is; filtering happens on load.
    pub fn snapshot_entries(&self) -> Vec<(CacheKey, CacheEntry)> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Restores one entry verbatim, used by the snapshot loader.
    pub fn restore_entry(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }
}

impl Default for DnsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordCache for DnsCache {
    fn get(&self, record_type: RecordType, name: &str) -> Option<Vec<Record>> {
        self.get_at(record_type, name, epoch_seconds())
    }

    fn insert(&self, record_type: RecordType, name: &str, records: Vec<Record>, ttl: u32) {
        self.insert_at(record_type, name, records, ttl, epoch_seconds());
    }

    fn merge(&self, record_type: RecordType, name: &str, record: Record, ttl: u32) {
        self.merge_at(record_type, name, record, ttl, epoch_seconds());
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
