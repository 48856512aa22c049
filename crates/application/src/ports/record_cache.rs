use hickory_proto::rr::{Record, RecordType};

/// Port for the TTL-bounded record store backing the resolver.
///
/// Keys are `(record type, owner name)` with case-insensitive names.
/// Expiry is entry-level: the whole record set for a key shares one
/// absolute deadline.
pub trait RecordCache: Send + Sync {
    /// Returns the stored records if present and unexpired. An expired
    /// entry is removed as a side effect and reported as a miss.
    fn get(&self, record_type: RecordType, name: &str) -> Option<Vec<Record>>;

    /// Replaces the entry for the key wholesale; expiry becomes now + ttl.
    fn insert(&self, record_type: RecordType, name: &str, records: Vec<Record>, ttl: u32);

    /// Appends one record to the entry for the key, resetting the whole
    /// entry's expiry from `ttl`. Atomic per key.
    fn merge(&self, record_type: RecordType, name: &str, record: Record, ttl: u32);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
