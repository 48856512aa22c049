//! Whole-store cache snapshot persistence.
//!
//! Length-prefixed binary format over hickory wire encodings; no external
//! tool consumes this file. Layout: magic, version, entry count, then per
//! entry the key (type u16, name), expires_at epoch seconds, and each
//! record as a length-prefixed wire encoding. Big-endian throughout.

use super::cache::{epoch_seconds, CacheEntry, CacheKey, DnsCache};
use bytes::{Buf, BufMut};
use ember_dns_domain::DomainError;
use hickory_proto::rr::{Record, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncodable, BinEncoder};
use std::path::Path;
use tracing::{info, warn};

const MAGIC: &[u8; 4] = b"EDNS";
const VERSION: u8 = 1;

/// Loads a snapshot into `cache`, dropping entries already expired at
/// load time. A missing, truncated, or corrupt file is a normal startup
/// condition: the cache simply starts empty. Returns the entry count
/// restored.
pub fn load(path: &Path, cache: &DnsCache) -> usize {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => {
            info!(path = %path.display(), "No cache snapshot, starting empty");
            return 0;
        }
    };

    match decode_snapshot(&bytes, epoch_seconds()) {
        Ok(entries) => {
            let restored = entries.len();
            for (key, entry) in entries {
                cache.restore_entry(key, entry);
            }
            info!(path = %path.display(), entries = restored, "Cache snapshot restored");
            restored
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable cache snapshot, starting empty");
            0
        }
    }
}

/// Writes the full entry set, overwriting any prior snapshot. Entries
/// already expired are written as-is; load-time filtering handles them.
pub fn save(path: &Path, cache: &DnsCache) -> Result<(), DomainError> {
    let entries = cache.snapshot_entries();

    let mut buf = Vec::with_capacity(64 * entries.len() + 16);
    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);
    buf.put_u32(entries.len() as u32);

    for (key, entry) in &entries {
        buf.put_u16(u16::from(key.record_type));
        let name = key.name.as_bytes();
        buf.put_u16(name.len() as u16);
        buf.put_slice(name);
        buf.put_u64(entry.expires_at);
        buf.put_u32(entry.records.len() as u32);
        for record in &entry.records {
            let wire = encode_record(record)?;
            buf.put_u32(wire.len() as u32);
            buf.put_slice(&wire);
        }
    }

    std::fs::write(path, &buf)
        .map_err(|e| DomainError::SnapshotError(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), entries = entries.len(), "Cache snapshot written");
    Ok(())
}

fn encode_record(record: &Record) -> Result<Vec<u8>, DomainError> {
    let mut wire = Vec::with_capacity(64);
    let mut encoder = BinEncoder::new(&mut wire);
    record
        .emit(&mut encoder)
        .map_err(|e| DomainError::SnapshotError(format!("failed to encode record: {e}")))?;
    Ok(wire)
}

fn decode_snapshot(bytes: &[u8], now: u64) -> Result<Vec<(CacheKey, CacheEntry)>, DomainError> {
    let mut buf = bytes;

    need(buf, MAGIC.len() + 1 + 4)?;
    if &buf[..MAGIC.len()] != MAGIC {
        return Err(DomainError::SnapshotError("bad magic".to_string()));
    }
    buf.advance(MAGIC.len());
    let version = buf.get_u8();
    if version != VERSION {
        return Err(DomainError::SnapshotError(format!(
            "unsupported snapshot version {version}"
        )));
    }

    let entry_count = buf.get_u32();
    let mut entries = Vec::new();

    for _ in 0..entry_count {
        need(buf, 2 + 2)?;
        let record_type = RecordType::from(buf.get_u16());
        let name_len = buf.get_u16() as usize;
        need(buf, name_len)?;
        let name = std::str::from_utf8(&buf[..name_len])
            .map_err(|e| DomainError::SnapshotError(format!("bad owner name: {e}")))?
            .to_string();
        buf.advance(name_len);

        need(buf, 8 + 4)?;
        let expires_at = buf.get_u64();
        let record_count = buf.get_u32();

        // The count is untrusted file input; a crafted value must not
        // drive a huge preallocation. Truncation surfaces via need().
        let mut records = Vec::new();
        for _ in 0..record_count {
            need(buf, 4)?;
            let wire_len = buf.get_u32() as usize;
            need(buf, wire_len)?;
            let mut decoder = BinDecoder::new(&buf[..wire_len]);
            let record = Record::read(&mut decoder)
                .map_err(|e| DomainError::SnapshotError(format!("failed to decode record: {e}")))?;
            buf.advance(wire_len);
            records.push(record);
        }

        // Expired-on-load records are not resurrected.
        if expires_at > now {
            entries.push((
                CacheKey {
                    record_type,
                    name,
                },
                CacheEntry {
                    records,
                    expires_at,
                },
            ));
        }
    }

    Ok(entries)
}

fn need(buf: &[u8], n: usize) -> Result<(), DomainError> {
    if buf.remaining() < n {
        return Err(DomainError::SnapshotError(
            "truncated snapshot".to_string(),
        ));
    }
    Ok(())
}
