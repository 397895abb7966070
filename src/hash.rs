use sha2::{Digest, Sha256};

use crate::constants::resolver::CACHE_KEY_LEN;
use crate::types::{ContentHash, RecordId};

/// Hex SHA-256 over a sequence of parts, each terminated by a NUL byte.
pub fn sha256_hex_parts(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Hash of a normalized document body used for exact deduplication.
pub fn content_hash(text: &str) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stable record id derived from source name, logical path, and content hash.
pub fn record_id(source: &str, path: &str, content_hash: &str) -> RecordId {
    sha256_hex_parts(&[source, path, content_hash])
}

/// Short cache key for a canonical remote (case and surrounding whitespace ignored).
pub fn cache_key(canonical_remote: &str) -> String {
    let digest = content_hash(&canonical_remote.trim().to_lowercase());
    digest[..CACHE_KEY_LEN].to_string()
}

/// Seeded ordering key; the sole source of split and sampling order.
pub fn stable_order_key(seed: u64, id: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(seed.to_le_bytes());
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
