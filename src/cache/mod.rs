//! Content-addressable response cache
//!
//! Records are keyed by the SHA-256 of a canonical request payload. Lookups and
//! writes are best-effort: a failing store degrades to a miss and never fails the
//! caller.

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::MemoryCache;

use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex SHA-256 digest identifying one cache record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn compute(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Hashes the compact JSON form of `payload` with object keys sorted
    ///
    /// Two payloads that differ only in key order produce the same key.
    pub fn for_payload(payload: &Value) -> Self {
        Self::compute(canonicalize(payload).to_string().as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuilds `value` with every object's keys inserted in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` on a miss or any read failure
    async fn get(&self, key: &CacheKey) -> Option<Value>;

    /// Stores `value`; failures are logged and swallowed
    async fn put(&self, key: &CacheKey, value: &Value);

    fn name(&self) -> &str;
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

#[async_trait]
impl CacheStore for NoopCache {
    async fn get(&self, _key: &CacheKey) -> Option<Value> {
        None
    }

    async fn put(&self, _key: &CacheKey, _value: &Value) {}

    fn name(&self) -> &str {
        "noop"
    }
}
