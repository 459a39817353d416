use super::{CacheKey, CacheStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process cache, used in tests and for single-run memoization
#[derive(Debug, Default)]
pub struct MemoryCache {
    records: RwLock<HashMap<CacheKey, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Value> {
        self.records.read().ok()?.get(key).cloned()
    }

    async fn put(&self, key: &CacheKey, value: &Value) {
        if let Ok(mut records) = self.records.write() {
            records.insert(key.clone(), value.clone());
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
