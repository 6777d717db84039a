//! In-memory product cache implementation using moka

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;
use tracing::warn;

use super::codec::{JsonCodec, ProductCodec};
use crate::domain::cache::ProductCache;
use crate::domain::product::Product;
use crate::domain::DomainError;

/// Thread-safe in-memory product cache
///
/// Entries are encoded with the configured codec and kept in an unbounded
/// moka cache with no TTL, so behavior matches the Redis backend.
#[derive(Debug)]
pub struct InMemoryProductCache {
    entries: MokaCache<String, Arc<Vec<u8>>>,
    sets: RwLock<HashMap<String, HashSet<String>>>,
    codec: Arc<dyn ProductCodec>,
}

impl InMemoryProductCache {
    /// Creates a new in-memory cache encoding entries as JSON
    pub fn new() -> Self {
        Self::with_codec(Arc::new(JsonCodec))
    }

    /// Creates a new in-memory cache with the given codec
    pub fn with_codec(codec: Arc<dyn ProductCodec>) -> Self {
        Self {
            entries: MokaCache::builder().build(),
            sets: RwLock::new(HashMap::new()),
            codec,
        }
    }

    /// Stores raw bytes under a key, bypassing the codec
    pub async fn insert_raw(&self, key: &str, data: Vec<u8>) {
        self.entries.insert(key.to_string(), Arc::new(data)).await;
    }

    fn lock_error() -> DomainError {
        DomainError::cache("In-memory cache set lock poisoned")
    }
}

impl Default for InMemoryProductCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCache for InMemoryProductCache {
    async fn get(&self, key: &str) -> Result<Option<Product>, DomainError> {
        match self.entries.get(key).await {
            Some(data) => self.codec.decode(&data).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, product: &Product) -> Result<(), DomainError> {
        let data = self.codec.encode(product)?;
        self.entries.insert(key.to_string(), Arc::new(data)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
        let mut sets = self.sets.write().map_err(|_| Self::lock_error())?;

        sets.entry(set_key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
        let mut sets = self.sets.write().map_err(|_| Self::lock_error())?;

        if let Some(set) = sets.get_mut(set_key) {
            set.remove(member);

            if set.is_empty() {
                sets.remove(set_key);
            }
        }
        Ok(())
    }

    async fn get_set(&self, set_key: &str) -> Result<Vec<String>, DomainError> {
        let sets = self.sets.read().map_err(|_| Self::lock_error())?;

        Ok(sets
            .get(set_key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_set(&self, set_key: &str) -> Result<(), DomainError> {
        let mut sets = self.sets.write().map_err(|_| Self::lock_error())?;
        sets.remove(set_key);
        Ok(())
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Product>, DomainError> {
        let mut products = Vec::with_capacity(keys.len());

        for key in keys {
            let Some(data) = self.entries.get(key).await else {
                continue;
            };

            match self.codec.decode(&data) {
                Ok(product) => products.push(product),
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable cache entry"),
            }
        }

        Ok(products)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.entries.contains_key(key))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
