//! Redis product cache implementation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::warn;

use super::codec::{JsonCodec, ProductCodec};
use crate::domain::cache::ProductCache;
use crate::domain::product::Product;
use crate::domain::DomainError;

/// Configuration for Redis cache
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Sets the connection timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis product cache
///
/// Entries are written with plain `SET` (no expiry), index sets use
/// `SADD`/`SREM`/`SMEMBERS` and batch reads go through a single pipeline.
#[derive(Clone)]
pub struct RedisProductCache {
    connection: ConnectionManager,
    codec: Arc<dyn ProductCodec>,
    config: RedisCacheConfig,
}

impl fmt::Debug for RedisProductCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisProductCache")
            .field("config", &self.config)
            .field("codec", &self.codec.name())
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisProductCache {
    /// Connects to Redis, encoding entries as JSON
    pub async fn new(config: RedisCacheConfig) -> Result<Self, DomainError> {
        Self::with_codec(config, Arc::new(JsonCodec)).await
    }

    /// Connects to Redis with the given codec
    pub async fn with_codec(
        config: RedisCacheConfig,
        codec: Arc<dyn ProductCodec>,
    ) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::connection(format!("Failed to create Redis client: {}", e)))?;

        let connection =
            tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
                .await
                .map_err(|_| {
                    DomainError::connection(format!(
                        "Timed out connecting to Redis after {:?}",
                        config.connection_timeout
                    ))
                })?
                .map_err(|e| {
                    DomainError::connection(format!("Failed to connect to Redis: {}", e))
                })?;

        Ok(Self {
            connection,
            codec,
            config,
        })
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

#[async_trait]
impl ProductCache for RedisProductCache {
    async fn get(&self, key: &str) -> Result<Option<Product>, DomainError> {
        let mut conn = self.connection.clone();

        let data: Option<Vec<u8>> = conn
            .get(self.prefix_key(key))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to get key '{}': {}", key, e)))?;

        data.map(|bytes| self.codec.decode(&bytes)).transpose()
    }

    async fn set(&self, key: &str, product: &Product) -> Result<(), DomainError> {
        let data = self.codec.encode(product)?;
        let mut conn = self.connection.clone();

        let _: () = conn
            .set(self.prefix_key(key), data)
            .await
            .map_err(|e| DomainError::cache(format!("Failed to set key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn
            .del(self.prefix_key(key))
            .await
            .map_err(|e| DomainError::cache(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(())
    }

    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn.sadd(self.prefix_key(set_key), member).await.map_err(|e| {
            DomainError::cache(format!("Failed to add to set '{}': {}", set_key, e))
        })?;

        Ok(())
    }

    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let _: i64 = conn.srem(self.prefix_key(set_key), member).await.map_err(|e| {
            DomainError::cache(format!("Failed to remove from set '{}': {}", set_key, e))
        })?;

        Ok(())
    }

    async fn get_set(&self, set_key: &str) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        let members: Vec<String> = conn.smembers(self.prefix_key(set_key)).await.map_err(|e| {
            DomainError::cache(format!("Failed to read set '{}': {}", set_key, e))
        })?;

        Ok(members)
    }

    async fn delete_set(&self, set_key: &str) -> Result<(), DomainError> {
        self.delete(set_key).await
    }

    async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Product>, DomainError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for key in keys {
            pipe.get(self.prefix_key(key));
        }

        let mut conn = self.connection.clone();
        let values: Vec<Option<Vec<u8>>> = pipe
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                DomainError::cache(format!("Failed to batch get {} keys: {}", keys.len(), e))
            })?;

        let mut products = Vec::with_capacity(values.len());

        for (key, value) in keys.iter().zip(values) {
            let Some(bytes) = value else {
                continue;
            };

            match self.codec.decode(&bytes) {
                Ok(product) => products.push(product),
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable cache entry"),
            }
        }

        Ok(products)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let exists: bool = conn.exists(self.prefix_key(key)).await.map_err(|e| {
            DomainError::cache(format!("Failed to check existence of key '{}': {}", key, e))
        })?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| DomainError::connection(format!("Redis ping failed: {}", e)))?;

        Ok(())
    }
}
