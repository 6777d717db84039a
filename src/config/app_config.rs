use std::time::Duration;

use serde::Deserialize;

use crate::infrastructure::cache::{CacheConfig, CacheType, CodecType};
use crate::infrastructure::services::{CleanupConfig, ProductServiceConfig};
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub cleanup: CleanupSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Authoritative store selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `postgres` or `in_memory`
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `redis` or `in_memory`
    pub backend: String,
    pub redis_url: String,
    pub key_prefix: Option<String>,
    /// `json` or `msgpack`
    pub codec: String,
    pub connect_timeout_secs: u64,
    /// Write the entry back after `get` falls through to the store
    pub populate_on_read: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    pub timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "postgres".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        let pg = PostgresConfig::default();

        Self {
            url: pg.url,
            max_connections: pg.max_connections,
            min_connections: pg.min_connections,
            connect_timeout_secs: pg.connect_timeout_secs,
            idle_timeout_secs: pg.idle_timeout_secs,
            run_migrations: true,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "redis".to_string(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            codec: "json".to_string(),
            connect_timeout_secs: 5,
            populate_on_read: false,
        }
    }
}

impl Default for CleanupSettings {
    fn default() -> Self {
        let cleanup = CleanupConfig::default();

        Self {
            timeout_ms: cleanup.timeout.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Store settings for the storage factory
    pub fn storage_config(&self) -> Result<StorageConfig, config::ConfigError> {
        let storage_type = StorageType::from_str(&self.storage.backend).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "Unknown storage backend: {}. Valid backends: postgres, in_memory",
                self.storage.backend
            ))
        })?;

        Ok(match storage_type {
            StorageType::InMemory => StorageConfig::in_memory(),
            StorageType::Postgres => {
                StorageConfig::postgres(self.postgres_config(), self.database.run_migrations)
            }
        })
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig::new(self.database.url.clone())
            .with_max_connections(self.database.max_connections)
            .with_min_connections(self.database.min_connections)
            .with_connect_timeout(self.database.connect_timeout_secs)
            .with_idle_timeout(self.database.idle_timeout_secs)
    }

    /// Cache settings for the cache factory
    pub fn cache_config(&self) -> Result<CacheConfig, config::ConfigError> {
        let cache_type: CacheType = self
            .cache
            .backend
            .parse()
            .map_err(|e| config::ConfigError::Message(format!("{}", e)))?;
        let codec: CodecType = self
            .cache
            .codec
            .parse()
            .map_err(|e| config::ConfigError::Message(format!("{}", e)))?;

        let mut cache = match cache_type {
            CacheType::InMemory => CacheConfig::in_memory(),
            CacheType::Redis => CacheConfig::redis(self.cache.redis_url.clone()),
        };
        cache.connection_timeout = Duration::from_secs(self.cache.connect_timeout_secs);

        if let Some(prefix) = &self.cache.key_prefix {
            cache = cache.with_key_prefix(prefix.clone());
        }

        Ok(cache.with_codec(codec))
    }

    pub fn service_config(&self) -> ProductServiceConfig {
        ProductServiceConfig {
            populate_on_read: self.cache.populate_on_read,
            cleanup: CleanupConfig {
                timeout: Duration::from_millis(self.cleanup.timeout_ms),
            },
        }
    }
}
