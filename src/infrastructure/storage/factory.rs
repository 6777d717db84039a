//! Storage factory for runtime store selection

use std::sync::Arc;

use tracing::info;

use crate::domain::product::ProductRepository;
use crate::domain::DomainError;

use super::in_memory::InMemoryProductRepository;
use super::migrations::run_storage_migrations;
use super::postgres::{PostgresConfig, PostgresProductRepository};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres {
        config: PostgresConfig,
        /// Apply pending migrations after connecting
        run_migrations: bool,
    },
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig, run_migrations: bool) -> Self {
        Self::Postgres {
            config,
            run_migrations,
        }
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres { .. } => StorageType::Postgres,
        }
    }
}

/// Factory for creating product repositories
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a product repository based on the configuration
    pub async fn create(
        config: &StorageConfig,
    ) -> Result<Arc<dyn ProductRepository>, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory product store");
                Ok(Arc::new(InMemoryProductRepository::new()))
            }
            StorageConfig::Postgres {
                config,
                run_migrations,
            } => {
                let repository = PostgresProductRepository::connect(config).await?;

                if *run_migrations {
                    run_storage_migrations(repository.pool()).await?;
                }

                info!(
                    max_connections = config.max_connections,
                    "Connected to PostgreSQL product store"
                );
                Ok(Arc::new(repository))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!(StorageType::from_str("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("in_memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("Postgres"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("pg"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("unknown"), None);
    }

    #[test]
    fn test_storage_config_types() {
        assert_eq!(StorageConfig::in_memory().storage_type(), StorageType::InMemory);

        let postgres =
            StorageConfig::postgres(PostgresConfig::new("postgres://localhost/test"), true);
        assert_eq!(postgres.storage_type(), StorageType::Postgres);
    }

    #[tokio::test]
    async fn test_factory_creates_in_memory_store() {
        let repository = StorageFactory::create(&StorageConfig::in_memory())
            .await
            .unwrap();

        assert!(repository.health_check().await.is_ok());
        assert!(repository.find_all(10, 0).await.unwrap().is_empty());
    }
}
