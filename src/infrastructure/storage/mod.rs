//! Storage infrastructure - Product store implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use in_memory::InMemoryProductRepository;
pub use migrations::{run_storage_migrations, storage_migrations, Migration, PostgresMigrator};
pub use postgres::{PostgresConfig, PostgresProductRepository};
