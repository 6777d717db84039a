//! Product Catalog API
//!
//! Catalog of products kept in an authoritative Postgres store with:
//! - Deterministic product ids derived from name and reference number
//! - Optimistic concurrency through a per-product version
//! - A best-effort, write-through cache with name/category/all indices
//! - Detached cache cleanup after deletes

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::cache::DefaultProductKeyGenerator;
use infrastructure::{
    cache::CacheFactory,
    services::ProductService,
    storage::StorageFactory,
};
use tracing::info;

/// Connects the configured store and cache and starts the product service
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config.storage_config()?;
    info!(backend = ?storage_config.storage_type(), "Initializing product store");
    let repository = StorageFactory::create(&storage_config).await?;

    let cache_config = config.cache_config()?;
    info!(
        backend = %cache_config.cache_type,
        codec = %cache_config.codec,
        "Initializing product cache"
    );
    let cache = CacheFactory::new().create(&cache_config).await?;

    let service = ProductService::new(
        repository,
        cache,
        Arc::new(DefaultProductKeyGenerator::new()),
        config.service_config(),
    );

    Ok(AppState::new(Arc::new(service)))
}
