//! Infrastructure services

mod best_effort_cache;
mod cleanup;
mod pagination;
mod product_service;

pub use best_effort_cache::{BestEffortCache, CatalogIndex};
pub use cleanup::{CacheCleanupWorker, CleanupConfig, CleanupJob};
pub use pagination::{Page, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use product_service::{ProductService, ProductServiceConfig};
