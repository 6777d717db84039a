//! Product service - catalog operations over the store and the write-through cache

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info};

use super::best_effort_cache::{BestEffortCache, CatalogIndex};
use super::cleanup::{CacheCleanupWorker, CleanupConfig, CleanupJob};
use super::pagination::Page;
use crate::domain::cache::{ProductCache, ProductKeyGenerator};
use crate::domain::product::{
    Product, ProductChanges, ProductDraft, ProductId, ProductOrdering, ProductRepository,
};
use crate::domain::DomainError;

/// Behavior switches for the product service
#[derive(Debug, Clone, Default)]
pub struct ProductServiceConfig {
    /// Write a product back into the cache after `get` had to read the store
    pub populate_on_read: bool,
    pub cleanup: CleanupConfig,
}

/// Catalog operations.
///
/// The repository is authoritative. The cache is written through on create
/// and update, consulted first on reads, and never allowed to fail a call.
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    cache: BestEffortCache,
    cleanup: CacheCleanupWorker,
    config: ProductServiceConfig,
}

impl fmt::Debug for ProductService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductService")
            .field("cache", &self.cache)
            .field("cleanup", &self.cleanup)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ProductService {
    /// Creates the service and starts its cache cleanup worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        cache: Arc<dyn ProductCache>,
        keys: Arc<dyn ProductKeyGenerator>,
        config: ProductServiceConfig,
    ) -> Self {
        let cache = BestEffortCache::new(cache, keys);
        let cleanup = CacheCleanupWorker::spawn(cache.clone(), config.cleanup.clone());

        Self {
            repository,
            cache,
            cleanup,
            config,
        }
    }

    /// Creates a product, or returns the existing one when an identical
    /// product is already cached.
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, DomainError> {
        let product = Product::new(draft)?;

        if let Some(cached) = self.cache.get_product(&product.id).await {
            if cached.business_eq(&product) {
                debug!(
                    product_id = %product.id,
                    "Identical product already exists, create is a no-op"
                );
                return Ok(cached);
            }

            return Err(DomainError::already_exists(format!(
                "Product with name '{}' and reference number '{}' already exists",
                product.name, product.reference_number
            )));
        }

        self.repository.create(&product).await.inspect_err(|e| {
            if !e.is_already_exists() {
                error!(product_id = %product.id, error = %e, "Failed to persist product");
            }
        })?;

        self.cache.store_product(&product).await;
        self.cache.index_product(&product).await;

        info!(product_id = %product.id, category = %product.category, "Product created");
        Ok(product)
    }

    /// Gets a product by id, preferring the cache
    pub async fn get(&self, id: &ProductId) -> Result<Product, DomainError> {
        if let Some(product) = self.cache.get_product(id).await {
            return Ok(product);
        }

        let product = self
            .repository
            .find_by_id(id)
            .await
            .map_err(|e| {
                error!(product_id = %id, error = %e, "Failed to load product");
                DomainError::internal(format!("Failed to load product '{}': {}", id, e))
            })?
            .ok_or_else(|| DomainError::not_found(format!("Product '{}' not found", id)))?;

        if self.config.populate_on_read {
            self.cache.store_product(&product).await;
        }

        Ok(product)
    }

    /// Applies changes to a product under optimistic concurrency.
    ///
    /// Returns the current product untouched when the changes have no effect.
    pub async fn update(
        &self,
        id: &ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        let current = match self.cache.get_product(id).await {
            Some(product) => product,
            None => self
                .repository
                .find_by_id(id)
                .await?
                .ok_or_else(|| DomainError::not_found(format!("Product '{}' not found", id)))?,
        };

        let updated = current.with_changes(changes)?;

        if updated.business_eq(&current) {
            debug!(product_id = %id, version = current.version, "Update has no effect");
            return Ok(current);
        }

        self.repository
            .update(&updated, current.version)
            .await
            .inspect_err(|e| {
                if !e.is_version_conflict() && !e.is_not_found() {
                    error!(product_id = %id, error = %e, "Failed to update product");
                }
            })?;

        self.cache.store_product(&updated).await;
        self.cache.reindex(&current, &updated).await;

        info!(
            product_id = %id,
            expected_version = current.version,
            version = updated.version,
            "Product updated"
        );
        Ok(updated)
    }

    /// Deletes a product. Cache cleanup runs in the background.
    pub async fn delete(&self, id: &ProductId) -> Result<(), DomainError> {
        let known = self.cache.get_product(id).await;

        self.repository.delete(id).await?;

        self.cleanup.submit(CleanupJob {
            id: id.clone(),
            known,
        });

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Lists products, newest first
    pub async fn list(&self, page: Page) -> Result<Vec<Product>, DomainError> {
        self.read_through(CatalogIndex::All, ProductOrdering::NewestFirst, page, || {
            self.repository.find_all(page.limit, page.offset)
        })
        .await
    }

    /// Searches products by name
    pub async fn search_by_name(
        &self,
        query: &str,
        page: Page,
    ) -> Result<Vec<Product>, DomainError> {
        self.read_through(CatalogIndex::Name(query), ProductOrdering::NameAsc, page, || {
            self.repository.find_by_name(query, page.limit, page.offset)
        })
        .await
    }

    /// Lists products in a category, newest first
    pub async fn search_by_category(
        &self,
        category: &str,
        page: Page,
    ) -> Result<Vec<Product>, DomainError> {
        self.read_through(
            CatalogIndex::Category(category),
            ProductOrdering::NewestFirst,
            page,
            || {
                self.repository
                    .find_by_category(category, page.limit, page.offset)
            },
        )
        .await
    }

    /// Probes the authoritative store
    pub async fn check_store(&self) -> Result<(), DomainError> {
        self.repository.health_check().await
    }

    /// Probes the cache
    pub async fn check_cache(&self) -> Result<(), DomainError> {
        self.cache.health_check().await
    }

    /// Waits for pending cache cleanup and stops the worker
    pub async fn shutdown(&self) {
        self.cleanup.shutdown().await;
    }

    /// Serves a page from the cache only when every indexed id is cached,
    /// otherwise runs the store query.
    async fn read_through<F, Fut>(
        &self,
        index: CatalogIndex<'_>,
        ordering: ProductOrdering,
        page: Page,
        store_query: F,
    ) -> Result<Vec<Product>, DomainError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Product>, DomainError>>,
    {
        let ids = self.cache.index_members(index).await;

        if ids.is_empty() {
            debug!(?index, "Cache index empty, reading store");
            return store_query().await;
        }

        match self.cache.fetch_products(&ids).await {
            Some(mut products) if products.len() == ids.len() => {
                debug!(?index, count = products.len(), "Serving page from cache");
                ordering.sort(&mut products);
                Ok(page.apply(products))
            }
            Some(products) => {
                debug!(
                    ?index,
                    indexed = ids.len(),
                    cached = products.len(),
                    "Partial cache hit, reading store"
                );
                store_query().await
            }
            None => store_query().await,
        }
    }
}
