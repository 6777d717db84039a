//! Degrade-on-failure wrapper around the product cache
//!
//! Every cache call made by the catalog goes through [`BestEffortCache`].
//! Failures are logged at `warn` and turned into a neutral value, so no cache
//! error ever reaches a caller.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::cache::{ProductCache, ProductKeyGenerator};
use crate::domain::product::{normalize_attribute, Product, ProductId};
use crate::domain::DomainError;

/// A secondary index over cached product ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogIndex<'a> {
    All,
    Name(&'a str),
    Category(&'a str),
}

impl CatalogIndex<'_> {
    fn key(&self, keys: &dyn ProductKeyGenerator) -> String {
        match self {
            CatalogIndex::All => keys.all_products_key(),
            CatalogIndex::Name(name) => keys.name_index_key(name),
            CatalogIndex::Category(category) => keys.category_index_key(category),
        }
    }
}

#[derive(Clone)]
pub struct BestEffortCache {
    cache: Arc<dyn ProductCache>,
    keys: Arc<dyn ProductKeyGenerator>,
}

impl fmt::Debug for BestEffortCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestEffortCache")
            .field("cache", &self.cache)
            .field("keys", &self.keys)
            .finish()
    }
}

impl BestEffortCache {
    pub fn new(cache: Arc<dyn ProductCache>, keys: Arc<dyn ProductKeyGenerator>) -> Self {
        Self { cache, keys }
    }

    /// Cached product for `id`; `None` on miss or failure
    pub async fn get_product(&self, id: &ProductId) -> Option<Product> {
        let key = self.keys.product_key(id);

        match self.cache.get(&key).await {
            Ok(Some(product)) => {
                debug!(product_id = %id, "Product cache hit");
                Some(product)
            }
            Ok(None) => {
                debug!(product_id = %id, "Product cache miss");
                None
            }
            Err(e) => {
                warn!(product_id = %id, key = %key, error = %e, "Product cache read failed");
                None
            }
        }
    }

    /// Writes (or overwrites) the product entry
    pub async fn store_product(&self, product: &Product) {
        let key = self.keys.product_key(&product.id);

        if let Err(e) = self.cache.set(&key, product).await {
            warn!(product_id = %product.id, key = %key, error = %e, "Failed to cache product");
        }
    }

    /// Adds the product to the all, name and category indices.
    ///
    /// Each membership is written independently.
    pub async fn index_product(&self, product: &Product) {
        let member = product.id.as_str();

        self.add_member(&self.keys.all_products_key(), member).await;
        self.add_member(&self.keys.name_index_key(&product.name), member).await;
        self.add_member(&self.keys.category_index_key(&product.category), member).await;
    }

    /// Moves the product between name/category indices after an update
    pub async fn reindex(&self, previous: &Product, current: &Product) {
        let member = current.id.as_str();

        if normalize_attribute(&previous.category) != normalize_attribute(&current.category) {
            self.remove_member(&self.keys.category_index_key(&previous.category), member).await;
            self.add_member(&self.keys.category_index_key(&current.category), member).await;
        }

        if normalize_attribute(&previous.name) != normalize_attribute(&current.name) {
            self.remove_member(&self.keys.name_index_key(&previous.name), member).await;
            self.add_member(&self.keys.name_index_key(&current.name), member).await;
        }
    }

    /// Drops the entry and every index membership that can be derived.
    ///
    /// Without a known product only the entry and the all index are cleaned.
    pub async fn remove_product(&self, id: &ProductId, known: Option<&Product>) {
        let key = self.keys.product_key(id);

        if let Err(e) = self.cache.delete(&key).await {
            warn!(product_id = %id, key = %key, error = %e, "Failed to delete cached product");
        }

        self.remove_member(&self.keys.all_products_key(), id.as_str()).await;

        if let Some(product) = known {
            self.remove_member(&self.keys.name_index_key(&product.name), id.as_str()).await;
            self.remove_member(&self.keys.category_index_key(&product.category), id.as_str()).await;
        }
    }

    /// Ids listed in an index; empty on failure
    pub async fn index_members(&self, index: CatalogIndex<'_>) -> Vec<ProductId> {
        let key = index.key(self.keys.as_ref());

        match self.cache.get_set(&key).await {
            Ok(members) => members.into_iter().map(ProductId::from).collect(),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache index");
                Vec::new()
            }
        }
    }

    /// Batch-fetches cached products; `None` on failure.
    ///
    /// The result may be shorter than `ids` when entries are missing.
    pub async fn fetch_products(&self, ids: &[ProductId]) -> Option<Vec<Product>> {
        let keys = self.keys.product_keys(ids);

        match self.cache.get_multiple(&keys).await {
            Ok(products) => Some(products),
            Err(e) => {
                warn!(requested = ids.len(), error = %e, "Batch cache read failed");
                None
            }
        }
    }

    /// Probes the underlying cache without swallowing the error
    pub async fn health_check(&self) -> Result<(), DomainError> {
        self.cache.health_check().await
    }

    async fn add_member(&self, set_key: &str, member: &str) {
        if let Err(e) = self.cache.add_to_set(set_key, member).await {
            warn!(key = %set_key, product_id = %member, error = %e, "Failed to add to cache index");
        }
    }

    async fn remove_member(&self, set_key: &str, member: &str) {
        if let Err(e) = self.cache.remove_from_set(set_key, member).await {
            warn!(
                key = %set_key,
                product_id = %member,
                error = %e,
                "Failed to remove from cache index"
            );
        }
    }
}
