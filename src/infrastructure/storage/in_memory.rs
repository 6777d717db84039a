//! In-memory product repository

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::product::{
    normalize_attribute, Product, ProductId, ProductOrdering, ProductRepository,
};
use crate::domain::DomainError;

/// Thread-safe in-memory product repository
///
/// Useful for testing and development. Data is lost when the process terminates.
/// Every write holds the lock for its full check-and-write, which makes the
/// version comparison in `update` atomic.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryProductRepository {
    /// Creates a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with products
    pub fn with_products(products: Vec<Product>) -> Self {
        let map = products
            .into_iter()
            .map(|p| (p.id.as_str().to_string(), p))
            .collect();

        Self {
            products: RwLock::new(map),
        }
    }

    fn read_lock_error(e: impl std::fmt::Display) -> DomainError {
        DomainError::storage(format!("Failed to acquire read lock: {}", e))
    }

    fn write_lock_error(e: impl std::fmt::Display) -> DomainError {
        DomainError::storage(format!("Failed to acquire write lock: {}", e))
    }

    fn select<F>(
        &self,
        filter: F,
        ordering: ProductOrdering,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError>
    where
        F: Fn(&Product) -> bool,
    {
        let products = self.products.read().map_err(Self::read_lock_error)?;

        let mut matches: Vec<Product> = products.values().filter(|p| filter(p)).cloned().collect();
        ordering.sort(&mut matches);

        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, product: &Product) -> Result<(), DomainError> {
        let mut products = self.products.write().map_err(Self::write_lock_error)?;

        if products.contains_key(product.id.as_str()) {
            return Err(DomainError::already_exists(format!(
                "Product '{}' already exists",
                product.id
            )));
        }

        products.insert(product.id.as_str().to_string(), product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product, expected_version: i64) -> Result<(), DomainError> {
        let mut products = self.products.write().map_err(Self::write_lock_error)?;

        let Some(stored) = products.get_mut(product.id.as_str()) else {
            return Err(DomainError::not_found(format!(
                "Product '{}' not found",
                product.id
            )));
        };

        if stored.version != expected_version {
            return Err(DomainError::version_conflict(
                product.id.as_str(),
                expected_version,
            ));
        }

        // created_at is owned by the store
        let created_at = stored.created_at;
        *stored = product.clone();
        stored.created_at = created_at;

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), DomainError> {
        let mut products = self.products.write().map_err(Self::write_lock_error)?;

        match products.remove(id.as_str()) {
            Some(_) => Ok(()),
            None => Err(DomainError::not_found(format!("Product '{}' not found", id))),
        }
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let products = self.products.read().map_err(Self::read_lock_error)?;
        Ok(products.get(id.as_str()).cloned())
    }

    async fn find_all(&self, limit: usize, offset: usize) -> Result<Vec<Product>, DomainError> {
        self.select(|_| true, ProductOrdering::NewestFirst, limit, offset)
    }

    async fn find_by_category(
        &self,
        category: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError> {
        let category = normalize_attribute(category);

        self.select(
            |p| normalize_attribute(&p.category) == category,
            ProductOrdering::NewestFirst,
            limit,
            offset,
        )
    }

    async fn find_by_name(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError> {
        let query = normalize_attribute(query);

        self.select(
            |p| p.name.to_lowercase().contains(&query),
            ProductOrdering::NameAsc,
            limit,
            offset,
        )
    }

    async fn exists(&self, id: &ProductId) -> Result<bool, DomainError> {
        let products = self.products.read().map_err(Self::read_lock_error)?;
        Ok(products.contains_key(id.as_str()))
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        let _products = self.products.read().map_err(Self::read_lock_error)?;
        Ok(())
    }
}
