//! Product repository trait

use async_trait::async_trait;

use super::{Product, ProductId};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Authoritative product store with optimistic concurrency
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product, failing with `AlreadyExists` on id collision
    async fn create(&self, product: &Product) -> Result<(), DomainError>;

    /// Replaces the stored product only if its version equals `expected_version`.
    ///
    /// Fails with `NotFound` when the id is absent and `VersionConflict` when
    /// the stored version differs.
    async fn update(&self, product: &Product, expected_version: i64) -> Result<(), DomainError>;

    /// Removes a product, failing with `NotFound` when absent
    async fn delete(&self, id: &ProductId) -> Result<(), DomainError>;

    /// Finds a product by ID
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError>;

    /// Lists products, newest first
    async fn find_all(&self, limit: usize, offset: usize) -> Result<Vec<Product>, DomainError>;

    /// Lists products whose category equals `category` case-insensitively, newest first
    async fn find_by_category(
        &self,
        category: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError>;

    /// Lists products whose name contains `query` case-insensitively, by name
    async fn find_by_name(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError>;

    /// Checks whether a product exists
    async fn exists(&self, id: &ProductId) -> Result<bool, DomainError>;

    /// Verifies the store is reachable
    async fn health_check(&self) -> Result<(), DomainError>;
}
