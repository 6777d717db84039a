//! Product cache trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::product::Product;
use crate::domain::DomainError;

/// Key/value store for products plus named id sets used as secondary indices.
///
/// Entries never expire; they are only replaced or deleted explicitly.
/// Every failure is advisory to callers.
#[async_trait]
pub trait ProductCache: Send + Sync + Debug {
    /// Gets a product entry
    async fn get(&self, key: &str) -> Result<Option<Product>, DomainError>;

    /// Stores a product entry without expiration
    async fn set(&self, key: &str, product: &Product) -> Result<(), DomainError>;

    /// Deletes an entry
    async fn delete(&self, key: &str) -> Result<(), DomainError>;

    /// Adds a member to a set
    async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), DomainError>;

    /// Removes a member from a set
    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), DomainError>;

    /// Returns all members of a set; a missing set is empty
    async fn get_set(&self, set_key: &str) -> Result<Vec<String>, DomainError>;

    /// Deletes a whole set
    async fn delete_set(&self, set_key: &str) -> Result<(), DomainError>;

    /// Fetches several entries in one round trip.
    ///
    /// Missing or undecodable entries are skipped, so the result may be
    /// shorter than `keys`.
    async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Product>, DomainError>;

    /// Checks if an entry exists
    async fn exists(&self, key: &str) -> Result<bool, DomainError>;

    /// Verifies the cache is reachable
    async fn health_check(&self) -> Result<(), DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Mock cache for testing
    #[derive(Debug, Default)]
    pub struct MockProductCache {
        entries: Mutex<HashMap<String, Product>>,
        sets: Mutex<HashMap<String, HashSet<String>>>,
        error: Mutex<Option<String>>,
        failing_operations: Mutex<HashSet<&'static str>>,
    }

    impl MockProductCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entry(self, key: &str, product: Product) -> Self {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), product);
            self
        }

        pub fn with_set_member(self, set_key: &str, member: &str) -> Self {
            self.sets
                .lock()
                .unwrap()
                .entry(set_key.to_string())
                .or_default()
                .insert(member.to_string());
            self
        }

        pub fn with_error(self, error: impl Into<String>) -> Self {
            *self.error.lock().unwrap() = Some(error.into());
            self
        }

        /// Makes only the named trait method fail, e.g. `"set"` or `"add_to_set"`
        pub fn with_failing_operation(self, operation: &'static str) -> Self {
            self.fail_operation(operation);
            self
        }

        pub fn fail_operation(&self, operation: &'static str) {
            self.failing_operations.lock().unwrap().insert(operation);
        }

        /// Makes every subsequent call fail
        pub fn fail_with(&self, error: impl Into<String>) {
            *self.error.lock().unwrap() = Some(error.into());
        }

        /// Restores normal behavior
        pub fn recover(&self) {
            *self.error.lock().unwrap() = None;
            self.failing_operations.lock().unwrap().clear();
        }

        pub fn entry(&self, key: &str) -> Option<Product> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        pub fn members(&self, set_key: &str) -> HashSet<String> {
            self.sets
                .lock()
                .unwrap()
                .get(set_key)
                .cloned()
                .unwrap_or_default()
        }

        fn check_error(&self, operation: &'static str) -> Result<(), DomainError> {
            if let Some(error) = self.error.lock().unwrap().clone() {
                return Err(DomainError::cache(error));
            }
            if self.failing_operations.lock().unwrap().contains(&operation) {
                return Err(DomainError::cache(format!("{} failed", operation)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ProductCache for MockProductCache {
        async fn get(&self, key: &str) -> Result<Option<Product>, DomainError> {
            self.check_error("get")?;
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, product: &Product) -> Result<(), DomainError> {
            self.check_error("set")?;
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), product.clone());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), DomainError> {
            self.check_error("delete")?;
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }

        async fn add_to_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
            self.check_error("add_to_set")?;
            self.sets
                .lock()
                .unwrap()
                .entry(set_key.to_string())
                .or_default()
                .insert(member.to_string());
            Ok(())
        }

        async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), DomainError> {
            self.check_error("remove_from_set")?;
            if let Some(set) = self.sets.lock().unwrap().get_mut(set_key) {
                set.remove(member);
            }
            Ok(())
        }

        async fn get_set(&self, set_key: &str) -> Result<Vec<String>, DomainError> {
            self.check_error("get_set")?;
            Ok(self
                .sets
                .lock()
                .unwrap()
                .get(set_key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn delete_set(&self, set_key: &str) -> Result<(), DomainError> {
            self.check_error("delete_set")?;
            self.sets.lock().unwrap().remove(set_key);
            Ok(())
        }

        async fn get_multiple(&self, keys: &[String]) -> Result<Vec<Product>, DomainError> {
            self.check_error("get_multiple")?;
            let entries = self.entries.lock().unwrap();

            Ok(keys.iter().filter_map(|k| entries.get(k).cloned()).collect())
        }

        async fn exists(&self, key: &str) -> Result<bool, DomainError> {
            self.check_error("exists")?;
            Ok(self.entries.lock().unwrap().contains_key(key))
        }

        async fn health_check(&self) -> Result<(), DomainError> {
            self.check_error("health_check")
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::product::ProductDraft;

        fn product() -> Product {
            Product::new(ProductDraft {
                name: "Desk Lamp".to_string(),
                reference_number: "LMP-1".to_string(),
                category: "home".to_string(),
                ..Default::default()
            })
            .unwrap()
        }

        #[tokio::test]
        async fn test_mock_cache_set_get() {
            let cache = MockProductCache::new();
            let product = product();

            cache.set("product_1", &product).await.unwrap();

            assert_eq!(cache.get("product_1").await.unwrap(), Some(product));
            assert!(cache.exists("product_1").await.unwrap());
        }

        #[tokio::test]
        async fn test_mock_cache_get_multiple_skips_missing() {
            let cache = MockProductCache::new().with_entry("product_1", product());

            let found = cache
                .get_multiple(&["product_1".to_string(), "product_2".to_string()])
                .await
                .unwrap();

            assert_eq!(found.len(), 1);
        }

        #[tokio::test]
        async fn test_mock_cache_sets() {
            let cache = MockProductCache::new();
            cache.add_to_set("all_products", "a").await.unwrap();
            cache.add_to_set("all_products", "b").await.unwrap();
            cache.remove_from_set("all_products", "a").await.unwrap();

            assert_eq!(cache.get_set("all_products").await.unwrap(), vec!["b"]);

            cache.delete_set("all_products").await.unwrap();
            assert!(cache.get_set("all_products").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_mock_cache_with_error() {
            let cache = MockProductCache::new().with_error("Test error");

            assert!(cache.get("key").await.is_err());
            assert!(cache.health_check().await.is_err());

            cache.recover();
            assert!(cache.health_check().await.is_ok());
        }

        #[tokio::test]
        async fn test_mock_cache_fails_only_the_named_operation() {
            let cache = MockProductCache::new().with_failing_operation("set");

            assert!(cache.set("product_1", &product()).await.is_err());
            assert!(cache.add_to_set("all_products", "product_1").await.is_ok());
            assert!(cache.get("product_1").await.unwrap().is_none());

            cache.recover();
            assert!(cache.set("product_1", &product()).await.is_ok());
        }
    }
}
