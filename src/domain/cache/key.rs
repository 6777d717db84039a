//! Cache key conventions for product entries and index sets

use std::fmt::Debug;

use crate::domain::product::{normalize_attribute, ProductId};

const PRODUCT_KEY_PREFIX: &str = "product_";
const NAME_INDEX_PREFIX: &str = "product_by_name_";
const CATEGORY_INDEX_PREFIX: &str = "product_by_category_";
const ALL_PRODUCTS_KEY: &str = "all_products";

/// Produces the keys under which products and their index sets are cached
pub trait ProductKeyGenerator: Send + Sync + Debug {
    /// Key of the serialized product entry
    fn product_key(&self, id: &ProductId) -> String;

    /// Key of the set holding ids of products with the given name
    fn name_index_key(&self, name: &str) -> String;

    /// Key of the set holding ids of products in the given category
    fn category_index_key(&self, category: &str) -> String;

    /// Key of the set holding every cached product id
    fn all_products_key(&self) -> String;

    /// Keys of the entries for a batch of ids, in the same order
    fn product_keys(&self, ids: &[ProductId]) -> Vec<String> {
        ids.iter().map(|id| self.product_key(id)).collect()
    }
}

/// Fixed textual key layout: `product_{id}`, `product_by_name_{name}`,
/// `product_by_category_{category}` and `all_products`.
///
/// Index attributes are normalized (trim + lowercase); ids are used verbatim.
#[derive(Debug, Clone, Default)]
pub struct DefaultProductKeyGenerator;

impl DefaultProductKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl ProductKeyGenerator for DefaultProductKeyGenerator {
    fn product_key(&self, id: &ProductId) -> String {
        format!("{}{}", PRODUCT_KEY_PREFIX, id)
    }

    fn name_index_key(&self, name: &str) -> String {
        format!("{}{}", NAME_INDEX_PREFIX, normalize_attribute(name))
    }

    fn category_index_key(&self, category: &str) -> String {
        format!("{}{}", CATEGORY_INDEX_PREFIX, normalize_attribute(category))
    }

    fn all_products_key(&self) -> String {
        ALL_PRODUCTS_KEY.to_string()
    }
}
