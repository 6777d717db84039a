//! Product entity and related types

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::generate_product_id;
use super::validation::{validate_product_fields, ProductValidationError};

/// Product identifier - 26-character ULID derived from the business key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Schema-less specification value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<SpecValue>),
    Map(BTreeMap<String, SpecValue>),
}

impl From<&str> for SpecValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SpecValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SpecValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SpecValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SpecValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Ordered specification mapping
pub type Specifications = BTreeMap<String, SpecValue>;

/// Business attributes supplied when creating a product
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub reference_number: String,
    pub category: String,
    pub description: String,
    pub sku: String,
    pub brand: String,
    pub stock: i64,
    pub images: Vec<String>,
    pub specifications: Specifications,
}

/// Field changes applied by an update; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub stock: Option<i64>,
    pub images: Option<Vec<String>>,
    pub specifications: Option<Specifications>,
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub reference_number: String,
    pub category: String,
    pub description: String,
    pub sku: String,
    pub brand: String,
    pub stock: i64,
    pub images: Vec<String>,
    pub specifications: Specifications,
    /// Optimistic concurrency token, starts at 1
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a new version-1 product from a draft, trimming text fields and
    /// deriving the id from the business key.
    pub fn new(draft: ProductDraft) -> Result<Self, ProductValidationError> {
        let name = draft.name.trim().to_string();
        let reference_number = draft.reference_number.trim().to_string();
        let category = draft.category.trim().to_string();

        validate_product_fields(&name, &reference_number, &category, draft.stock)?;

        let now = Utc::now();
        Ok(Self {
            id: generate_product_id(&name, &reference_number),
            name,
            reference_number,
            category,
            description: draft.description.trim().to_string(),
            sku: draft.sku.trim().to_string(),
            brand: draft.brand.trim().to_string(),
            stock: draft.stock,
            images: draft.images,
            specifications: draft.specifications,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns a copy with the changes applied, the version bumped by one and
    /// `updated_at` refreshed. The id and reference number never change.
    pub fn with_changes(&self, changes: ProductChanges) -> Result<Self, ProductValidationError> {
        let mut updated = self.clone();

        if let Some(name) = changes.name {
            updated.name = name.trim().to_string();
        }

        if let Some(category) = changes.category {
            updated.category = category.trim().to_string();
        }

        if let Some(description) = changes.description {
            updated.description = description.trim().to_string();
        }

        if let Some(sku) = changes.sku {
            updated.sku = sku.trim().to_string();
        }

        if let Some(brand) = changes.brand {
            updated.brand = brand.trim().to_string();
        }

        if let Some(stock) = changes.stock {
            updated.stock = stock;
        }

        if let Some(images) = changes.images {
            updated.images = images;
        }

        if let Some(specifications) = changes.specifications {
            updated.specifications = specifications;
        }

        updated.version += 1;
        updated.updated_at = Utc::now();

        validate_product_fields(
            &updated.name,
            &updated.reference_number,
            &updated.category,
            updated.stock,
        )?;

        Ok(updated)
    }

    /// Compares business attributes only (id, version and timestamps excluded)
    pub fn business_eq(&self, other: &Product) -> bool {
        self.name == other.name
            && self.reference_number == other.reference_number
            && self.category == other.category
            && self.description == other.description
            && self.sku == other.sku
            && self.brand == other.brand
            && self.stock == other.stock
            && self.images == other.images
            && self.specifications == other.specifications
    }
}

/// Result orderings used by listing queries.
///
/// Strings compare byte-wise, so uppercase sorts before lowercase. The
/// Postgres store orders with `COLLATE "C"` to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrdering {
    /// `created_at` descending, then id
    NewestFirst,
    /// `name` ascending, then id
    NameAsc,
}

impl ProductOrdering {
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            Self::NewestFirst => b
                .created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id)),
            Self::NameAsc => a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)),
        }
    }

    pub fn sort(self, products: &mut [Product]) {
        products.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ProductDraft {
        let mut specifications = Specifications::new();
        specifications.insert("storage".to_string(), SpecValue::from("256GB"));
        specifications.insert("weight_g".to_string(), SpecValue::from(187));

        ProductDraft {
            name: "  iPhone 15 Pro ".to_string(),
            reference_number: "REF-12345".to_string(),
            category: "electronics".to_string(),
            description: "Smartphone".to_string(),
            sku: "SKU-IP15P-256".to_string(),
            brand: "Apple".to_string(),
            stock: 100,
            images: vec!["https://example.com/1.jpg".to_string()],
            specifications,
        }
    }

    #[test]
    fn test_new_product_trims_and_starts_at_version_one() {
        let product = Product::new(draft()).unwrap();

        assert_eq!(product.name, "iPhone 15 Pro");
        assert_eq!(product.version, 1);
        assert_eq!(product.created_at, product.updated_at);
        assert_eq!(
            product.id,
            generate_product_id("iphone 15 pro", "ref-12345")
        );
    }

    #[test]
    fn test_new_product_rejects_negative_stock() {
        let mut input = draft();
        input.stock = -1;

        assert!(matches!(
            Product::new(input),
            Err(ProductValidationError::NegativeStock { value: -1 })
        ));
    }

    #[test]
    fn test_with_changes_bumps_version_and_keeps_identity() {
        let product = Product::new(draft()).unwrap();
        let updated = product
            .with_changes(ProductChanges {
                name: Some("iPhone 15 Pro Max".to_string()),
                stock: Some(50),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.id, product.id);
        assert_eq!(updated.reference_number, product.reference_number);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.stock, 50);
        assert_eq!(updated.brand, "Apple");
        assert!(!updated.business_eq(&product));
    }

    #[test]
    fn test_with_changes_validates_result() {
        let product = Product::new(draft()).unwrap();
        let result = product.with_changes(ProductChanges {
            category: Some("   ".to_string()),
            ..Default::default()
        });

        assert_eq!(result.unwrap_err(), ProductValidationError::EmptyCategory);
    }

    #[test]
    fn test_business_eq_ignores_version_and_timestamps() {
        let product = Product::new(draft()).unwrap();
        let unchanged = product.with_changes(ProductChanges::default()).unwrap();

        assert_ne!(unchanged.version, product.version);
        assert!(unchanged.business_eq(&product));
    }

    #[test]
    fn test_business_eq_detects_specification_change() {
        let product = Product::new(draft()).unwrap();
        let mut other = product.clone();
        other
            .specifications
            .insert("color".to_string(), SpecValue::from("black"));

        assert!(!product.business_eq(&other));
    }

    #[test]
    fn test_spec_value_deserializes_untagged_json() {
        let specs: Specifications = serde_json::from_str(
            r#"{"a": null, "b": true, "c": 3, "d": 1.5,
                "e": "x", "f": [1, "y"], "g": {"h": false}}"#,
        )
        .unwrap();

        assert_eq!(specs["a"], SpecValue::Null);
        assert_eq!(specs["b"], SpecValue::Bool(true));
        assert_eq!(specs["c"], SpecValue::Int(3));
        assert_eq!(specs["d"], SpecValue::Float(1.5));
        assert_eq!(specs["e"], SpecValue::Text("x".to_string()));
        assert_eq!(
            specs["f"],
            SpecValue::List(vec![SpecValue::Int(1), SpecValue::from("y")])
        );
        assert!(matches!(specs["g"], SpecValue::Map(_)));
    }

    #[test]
    fn test_orderings() {
        let older = Product::new(draft()).unwrap();
        let mut newer = Product::new(ProductDraft {
            name: "AirPods".to_string(),
            reference_number: "REF-2".to_string(),
            ..draft()
        })
        .unwrap();
        newer.created_at = older.created_at + chrono::Duration::seconds(1);

        let mut products = vec![older.clone(), newer.clone()];
        ProductOrdering::NewestFirst.sort(&mut products);
        assert_eq!(products[0].id, newer.id);

        let mut products = vec![older.clone(), newer.clone()];
        ProductOrdering::NameAsc.sort(&mut products);
        assert_eq!(products[0].name, "AirPods");
    }

    #[test]
    fn test_name_ordering_is_bytewise_for_mixed_case() {
        let mut products: Vec<Product> = ["apple", "Zebra", "banana", "Apple"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Product::new(ProductDraft {
                    name: name.to_string(),
                    reference_number: format!("REF-{}", i),
                    ..draft()
                })
                .unwrap()
            })
            .collect();

        ProductOrdering::NameAsc.sort(&mut products);

        let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Apple", "Zebra", "apple", "banana"]);
    }
}
