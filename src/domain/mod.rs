//! Domain layer - Core business logic and entities

pub mod cache;
pub mod error;
pub mod product;

pub use cache::{DefaultProductKeyGenerator, ProductCache, ProductKeyGenerator};
pub use error::DomainError;
pub use product::{
    generate_product_id, normalize_attribute, validate_product_fields, Product, ProductChanges,
    ProductDraft, ProductId, ProductOrdering, ProductRepository, ProductValidationError,
    SpecValue, Specifications,
};
