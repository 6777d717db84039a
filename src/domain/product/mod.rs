//! Product domain - catalog entity, identity and persistence contract

mod entity;
mod identity;
mod repository;
mod validation;

pub use entity::{
    Product, ProductChanges, ProductDraft, ProductId, ProductOrdering, SpecValue, Specifications,
};
pub use identity::{generate_product_id, normalize_attribute};
pub use repository::ProductRepository;
pub use validation::{validate_product_fields, ProductValidationError};

#[cfg(test)]
pub use repository::MockProductRepository;
