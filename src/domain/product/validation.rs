//! Product validation rules

use std::fmt;

use crate::domain::DomainError;

/// Product validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ProductValidationError {
    /// Name is empty after trimming
    EmptyName,
    /// Reference number is empty after trimming
    EmptyReferenceNumber,
    /// Category is empty after trimming
    EmptyCategory,
    /// Stock is below zero
    NegativeStock { value: i64 },
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "product name is required"),
            Self::EmptyReferenceNumber => write!(f, "product reference number is required"),
            Self::EmptyCategory => write!(f, "product category is required"),
            Self::NegativeStock { value } => {
                write!(f, "product stock cannot be negative (got {})", value)
            }
        }
    }
}

impl std::error::Error for ProductValidationError {}

impl From<ProductValidationError> for DomainError {
    fn from(error: ProductValidationError) -> Self {
        DomainError::validation(error.to_string())
    }
}

/// Checks the required business attributes of a product.
pub fn validate_product_fields(
    name: &str,
    reference_number: &str,
    category: &str,
    stock: i64,
) -> Result<(), ProductValidationError> {
    if name.trim().is_empty() {
        return Err(ProductValidationError::EmptyName);
    }

    if reference_number.trim().is_empty() {
        return Err(ProductValidationError::EmptyReferenceNumber);
    }

    if category.trim().is_empty() {
        return Err(ProductValidationError::EmptyCategory);
    }

    if stock < 0 {
        return Err(ProductValidationError::NegativeStock { value: stock });
    }

    Ok(())
}
