//! API request/response types

pub mod error;
pub mod json;
pub mod product;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use product::{
    CreateProductRequest, ListProductsResponse, PageParams, ProductResponse, SearchParams,
    UpdateProductRequest,
};
