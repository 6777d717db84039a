//! Application state for shared services

use std::sync::Arc;

use crate::infrastructure::services::ProductService;

/// Application state shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub product_service: Arc<ProductService>,
}

impl AppState {
    pub fn new(product_service: Arc<ProductService>) -> Self {
        Self { product_service }
    }
}
