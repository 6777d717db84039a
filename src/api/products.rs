//! Product catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CreateProductRequest, Json, ListProductsResponse, PageParams, ProductResponse,
    SearchParams, UpdateProductRequest,
};
use crate::domain::product::ProductId;

/// Routes mounted under `/products`
pub fn create_products_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_by_name))
        .route("/category", get(search_by_category))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// POST /products
pub async fn create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    debug!(name = %request.name, reference_number = %request.reference_number, "Creating product");

    let product = state.product_service.create(request.into()).await?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(&product))))
}

/// GET /products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state.product_service.get(&ProductId::new(id)).await?;

    Ok(Json(ProductResponse::from(&product)))
}

/// PUT /products/{id}
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    debug!(product_id = %id, "Updating product");

    let product = state
        .product_service
        .update(&ProductId::new(id), request.into())
        .await?;

    Ok(Json(ProductResponse::from(&product)))
}

/// DELETE /products/{id}
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(product_id = %id, "Deleting product");

    state.product_service.delete(&ProductId::new(id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /products
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let page = params.page();
    let products = state.product_service.list(page).await?;

    Ok(Json(ListProductsResponse::new(&products, page)))
}

/// GET /products/search?q=
pub async fn search_by_name(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let query = params
        .query()
        .ok_or_else(|| ApiError::invalid_query("Query parameter 'q' is required"))?;
    let page = params.page.page();

    let products = state.product_service.search_by_name(query, page).await?;

    Ok(Json(ListProductsResponse::new(&products, page)))
}

/// GET /products/category?q=
pub async fn search_by_category(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ListProductsResponse>, ApiError> {
    let category = params
        .query()
        .ok_or_else(|| ApiError::invalid_query("Query parameter 'q' is required"))?;
    let page = params.page.page();

    let products = state
        .product_service
        .search_by_category(category, page)
        .await?;

    Ok(Json(ListProductsResponse::new(&products, page)))
}
