use std::any::Any;

use axum::{
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::health;
use super::middleware::logging_middleware;
use super::products;
use super::state::AppState;
use super::types::ApiError;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    let router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/products", products::create_products_router())
        .with_state(state);

    with_middleware(router)
}

/// Panic recovery, request logging and tracing, innermost first
fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    error!(panic = %detail, "Handler panicked");

    ApiError::internal("Internal server error")
        .with_code("internal_error")
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::cache::{DefaultProductKeyGenerator, MockProductCache};
    use crate::domain::product::ProductRepository;
    use crate::infrastructure::cache::InMemoryProductCache;
    use crate::infrastructure::services::{ProductService, ProductServiceConfig};
    use crate::infrastructure::storage::InMemoryProductRepository;

    fn state_with(
        repository: Arc<dyn ProductRepository>,
        cache: Arc<dyn crate::domain::cache::ProductCache>,
    ) -> AppState {
        let service = ProductService::new(
            repository,
            cache,
            Arc::new(DefaultProductKeyGenerator::new()),
            ProductServiceConfig::default(),
        );

        AppState::new(Arc::new(service))
    }

    fn app() -> Router {
        create_router_with_state(state_with(
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(InMemoryProductCache::new()),
        ))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    fn lamp() -> Value {
        json!({
            "name": "Desk Lamp",
            "referenceNumber": "L-1",
            "category": "Lighting",
            "brand": "Lumen",
            "stock": 3,
            "images": ["https://img.example.com/l-1.jpg"],
            "specifications": {"watts": 40}
        })
    }

    #[tokio::test]
    async fn test_product_lifecycle() {
        let app = app();

        let (status, created) = send(&app, "POST", "/products", Some(lamp())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["version"], 1);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, fetched) = send(&app, "GET", &format!("/products/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Desk Lamp");

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/products/{}", id),
            Some(json!({"stock": 9})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["version"], 2);
        assert_eq!(updated["stock"], 9);

        let (status, listed) = send(&app, "GET", "/products?limit=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["count"], 1);
        assert_eq!(listed["limit"], 10);

        let (status, _) = send(&app, "DELETE", &format!("/products/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        // the cache entry is removed in the background
        let uri = format!("/products/{}", id);
        let body = tokio::time::timeout(std::time::Duration::from_secs(2), async {
            loop {
                let (status, body) = send(&app, "GET", &uri, None).await;
                if status == StatusCode::NOT_FOUND {
                    break body;
                }
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("deleted product still served");
        assert_eq!(body["error"]["code"], "product_not_found");
    }

    #[tokio::test]
    async fn test_create_is_idempotent_and_conflicts_on_difference() {
        let app = app();

        let (_, first) = send(&app, "POST", "/products", Some(lamp())).await;
        let (status, second) = send(&app, "POST", "/products", Some(lamp())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(second["id"], first["id"]);
        assert_eq!(second["version"], 1);

        let mut changed = lamp();
        changed["stock"] = json!(50);
        let (status, body) = send(&app, "POST", "/products", Some(changed)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "product_exists");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = app();

        let mut negative = lamp();
        negative["stock"] = json!(-1);
        let (status, body) = send(&app, "POST", "/products", Some(negative)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");

        let (status, body) = send(&app, "POST", "/products", Some(json!({"name": "x"}))).await;
        assert!(status.is_client_error());
        assert_eq!(body["error"]["code"], "invalid_body");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let app = app();

        let (status, body) = send(&app, "GET", "/products/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_query");

        let (status, _) = send(&app, "GET", "/products/category?q=%20", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_endpoints() {
        let app = app();
        send(&app, "POST", "/products", Some(lamp())).await;

        let (status, by_name) = send(&app, "GET", "/products/search?q=lamp&limit=abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_name["count"], 1);
        assert_eq!(by_name["limit"], 50);

        let (status, by_category) = send(&app, "GET", "/products/category?q=lighting", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_category["products"][0]["referenceNumber"], "L-1");

        let (_, empty) = send(&app, "GET", "/products/category?q=garden", None).await;
        assert_eq!(empty["count"], 0);
    }

    #[tokio::test]
    async fn test_ready_is_degraded_when_cache_is_down() {
        let app = create_router_with_state(state_with(
            Arc::new(InMemoryProductRepository::new()),
            Arc::new(MockProductCache::new().with_error("connection refused")),
        ));

        let (status, body) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");

        // writes still succeed without the cache
        let (status, _) = send(&app, "POST", "/products", Some(lamp())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_ready_is_unavailable_when_store_is_down() {
        let mut repository = crate::domain::product::MockProductRepository::new();
        repository
            .expect_health_check()
            .returning(|| Err(crate::domain::DomainError::connection("db down")));

        let app = create_router_with_state(state_with(
            Arc::new(repository),
            Arc::new(InMemoryProductCache::new()),
        ));

        let (status, body) = send(&app, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
    }

    async fn exploding_handler() -> &'static str {
        panic!("exploded while handling request")
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_internal_error() {
        let app = with_middleware(Router::new().route("/explode", get(exploding_handler)));

        let (status, body) = send(&app, "GET", "/explode", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal_error");
        assert_eq!(body["error"]["type"], "server_error");

        // the router keeps serving after a panic
        let (status, _) = send(&app, "GET", "/explode", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
