//! PostgreSQL product repository with connection pooling

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::Row;

use crate::domain::product::{Product, ProductId, ProductRepository, Specifications};
use crate::domain::DomainError;

const PRODUCT_COLUMNS: &str = "id, name, reference_number, category, description, sku, brand, \
     stock, images, specifications, version, created_at, updated_at";

// Byte-wise collation so results match `ProductOrdering` regardless of the
// database locale.
const ORDER_NEWEST_FIRST: &str = "created_at DESC, id COLLATE \"C\"";
const ORDER_NAME_ASC: &str = "name COLLATE \"C\" ASC, id COLLATE \"C\"";

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/product_catalog".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    /// Opens a connection pool with these settings
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::connection(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

/// Product repository backed by the `products` table
///
/// Images and specifications are stored as JSONB. Updates are a single
/// `UPDATE ... WHERE id = $1 AND version = $n` statement, so the version
/// check and the write are atomic.
#[derive(Clone)]
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl Debug for PostgresProductRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresProductRepository")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a repository with its own connection pool
    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        Ok(Self::new(config.connect().await?))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_page(
        &self,
        query: &str,
        filter: Option<String>,
        limit: usize,
        offset: usize,
        context: &str,
    ) -> Result<Vec<Product>, DomainError> {
        let mut q = sqlx::query(query);

        if let Some(filter) = filter {
            q = q.bind(filter);
        }

        let rows = q
            .bind(to_i64(limit))
            .bind(to_i64(offset))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(context, e))?;

        rows.iter().map(row_to_product).collect()
    }
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Escapes LIKE metacharacters so the query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());

    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn map_sqlx_error(context: &str, e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DomainError::connection(format!("{}: {}", context, e))
        }
        _ => DomainError::storage(format!("{}: {}", context, e)),
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, DomainError> {
    let decode = |e: sqlx::Error| map_sqlx_error("Failed to decode product row", e);

    let id: String = row.try_get("id").map_err(decode)?;
    let images: Json<Vec<String>> = row.try_get("images").map_err(decode)?;
    let specifications: Json<Specifications> = row.try_get("specifications").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(Product {
        id: ProductId::new(id),
        name: row.try_get("name").map_err(decode)?,
        reference_number: row.try_get("reference_number").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        sku: row.try_get("sku").map_err(decode)?,
        brand: row.try_get("brand").map_err(decode)?,
        stock: row.try_get("stock").map_err(decode)?,
        images: images.0,
        specifications: specifications.0,
        version: row.try_get("version").map_err(decode)?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, product: &Product) -> Result<(), DomainError> {
        let query = format!(
            "INSERT INTO products ({}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
            PRODUCT_COLUMNS
        );

        sqlx::query(&query)
            .bind(product.id.as_str())
            .bind(&product.name)
            .bind(&product.reference_number)
            .bind(&product.category)
            .bind(&product.description)
            .bind(&product.sku)
            .bind(&product.brand)
            .bind(product.stock)
            .bind(Json(&product.images))
            .bind(Json(&product.specifications))
            .bind(product.version)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::already_exists(format!(
                        "Product '{}' already exists",
                        product.id
                    ))
                } else {
                    map_sqlx_error("Failed to create product", e)
                }
            })?;

        Ok(())
    }

    async fn update(&self, product: &Product, expected_version: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, category = $3, description = $4, sku = $5, brand = $6,
                stock = $7, images = $8, specifications = $9, version = $10, updated_at = $11
            WHERE id = $1 AND version = $12
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.brand)
        .bind(product.stock)
        .bind(Json(&product.images))
        .bind(Json(&product.specifications))
        .bind(product.version)
        .bind(product.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to update product", e))?;

        if result.rows_affected() == 0 {
            if self.exists(&product.id).await? {
                return Err(DomainError::version_conflict(
                    product.id.as_str(),
                    expected_version,
                ));
            }

            return Err(DomainError::not_found(format!(
                "Product '{}' not found",
                product.id
            )));
        }

        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete product", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!("Product '{}' not found", id)));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DomainError> {
        let query = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get product", e))?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn find_all(&self, limit: usize, offset: usize) -> Result<Vec<Product>, DomainError> {
        let query = format!(
            "SELECT {} FROM products ORDER BY {} LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS, ORDER_NEWEST_FIRST
        );

        self.fetch_page(&query, None, limit, offset, "Failed to list products")
            .await
    }

    async fn find_by_category(
        &self,
        category: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError> {
        let query = format!(
            "SELECT {} FROM products WHERE LOWER(category) = LOWER($1) \
             ORDER BY {} LIMIT $2 OFFSET $3",
            PRODUCT_COLUMNS, ORDER_NEWEST_FIRST
        );

        self.fetch_page(
            &query,
            Some(category.trim().to_string()),
            limit,
            offset,
            "Failed to find products by category",
        )
        .await
    }

    async fn find_by_name(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Product>, DomainError> {
        let sql = format!(
            "SELECT {} FROM products WHERE LOWER(name) LIKE LOWER($1) ESCAPE '\\' \
             ORDER BY {} LIMIT $2 OFFSET $3",
            PRODUCT_COLUMNS, ORDER_NAME_ASC
        );

        let pattern = format!("%{}%", escape_like(query.trim()));

        self.fetch_page(
            &sql,
            Some(pattern),
            limit,
            offset,
            "Failed to find products by name",
        )
        .await
    }

    async fn exists(&self, id: &ProductId) -> Result<bool, DomainError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("Failed to check product existence", e))?;

        Ok(exists)
    }

    async fn health_check(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("Database health check failed", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{ProductChanges, ProductDraft, ProductOrdering};
    use crate::infrastructure::storage::migrations::run_storage_migrations;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.idle_timeout_secs, 600);
    }

    #[test]
    fn test_postgres_config_builder() {
        let config = PostgresConfig::new("postgres://localhost/test")
            .with_max_connections(20)
            .with_min_connections(5)
            .with_connect_timeout(60)
            .with_idle_timeout(300);

        assert_eq!(config.url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.min_connections, 5);
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(config.idle_timeout_secs, 300);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_sale"), "50\\% off\\_sale");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_pool_errors_map_to_connection() {
        assert!(matches!(
            map_sqlx_error("ctx", sqlx::Error::PoolTimedOut),
            DomainError::Connection { .. }
        ));
        assert!(matches!(
            map_sqlx_error("ctx", sqlx::Error::RowNotFound),
            DomainError::Storage { .. }
        ));
    }

    // These tests require a running PostgreSQL instance
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored
    async fn test_repository() -> PostgresProductRepository {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/product_catalog_test".to_string());
        let repository = PostgresProductRepository::connect(&PostgresConfig::new(url))
            .await
            .unwrap();
        run_storage_migrations(repository.pool()).await.unwrap();
        repository
    }

    fn product(reference: &str) -> Product {
        Product::new(ProductDraft {
            name: "Postgres Widget".to_string(),
            reference_number: reference.to_string(),
            category: "Integration".to_string(),
            stock: 1,
            images: vec!["front.jpg".to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_create_find_and_delete() {
        let repository = test_repository().await;
        let product = product(&uuid::Uuid::new_v4().to_string());

        repository.create(&product).await.unwrap();
        let err = repository.create(&product).await.unwrap_err();
        assert!(err.is_already_exists());

        let found = repository.find_by_id(&product.id).await.unwrap().unwrap();
        assert!(found.business_eq(&product));

        let by_category = repository
            .find_by_category("integration", 100, 0)
            .await
            .unwrap();
        assert!(by_category.iter().any(|p| p.id == product.id));

        repository.delete(&product.id).await.unwrap();
        assert!(repository.delete(&product.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_update_distinguishes_conflict_from_missing() {
        let repository = test_repository().await;
        let product = product(&uuid::Uuid::new_v4().to_string());
        repository.create(&product).await.unwrap();

        let updated = product
            .with_changes(ProductChanges {
                stock: Some(9),
                ..Default::default()
            })
            .unwrap();
        repository.update(&updated, 1).await.unwrap();

        let err = repository.update(&updated, 1).await.unwrap_err();
        assert!(err.is_version_conflict());

        repository.delete(&product.id).await.unwrap();
        let err = repository.update(&updated, 2).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    #[ignore = "Requires running PostgreSQL instance"]
    async fn test_name_search_order_matches_product_ordering() {
        let repository = test_repository().await;
        let marker = uuid::Uuid::new_v4().simple().to_string();

        let mut products: Vec<Product> = ["apple", "Zebra", "banana", "Apple"]
            .iter()
            .enumerate()
            .map(|(i, prefix)| {
                Product::new(ProductDraft {
                    name: format!("{} {}", prefix, marker),
                    reference_number: format!("ORD-{}-{}", i, marker),
                    category: "Ordering".to_string(),
                    ..Default::default()
                })
                .unwrap()
            })
            .collect();

        for product in &products {
            repository.create(product).await.unwrap();
        }

        let found: Vec<ProductId> = repository
            .find_by_name(&marker, 10, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();

        ProductOrdering::NameAsc.sort(&mut products);
        let expected: Vec<ProductId> = products.iter().map(|p| p.id.clone()).collect();
        assert_eq!(found, expected);

        for product in &products {
            repository.delete(&product.id).await.unwrap();
        }
    }

    #[test]
    fn test_order_clauses_use_bytewise_collation() {
        assert!(ORDER_NAME_ASC.starts_with("name COLLATE \"C\""));
        assert!(ORDER_NEWEST_FIRST.ends_with("id COLLATE \"C\""));
    }
}
