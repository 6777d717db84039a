//! Schema migrations for the product store

use sqlx::postgres::{PgPool, Postgres};
use sqlx::Transaction;
use tracing::{debug, info};

use crate::domain::DomainError;

const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version BIGINT PRIMARY KEY,
        description TEXT NOT NULL,
        installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
"#;

/// Applies versioned SQL migrations, recording them in `_migrations`.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row, so a failed script leaves neither schema changes nor a record.
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies `migration` unless it is already recorded
    pub async fn run_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        if is_recorded(&mut tx, migration.version).await? {
            return Ok(());
        }

        sqlx::raw_sql(&migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("apply", migration.version, e))?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(&migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("record", migration.version, e))?;

        tx.commit()
            .await
            .map_err(|e| migration_error("commit", migration.version, e))?;

        info!(
            version = migration.version,
            description = %migration.description,
            "Migration applied"
        );
        Ok(())
    }

    /// Runs the down script of a recorded migration and forgets it
    pub async fn revert_migration(&self, migration: &Migration) -> Result<(), DomainError> {
        let mut tx = self.begin().await?;

        if !is_recorded(&mut tx, migration.version).await? {
            return Ok(());
        }

        sqlx::raw_sql(&migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("revert", migration.version, e))?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| migration_error("unrecord", migration.version, e))?;

        tx.commit()
            .await
            .map_err(|e| migration_error("commit", migration.version, e))
    }

    /// Latest recorded version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        Ok(self.applied_versions().await?.last().copied())
    }

    /// Recorded versions, ascending
    pub async fn applied_versions(&self) -> Result<Vec<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to read applied migrations: {}", e)))
    }

    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(CREATE_MIGRATIONS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to create migrations table: {}", e))
            })?;

        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.ensure_migrations_table().await?;

        self.pool
            .begin()
            .await
            .map_err(|e| {
                DomainError::connection(format!("Failed to start migration transaction: {}", e))
            })
    }
}

async fn is_recorded(
    tx: &mut Transaction<'static, Postgres>,
    version: i64,
) -> Result<bool, DomainError> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
        .bind(version)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| migration_error("check", version, e))
}

fn migration_error(action: &str, version: i64, e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to {} migration {}: {}", action, version, e))
}

/// Represents a database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Ordering key, unique across migrations
    pub version: i64,
    /// Human-readable description
    pub description: String,
    /// SQL to run when applying the migration
    pub up: String,
    /// SQL to run when reverting the migration
    pub down: String,
}

impl Migration {
    pub fn new(
        version: i64,
        description: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        Self {
            version,
            description: description.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Collection of migrations for the product store
pub fn storage_migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "Create products table",
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id VARCHAR(26) PRIMARY KEY,
                name TEXT NOT NULL,
                reference_number TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                sku TEXT NOT NULL DEFAULT '',
                brand TEXT NOT NULL DEFAULT '',
                stock BIGINT NOT NULL CHECK (stock >= 0),
                images JSONB NOT NULL DEFAULT '[]'::jsonb,
                specifications JSONB NOT NULL DEFAULT '{}'::jsonb,
                version BIGINT NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            CREATE INDEX IF NOT EXISTS idx_products_created_at ON products(created_at DESC);
            "#,
            r#"
            DROP TABLE IF EXISTS products;
            "#,
        ),
        Migration::new(
            2,
            "Add case-insensitive lookup indexes on products",
            r#"
            CREATE INDEX IF NOT EXISTS idx_products_category_lower ON products(LOWER(category));
            CREATE INDEX IF NOT EXISTS idx_products_name_lower ON products(LOWER(name));
            "#,
            r#"
            DROP INDEX IF EXISTS idx_products_name_lower;
            DROP INDEX IF EXISTS idx_products_category_lower;
            "#,
        ),
    ]
}

/// Runs all pending storage migrations
pub async fn run_storage_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in storage_migrations() {
        migrator.run_migration(&migration).await?;
        debug!(version = migration.version, "Migration up to date");
    }

    info!(version = ?migrator.current_version().await?, "Storage migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creation() {
        let migration = Migration::new(1, "Test migration", "CREATE TABLE test", "DROP TABLE test");

        assert_eq!(migration.version, 1);
        assert_eq!(migration.description, "Test migration");
        assert_eq!(migration.up, "CREATE TABLE test");
        assert_eq!(migration.down, "DROP TABLE test");
    }

    #[test]
    fn test_storage_migrations_strictly_ascending() {
        let versions: Vec<i64> = storage_migrations().iter().map(|m| m.version).collect();

        assert!(!versions.is_empty());
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_products_table_has_lookup_indexes() {
        let up: String = storage_migrations().into_iter().map(|m| m.up).collect();

        assert!(up.contains("CREATE TABLE IF NOT EXISTS products"));
        assert!(up.contains("LOWER(category)"));
        assert!(up.contains("LOWER(name)"));
    }

    #[test]
    fn test_storage_migrations_content() {
        let migrations = storage_migrations();

        // Verify all migrations have required content
        for migration in migrations {
            assert!(!migration.description.is_empty());
            assert!(!migration.up.is_empty());
            assert!(!migration.down.is_empty());
        }
    }
}
