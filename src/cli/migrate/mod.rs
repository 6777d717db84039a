//! Migrate command - manages the product store schema

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::infrastructure::storage::{run_storage_migrations, storage_migrations, PostgresMigrator};

#[derive(Debug, Default, Args)]
pub struct MigrateArgs {
    /// Print applied migration versions and exit
    #[arg(long, conflicts_with = "revert")]
    pub status: bool,

    /// Revert the most recently applied migration
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let pool = config
        .postgres_config()
        .connect()
        .await
        .context("Failed to connect to PostgreSQL")?;

    if args.status {
        let migrator = PostgresMigrator::new(pool);
        let applied = migrator.applied_versions().await?;
        let pending: Vec<i64> = storage_migrations()
            .iter()
            .map(|m| m.version)
            .filter(|v| !applied.contains(v))
            .collect();

        info!(?applied, ?pending, "Migration status");
        return Ok(());
    }

    if args.revert {
        let migrator = PostgresMigrator::new(pool);
        let Some(current) = migrator.current_version().await? else {
            info!("No migrations applied, nothing to revert");
            return Ok(());
        };

        let migration = storage_migrations()
            .into_iter()
            .find(|m| m.version == current)
            .with_context(|| format!("Unknown migration version {}", current))?;

        migrator.revert_migration(&migration).await?;
        info!(version = current, description = %migration.description, "Migration reverted");
        return Ok(());
    }

    run_storage_migrations(&pool).await?;
    Ok(())
}
