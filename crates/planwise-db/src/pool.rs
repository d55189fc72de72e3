use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

use crate::config::DbConfig;

/// Migrations embedded at compile time from `crates/planwise-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Tables owned by the planwise schema, in creation order.
const PLAN_TABLES: [&str; 3] = ["learning_plans", "topics", "resources"];

/// Create a connection pool sized from the config.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database_url))
}

/// Single-connection pool on the server's `postgres` database, for statements
/// that cannot run inside the target database (`CREATE`/`DROP DATABASE`).
pub async fn maintenance_pool(config: &DbConfig) -> Result<PgPool> {
    let url = config.maintenance_url();
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(&url)
        .await
        .with_context(|| format!("failed to connect to maintenance database at {url}"))
}

/// Issue `CREATE DATABASE` for a plain identifier.
///
/// The statement takes no bind parameters, so anything beyond ASCII
/// alphanumerics and `_` is refused.
pub async fn create_database(maint: &PgPool, name: &str) -> Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        anyhow::bail!("database name {name:?} contains invalid characters");
    }
    maint
        .execute(format!("CREATE DATABASE {name}").as_str())
        .await
        .with_context(|| format!("failed to create database {name}"))?;
    Ok(())
}

/// Run all pending embedded migrations against the pool.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;

    info!("migrations applied successfully");
    Ok(())
}

/// Create the configured database unless the server already has it.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<()> {
    let db_name = config
        .database_name()
        .context("could not determine database name from URL")?;

    let maint = maintenance_pool(config).await?;
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
            .bind(db_name)
            .fetch_one(&maint)
            .await
            .context("failed to query pg_database")?;

    let outcome = if exists {
        info!(db = db_name, "database already exists");
        Ok(())
    } else {
        create_database(&maint, db_name)
            .await
            .inspect(|()| info!(db = db_name, "database created"))
    };

    maint.close().await;
    outcome
}

/// Row counts for the planwise tables, in creation order.
///
/// Printed by `planwise db-init` once migrations have run.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(String, i64)>> {
    let mut counts = Vec::with_capacity(PLAN_TABLES.len());
    for table in PLAN_TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table.to_owned(), count));
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_database_refuses_unsafe_names() {
        // Lazy pools never connect, so the name check is all that runs.
        let maint = PgPool::connect_lazy("postgresql://localhost:5432/postgres").unwrap();

        for name in ["", "plan-wise", "x; DROP DATABASE postgres", "naïve"] {
            let err = create_database(&maint, name).await.unwrap_err();
            assert!(err.to_string().contains("invalid characters"), "{name:?}: {err}");
        }
    }
}
