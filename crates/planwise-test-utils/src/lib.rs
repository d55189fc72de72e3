//! Shared PostgreSQL for planwise integration tests.
//!
//! Every test gets a freshly migrated database of its own inside one server
//! per test binary.
//!
//! - With **`PLANWISE_TEST_PG_URL`** set (for example by CI that already runs
//!   a postgres service) that server is used as-is.
//! - Otherwise a postgres container is started through testcontainers on
//!   first use and kept alive for the rest of the binary.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use testcontainers::ContainerAsync;
use testcontainers::ImageExt;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use planwise_db::config::DbConfig;
use planwise_db::pool;

struct SharedServer {
    /// Server root URL, no database name.
    base_url: String,
    /// Keeps the container running; `None` for an external server.
    _container: Option<ContainerAsync<Postgres>>,
}

static SHARED_SERVER: OnceCell<SharedServer> = OnceCell::const_new();

async fn start_server() -> SharedServer {
    if let Ok(url) = std::env::var("PLANWISE_TEST_PG_URL") {
        return SharedServer {
            base_url: url.trim_end_matches('/').to_owned(),
            _container: None,
        };
    }

    let container = Postgres::default()
        .with_tag("17")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get mapped port");

    SharedServer {
        base_url: format!("postgresql://postgres:postgres@{host}:{port}"),
        _container: Some(container),
    }
}

/// Root URL of the shared server (no database name appended).
pub async fn pg_url() -> &'static str {
    &SHARED_SERVER.get_or_init(start_server).await.base_url
}

async fn test_config(name: &str) -> DbConfig {
    DbConfig::new(format!("{}/{name}", pg_url().await))
}

/// A migrated, uniquely named database. Call [`TestDb::cleanup`] at the end
/// of the test to drop it.
pub struct TestDb {
    pub pool: PgPool,
    pub name: String,
}

impl TestDb {
    /// Create the database and apply the embedded migrations.
    pub async fn create() -> Self {
        let name = format!("planwise_test_{}", Uuid::new_v4().simple());
        let config = test_config(&name).await;

        let maint = pool::maintenance_pool(&config)
            .await
            .expect("failed to connect to maintenance database");
        pool::create_database(&maint, &name)
            .await
            .unwrap_or_else(|e| panic!("failed to create test database {name}: {e:#}"));
        maint.close().await;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.database_url)
            .await
            .unwrap_or_else(|e| panic!("failed to connect to test database {name}: {e}"));

        pool::run_migrations(&pool)
            .await
            .expect("migrations should succeed");

        Self { pool, name }
    }

    /// Close the pool and drop the database. Failures are ignored so a
    /// half-torn-down database never masks the test's own result.
    pub async fn cleanup(self) {
        self.pool.close().await;

        let Ok(maint) = pool::maintenance_pool(&test_config(&self.name).await).await else {
            return;
        };
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) \
             FROM pg_stat_activity \
             WHERE datname = '{}' AND pid <> pg_backend_pid()",
            self.name
        );
        let _ = maint.execute(terminate.as_str()).await;
        let _ = maint
            .execute(format!("DROP DATABASE IF EXISTS {}", self.name).as_str())
            .await;
        maint.close().await;
    }
}
