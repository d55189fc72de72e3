//! Integration tests for the embedded migrations and schema constraints.

use sqlx::PgPool;
use uuid::Uuid;

use planwise_db::config::DbConfig;
use planwise_db::pool;
use planwise_test_utils::{TestDb, pg_url};

/// Tables created by the initial migration, alphabetically.
const EXPECTED_TABLES: &[&str] = &["learning_plans", "resources", "topics"];

async fn user_tables(pool: &PgPool) -> Vec<String> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(pool)
    .await
    .expect("should list tables");

    rows.into_iter().map(|(name,)| name).collect()
}

#[tokio::test]
async fn migrations_create_all_tables() {
    let db = TestDb::create().await;

    assert_eq!(user_tables(&db.pool).await, EXPECTED_TABLES);

    db.cleanup().await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = TestDb::create().await;

    pool::run_migrations(&db.pool)
        .await
        .expect("second migration run should be a no-op");

    let counts = pool::table_counts(&db.pool)
        .await
        .expect("table_counts should succeed");
    assert_eq!(counts.len(), EXPECTED_TABLES.len());
    for (table, count) in &counts {
        assert_eq!(*count, 0, "table {table} should be empty after migrations");
    }

    db.cleanup().await;
}

#[tokio::test]
async fn schema_rejects_out_of_range_values() {
    let db = TestDb::create().await;
    let owner = Uuid::new_v4();

    let bad_days = sqlx::query(
        "INSERT INTO learning_plans (owner_id, title, subject, estimated_days) \
         VALUES ($1, 'x', 'maths', 0)",
    )
    .bind(owner)
    .execute(&db.pool)
    .await;
    assert!(bad_days.is_err(), "estimated_days must be positive");

    let bad_pct = sqlx::query(
        "INSERT INTO learning_plans (owner_id, title, subject, completion_percentage) \
         VALUES ($1, 'x', 'maths', 120)",
    )
    .bind(owner)
    .execute(&db.pool)
    .await;
    assert!(bad_pct.is_err(), "completion_percentage must be within 0..=100");

    let orphan_topic = sqlx::query(
        "INSERT INTO topics (plan_id, position, title) VALUES ($1, 0, 'orphan')",
    )
    .bind(Uuid::new_v4())
    .execute(&db.pool)
    .await;
    assert!(orphan_topic.is_err(), "topics must reference an existing plan");

    db.cleanup().await;
}

#[tokio::test]
async fn ensure_database_exists_is_idempotent() {
    let db_name = format!("planwise_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{}/{db_name}", pg_url().await));

    pool::ensure_database_exists(&config)
        .await
        .expect("first ensure should create the database");
    pool::ensure_database_exists(&config)
        .await
        .expect("second ensure should be a no-op");

    let db_pool = pool::create_pool(&config)
        .await
        .expect("created database should accept connections");
    pool::run_migrations(&db_pool)
        .await
        .expect("migrations should succeed on the created database");

    TestDb {
        pool: db_pool,
        name: db_name,
    }
    .cleanup()
    .await;
}
