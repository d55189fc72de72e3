//! Database query functions for the `resources` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Resource, ResourceKind};

/// Insert a resource under `plan_id` at the given position.
pub async fn insert_resource<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    position: i32,
    title: &str,
    url: &str,
    kind: &ResourceKind,
) -> Result<Resource> {
    let resource = sqlx::query_as::<_, Resource>(
        "INSERT INTO resources (plan_id, position, title, url, kind) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(position)
    .bind(title)
    .bind(url)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert resource {title:?} into plan {plan_id}"))?;

    Ok(resource)
}

/// List a plan's resources in attachment order.
pub async fn list_resources_for_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Vec<Resource>> {
    let resources = sqlx::query_as::<_, Resource>(
        "SELECT * FROM resources WHERE plan_id = $1 ORDER BY position ASC, id",
    )
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list resources for plan")?;

    Ok(resources)
}

/// Remove every resource of a plan. Returns the number of rows deleted.
pub async fn delete_resources_for_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM resources WHERE plan_id = $1")
        .bind(plan_id)
        .execute(executor)
        .await
        .context("failed to delete resources for plan")?;

    Ok(result.rows_affected())
}
