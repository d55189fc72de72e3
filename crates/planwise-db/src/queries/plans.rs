//! Database query functions for the `learning_plans` table.
//!
//! Every statement that changes a plan row also bumps `version`. The
//! versioned writes ([`update_plan`], [`set_completion`]) only match when the
//! caller's expected version is current and return `None` otherwise, leaving
//! the caller to tell a stale version apart from a missing row.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::LearningPlan;

/// Parameters for inserting a new plan row.
#[derive(Debug, Clone)]
pub struct NewPlan<'a> {
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub subject: &'a str,
    pub estimated_days: i32,
    pub completion_percentage: f64,
    pub created_at: DateTime<Utc>,
}

/// Caller-editable columns written by [`update_plan`].
///
/// Followers, following and ownership are not editable through this path.
#[derive(Debug, Clone)]
pub struct PlanChanges<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub subject: &'a str,
    pub estimated_days: i32,
    pub completion_percentage: f64,
}

/// Insert a new plan row. Followers start at 0, following at false and
/// version at 1.
pub async fn insert_plan<'e>(
    executor: impl PgExecutor<'e>,
    new: &NewPlan<'_>,
) -> Result<LearningPlan> {
    let plan = sqlx::query_as::<_, LearningPlan>(
        "INSERT INTO learning_plans \
         (owner_id, title, description, subject, estimated_days, completion_percentage, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(new.owner_id)
    .bind(new.title)
    .bind(new.description)
    .bind(new.subject)
    .bind(new.estimated_days)
    .bind(new.completion_percentage)
    .bind(new.created_at)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert learning plan {:?}", new.title))?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<LearningPlan>> {
    let plan = sqlx::query_as::<_, LearningPlan>("SELECT * FROM learning_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch learning plan")?;

    Ok(plan)
}

/// List all plans, newest first.
pub async fn list_plans(pool: &PgPool) -> Result<Vec<LearningPlan>> {
    let plans = sqlx::query_as::<_, LearningPlan>(
        "SELECT * FROM learning_plans ORDER BY created_at DESC, id",
    )
    .fetch_all(pool)
    .await
    .context("failed to list learning plans")?;

    Ok(plans)
}

/// List the plans owned by one user, newest first.
pub async fn list_plans_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<LearningPlan>> {
    let plans = sqlx::query_as::<_, LearningPlan>(
        "SELECT * FROM learning_plans WHERE owner_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list learning plans for owner {owner_id}"))?;

    Ok(plans)
}

/// Overwrite the editable columns of a plan if `expected_version` is still
/// current. Returns `None` when the row is missing or the version is stale.
pub async fn update_plan<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    expected_version: i64,
    changes: &PlanChanges<'_>,
) -> Result<Option<LearningPlan>> {
    let plan = sqlx::query_as::<_, LearningPlan>(
        "UPDATE learning_plans \
         SET title = $1, description = $2, subject = $3, estimated_days = $4, \
             completion_percentage = $5, version = version + 1 \
         WHERE id = $6 AND version = $7 \
         RETURNING *",
    )
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.subject)
    .bind(changes.estimated_days)
    .bind(changes.completion_percentage)
    .bind(id)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to update learning plan {id}"))?;

    Ok(plan)
}

/// Store a recomputed completion percentage if `expected_version` is still
/// current. Returns `None` when the row is missing or the version is stale.
pub async fn set_completion<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
    expected_version: i64,
    completion_percentage: f64,
) -> Result<Option<LearningPlan>> {
    let plan = sqlx::query_as::<_, LearningPlan>(
        "UPDATE learning_plans \
         SET completion_percentage = $1, version = version + 1 \
         WHERE id = $2 AND version = $3 \
         RETURNING *",
    )
    .bind(completion_percentage)
    .bind(id)
    .bind(expected_version)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("failed to set completion on learning plan {id}"))?;

    Ok(plan)
}

/// Atomically add `delta` to the follower count (never below zero) and set
/// the following flag. Returns `None` if the plan does not exist.
pub async fn adjust_followers(
    pool: &PgPool,
    id: Uuid,
    delta: i32,
    following: bool,
) -> Result<Option<LearningPlan>> {
    let plan = sqlx::query_as::<_, LearningPlan>(
        "UPDATE learning_plans \
         SET followers = GREATEST(followers + $1, 0), following = $2, version = version + 1 \
         WHERE id = $3 \
         RETURNING *",
    )
    .bind(delta)
    .bind(following)
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("failed to adjust followers on learning plan {id}"))?;

    Ok(plan)
}

/// Delete a plan; topics and resources go with it via `ON DELETE CASCADE`.
/// Returns whether a row was removed.
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM learning_plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete learning plan {id}"))?;

    Ok(result.rows_affected() > 0)
}
