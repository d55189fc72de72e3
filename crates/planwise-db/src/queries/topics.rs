//! Database query functions for the `topics` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Topic;

/// Insert a topic under `plan_id` at the given position.
pub async fn insert_topic<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    position: i32,
    title: &str,
    completed: bool,
) -> Result<Topic> {
    let topic = sqlx::query_as::<_, Topic>(
        "INSERT INTO topics (plan_id, position, title, completed) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(position)
    .bind(title)
    .bind(completed)
    .fetch_one(executor)
    .await
    .with_context(|| format!("failed to insert topic {title:?} into plan {plan_id}"))?;

    Ok(topic)
}

/// Fetch a single topic by ID.
pub async fn get_topic<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Topic>> {
    let topic = sqlx::query_as::<_, Topic>("SELECT * FROM topics WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .context("failed to fetch topic")?;

    Ok(topic)
}

/// List a plan's topics in curriculum order.
pub async fn list_topics_for_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<Vec<Topic>> {
    let topics = sqlx::query_as::<_, Topic>(
        "SELECT * FROM topics WHERE plan_id = $1 ORDER BY position ASC, id",
    )
    .bind(plan_id)
    .fetch_all(executor)
    .await
    .context("failed to list topics for plan")?;

    Ok(topics)
}

/// Set the completed flag of a topic, scoped to its owning plan.
pub async fn set_topic_completed<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
    topic_id: Uuid,
    completed: bool,
) -> Result<()> {
    let result = sqlx::query("UPDATE topics SET completed = $1 WHERE id = $2 AND plan_id = $3")
        .bind(completed)
        .bind(topic_id)
        .bind(plan_id)
        .execute(executor)
        .await
        .context("failed to update topic completion")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("topic {topic_id} not found in plan {plan_id}");
    }

    Ok(())
}

/// Remove every topic of a plan. Returns the number of rows deleted.
pub async fn delete_topics_for_plan<'e>(
    executor: impl PgExecutor<'e>,
    plan_id: Uuid,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM topics WHERE plan_id = $1")
        .bind(plan_id)
        .execute(executor)
        .await
        .context("failed to delete topics for plan")?;

    Ok(result.rows_affected())
}
