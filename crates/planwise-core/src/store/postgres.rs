//! [`PlanStore`] over PostgreSQL, built on the `planwise-db` query functions.
//!
//! Multi-statement writes (create, replace, topic toggle) run inside one
//! transaction so a failure part-way leaves nothing behind.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use planwise_db::models::{LearningPlan, Resource, Topic};
use planwise_db::queries::plans::{self as plan_queries, NewPlan, PlanChanges};
use planwise_db::queries::{resources as resource_queries, topics as topic_queries};

use super::{NewResource, NewTopic, PlanDetail, PlanStore, missed_write};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn position(index: usize) -> anyhow::Result<i32> {
    i32::try_from(index).context("too many children for one learning plan")
}

async fn insert_children(
    conn: &mut PgConnection,
    plan_id: Uuid,
    topics: &[NewTopic<'_>],
    resources: &[NewResource<'_>],
) -> anyhow::Result<(Vec<Topic>, Vec<Resource>)> {
    let mut inserted_topics = Vec::with_capacity(topics.len());
    for (index, topic) in topics.iter().enumerate() {
        let row = topic_queries::insert_topic(
            &mut *conn,
            plan_id,
            position(index)?,
            topic.title,
            topic.completed,
        )
        .await?;
        inserted_topics.push(row);
    }

    let mut inserted_resources = Vec::with_capacity(resources.len());
    for (index, resource) in resources.iter().enumerate() {
        let row = resource_queries::insert_resource(
            &mut *conn,
            plan_id,
            position(index)?,
            resource.title,
            resource.url,
            &resource.kind,
        )
        .await?;
        inserted_resources.push(row);
    }

    Ok((inserted_topics, inserted_resources))
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn create_plan(
        &self,
        plan: &NewPlan<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let row = plan_queries::insert_plan(&mut *tx, plan).await?;
        let (topics, resources) = insert_children(&mut *tx, row.id, topics, resources).await?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(PlanDetail {
            plan: row,
            topics,
            resources,
        })
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<LearningPlan>, StoreError> {
        Ok(plan_queries::get_plan(&self.pool, id).await?)
    }

    async fn list_plans(&self) -> Result<Vec<LearningPlan>, StoreError> {
        Ok(plan_queries::list_plans(&self.pool).await?)
    }

    async fn list_plans_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<LearningPlan>, StoreError> {
        Ok(plan_queries::list_plans_for_owner(&self.pool, owner_id).await?)
    }

    async fn list_topics(&self, plan_id: Uuid) -> Result<Vec<Topic>, StoreError> {
        Ok(topic_queries::list_topics_for_plan(&self.pool, plan_id).await?)
    }

    async fn list_resources(&self, plan_id: Uuid) -> Result<Vec<Resource>, StoreError> {
        Ok(resource_queries::list_resources_for_plan(&self.pool, plan_id).await?)
    }

    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError> {
        Ok(topic_queries::get_topic(&self.pool, id).await?)
    }

    async fn replace_plan(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: &PlanChanges<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let Some(row) = plan_queries::update_plan(&mut *tx, id, expected_version, changes).await?
        else {
            let current = plan_queries::get_plan(&mut *tx, id).await?;
            return Err(missed_write(id, expected_version, current.as_ref()));
        };

        topic_queries::delete_topics_for_plan(&mut *tx, id).await?;
        resource_queries::delete_resources_for_plan(&mut *tx, id).await?;
        let (topics, resources) = insert_children(&mut *tx, id, topics, resources).await?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(PlanDetail {
            plan: row,
            topics,
            resources,
        })
    }

    async fn record_topic_toggle(
        &self,
        plan_id: Uuid,
        expected_version: i64,
        topic_id: Uuid,
        completed: bool,
        completion_percentage: f64,
    ) -> Result<LearningPlan, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        let Some(row) = plan_queries::set_completion(
            &mut *tx,
            plan_id,
            expected_version,
            completion_percentage,
        )
        .await?
        else {
            let current = plan_queries::get_plan(&mut *tx, plan_id).await?;
            return Err(missed_write(plan_id, expected_version, current.as_ref()));
        };

        topic_queries::set_topic_completed(&mut *tx, plan_id, topic_id, completed).await?;

        tx.commit().await.context("failed to commit transaction")?;

        Ok(row)
    }

    async fn adjust_followers(
        &self,
        id: Uuid,
        delta: i32,
        following: bool,
    ) -> Result<Option<LearningPlan>, StoreError> {
        Ok(plan_queries::adjust_followers(&self.pool, id, delta, following).await?)
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(plan_queries::delete_plan(&self.pool, id).await?)
    }
}
