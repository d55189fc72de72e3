//! Plan service layer.
//!
//! Applies the ownership and validation rules for every plan operation and
//! delegates persistence to a [`PlanStore`]. Each public method is one unit
//! of work; lost updates are caught by the store's version check and come
//! back as [`PlanError::Conflict`].

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use planwise_db::models::LearningPlan;
use planwise_db::queries::plans::{NewPlan, PlanChanges};

use super::generate::{GenerationRequest, draft_plan};
use super::input::PlanInput;
use super::progress::completion_percentage;
use crate::clock::{Clock, SystemClock};
use crate::error::PlanError;
use crate::store::{NewResource, NewTopic, PlanDetail, PlanStore};

#[derive(Clone)]
pub struct PlanService {
    store: Arc<dyn PlanStore>,
    clock: Arc<dyn Clock>,
}

impl PlanService {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn PlanStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Generate a plan from the catalog for `owner_id` and persist it.
    pub async fn generate<R: Rng + ?Sized>(
        &self,
        request: &GenerationRequest,
        owner_id: Uuid,
        rng: &mut R,
    ) -> Result<PlanDetail, PlanError> {
        let draft = draft_plan(request, rng)?;

        let topics: Vec<NewTopic<'_>> = draft
            .topics
            .iter()
            .map(|&title| NewTopic {
                title,
                completed: false,
            })
            .collect();
        let resources: Vec<NewResource<'_>> = draft
            .resources
            .iter()
            .map(|entry| NewResource {
                title: entry.title,
                url: entry.url,
                kind: entry.kind(),
            })
            .collect();
        let new = NewPlan {
            owner_id,
            title: &draft.title,
            description: &draft.description,
            subject: &draft.subject,
            estimated_days: draft.estimated_days,
            completion_percentage: 0.0,
            created_at: self.clock.now(),
        };

        let detail = self.store.create_plan(&new, &topics, &resources).await?;
        info!(
            plan_id = %detail.plan.id,
            %owner_id,
            subject = %detail.plan.subject,
            topics = detail.topics.len(),
            "generated learning plan"
        );
        Ok(detail)
    }

    /// Create a plan from caller input. Followers start at zero whatever the
    /// input says, and completion is derived from the supplied topics.
    pub async fn create(&self, input: &PlanInput, owner_id: Uuid) -> Result<PlanDetail, PlanError> {
        input.validate()?;

        let new = NewPlan {
            owner_id,
            title: &input.title,
            description: &input.description,
            subject: &input.subject,
            estimated_days: input.estimated_days,
            completion_percentage: completion_percentage(input.topics.iter().map(|t| t.completed)),
            created_at: self.clock.now(),
        };

        let detail = self
            .store
            .create_plan(&new, &input.new_topics(), &input.new_resources())
            .await?;
        info!(plan_id = %detail.plan.id, %owner_id, "created learning plan");
        Ok(detail)
    }

    pub async fn get(&self, id: Uuid) -> Result<PlanDetail, PlanError> {
        let plan = self.require_plan(id).await?;
        self.assemble(plan).await
    }

    /// All plans, or only those owned by `owner_filter` when it is given.
    /// A blank filter counts as absent; anything else must be a UUID.
    pub async fn list(&self, owner_filter: Option<&str>) -> Result<Vec<PlanDetail>, PlanError> {
        let owner = match owner_filter.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|e| {
                PlanError::InvalidArgument(format!("invalid userId {raw:?}: {e}"))
            })?),
            None => None,
        };

        let plans = match owner {
            Some(owner_id) => self.store.list_plans_for_owner(owner_id).await?,
            None => self.store.list_plans().await?,
        };
        debug!(count = plans.len(), owner = ?owner, "listed learning plans");

        let mut details = Vec::with_capacity(plans.len());
        for plan in plans {
            details.push(self.assemble(plan).await?);
        }
        Ok(details)
    }

    /// Overwrite a plan the caller owns. Topics and resources are replaced
    /// wholesale; followers and the following flag are kept.
    pub async fn update(
        &self,
        id: Uuid,
        input: &PlanInput,
        caller: Uuid,
    ) -> Result<PlanDetail, PlanError> {
        input.validate()?;

        let plan = self.require_plan(id).await?;
        ensure_owner(&plan, caller, "update")?;

        let expected_version = input.expected_version.unwrap_or(plan.version);
        let changes = PlanChanges {
            title: &input.title,
            description: &input.description,
            subject: &input.subject,
            estimated_days: input.estimated_days,
            completion_percentage: completion_percentage(input.topics.iter().map(|t| t.completed)),
        };

        let detail = self
            .store
            .replace_plan(
                id,
                expected_version,
                &changes,
                &input.new_topics(),
                &input.new_resources(),
            )
            .await?;
        info!(plan_id = %id, version = detail.plan.version, "updated learning plan");
        Ok(detail)
    }

    pub async fn delete(&self, id: Uuid, caller: Uuid) -> Result<(), PlanError> {
        let plan = self.require_plan(id).await?;
        ensure_owner(&plan, caller, "delete")?;

        if !self.store.delete_plan(id).await? {
            // Removed by someone else between the lookup and the delete.
            return Err(PlanError::plan_not_found(id));
        }
        info!(plan_id = %id, "deleted learning plan");
        Ok(())
    }

    /// Add a follower. Repeated follows by the same user all count.
    pub async fn follow(&self, id: Uuid, caller: Uuid) -> Result<PlanDetail, PlanError> {
        let plan = self
            .store
            .adjust_followers(id, 1, true)
            .await?
            .ok_or_else(|| PlanError::plan_not_found(id))?;
        info!(
            plan_id = %id,
            follower = %caller,
            followers = plan.followers,
            "followed learning plan"
        );
        self.assemble(plan).await
    }

    /// Remove a follower. The count never drops below zero.
    pub async fn unfollow(&self, id: Uuid, caller: Uuid) -> Result<PlanDetail, PlanError> {
        let plan = self
            .store
            .adjust_followers(id, -1, false)
            .await?
            .ok_or_else(|| PlanError::plan_not_found(id))?;
        info!(
            plan_id = %id,
            follower = %caller,
            followers = plan.followers,
            "unfollowed learning plan"
        );
        self.assemble(plan).await
    }

    /// Flip one topic's completed flag and recompute the plan's completion
    /// percentage.
    ///
    /// Checks run in order: the plan exists, the topic exists, the topic
    /// belongs to the plan, the caller owns the plan.
    pub async fn toggle_topic(
        &self,
        plan_id: Uuid,
        topic_id: Uuid,
        caller: Uuid,
    ) -> Result<PlanDetail, PlanError> {
        let plan = self.require_plan(plan_id).await?;
        let topic = self
            .store
            .get_topic(topic_id)
            .await?
            .ok_or_else(|| PlanError::topic_not_found(topic_id))?;
        if topic.plan_id != plan_id {
            return Err(PlanError::InvalidArgument(format!(
                "topic {topic_id} does not belong to learning plan {plan_id}"
            )));
        }
        ensure_owner(&plan, caller, "track progress on")?;

        let completed = !topic.completed;
        let topics = self.store.list_topics(plan_id).await?;
        let percentage = completion_percentage(
            topics
                .iter()
                .map(|t| if t.id == topic_id { completed } else { t.completed }),
        );

        let plan = self
            .store
            .record_topic_toggle(plan_id, plan.version, topic_id, completed, percentage)
            .await?;
        info!(
            %plan_id,
            %topic_id,
            completed,
            completion_percentage = plan.completion_percentage,
            "toggled topic"
        );
        self.assemble(plan).await
    }

    async fn require_plan(&self, id: Uuid) -> Result<LearningPlan, PlanError> {
        self.store
            .get_plan(id)
            .await?
            .ok_or_else(|| PlanError::plan_not_found(id))
    }

    async fn assemble(&self, plan: LearningPlan) -> Result<PlanDetail, PlanError> {
        let topics = self.store.list_topics(plan.id).await?;
        let resources = self.store.list_resources(plan.id).await?;
        Ok(PlanDetail {
            plan,
            topics,
            resources,
        })
    }
}

fn ensure_owner(plan: &LearningPlan, caller: Uuid, action: &str) -> Result<(), PlanError> {
    if plan.owner_id == caller {
        return Ok(());
    }
    warn!(plan_id = %plan.id, %caller, action, "rejected non-owner");
    Err(PlanError::Unauthorized(format!(
        "user {caller} may not {action} learning plan {}",
        plan.id
    )))
}
