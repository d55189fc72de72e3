//! In-process [`PlanStore`] kept behind a single mutex.
//!
//! Every operation takes the lock once, so each call is atomic with respect
//! to the others, matching the transactional behaviour of the Postgres store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use planwise_db::models::{LearningPlan, Resource, Topic};
use planwise_db::queries::plans::{NewPlan, PlanChanges};

use super::{NewResource, NewTopic, PlanDetail, PlanStore, missed_write};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct State {
    plans: HashMap<Uuid, LearningPlan>,
    topics: HashMap<Uuid, Topic>,
    resources: HashMap<Uuid, Resource>,
}

impl State {
    fn topics_of(&self, plan_id: Uuid) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self
            .topics
            .values()
            .filter(|t| t.plan_id == plan_id)
            .cloned()
            .collect();
        topics.sort_by_key(|t| (t.position, t.id));
        topics
    }

    fn resources_of(&self, plan_id: Uuid) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self
            .resources
            .values()
            .filter(|r| r.plan_id == plan_id)
            .cloned()
            .collect();
        resources.sort_by_key(|r| (r.position, r.id));
        resources
    }

    fn remove_children(&mut self, plan_id: Uuid) {
        self.topics.retain(|_, t| t.plan_id != plan_id);
        self.resources.retain(|_, r| r.plan_id != plan_id);
    }

    fn insert_children(
        &mut self,
        plan_id: Uuid,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<(Vec<Topic>, Vec<Resource>), StoreError> {
        let mut inserted_topics = Vec::with_capacity(topics.len());
        for (index, topic) in topics.iter().enumerate() {
            let row = Topic {
                id: Uuid::new_v4(),
                plan_id,
                position: position(index)?,
                title: topic.title.to_owned(),
                completed: topic.completed,
            };
            self.topics.insert(row.id, row.clone());
            inserted_topics.push(row);
        }

        let mut inserted_resources = Vec::with_capacity(resources.len());
        for (index, resource) in resources.iter().enumerate() {
            let row = Resource {
                id: Uuid::new_v4(),
                plan_id,
                position: position(index)?,
                title: resource.title.to_owned(),
                url: resource.url.to_owned(),
                kind: resource.kind.as_str().to_owned(),
            };
            self.resources.insert(row.id, row.clone());
            inserted_resources.push(row);
        }

        Ok((inserted_topics, inserted_resources))
    }

    /// The plan row if `expected_version` is still current.
    fn versioned_plan(
        &mut self,
        id: Uuid,
        expected_version: i64,
    ) -> Result<&mut LearningPlan, StoreError> {
        match self.plans.get_mut(&id) {
            Some(plan) if plan.version == expected_version => Ok(plan),
            other => Err(missed_write(id, expected_version, other.map(|p| &*p))),
        }
    }
}

fn position(index: usize) -> Result<i32, StoreError> {
    i32::try_from(index).map_err(|_| {
        StoreError::Backend(anyhow::anyhow!("too many children for one learning plan"))
    })
}

fn newest_first(plans: &mut [LearningPlan]) {
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
}

#[derive(Debug, Default)]
pub struct MemoryPlanStore {
    state: Mutex<State>,
}

impl MemoryPlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state.lock().map_err(|_| {
            StoreError::Backend(anyhow::anyhow!("in-memory plan store lock poisoned"))
        })
    }
}

#[async_trait]
impl PlanStore for MemoryPlanStore {
    async fn create_plan(
        &self,
        plan: &NewPlan<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError> {
        let mut state = self.lock()?;

        let row = LearningPlan {
            id: Uuid::new_v4(),
            owner_id: plan.owner_id,
            title: plan.title.to_owned(),
            description: plan.description.to_owned(),
            subject: plan.subject.to_owned(),
            completion_percentage: plan.completion_percentage,
            estimated_days: plan.estimated_days,
            followers: 0,
            following: false,
            version: 1,
            created_at: plan.created_at,
        };
        let (topics, resources) = state.insert_children(row.id, topics, resources)?;
        state.plans.insert(row.id, row.clone());

        Ok(PlanDetail {
            plan: row,
            topics,
            resources,
        })
    }

    async fn get_plan(&self, id: Uuid) -> Result<Option<LearningPlan>, StoreError> {
        Ok(self.lock()?.plans.get(&id).cloned())
    }

    async fn list_plans(&self) -> Result<Vec<LearningPlan>, StoreError> {
        let mut plans: Vec<LearningPlan> = self.lock()?.plans.values().cloned().collect();
        newest_first(&mut plans);
        Ok(plans)
    }

    async fn list_plans_for_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<LearningPlan>, StoreError> {
        let mut plans: Vec<LearningPlan> = self
            .lock()?
            .plans
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut plans);
        Ok(plans)
    }

    async fn list_topics(&self, plan_id: Uuid) -> Result<Vec<Topic>, StoreError> {
        Ok(self.lock()?.topics_of(plan_id))
    }

    async fn list_resources(&self, plan_id: Uuid) -> Result<Vec<Resource>, StoreError> {
        Ok(self.lock()?.resources_of(plan_id))
    }

    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError> {
        Ok(self.lock()?.topics.get(&id).cloned())
    }

    async fn replace_plan(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: &PlanChanges<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError> {
        let mut state = self.lock()?;

        // Validate positions before touching anything.
        position(topics.len().max(resources.len()))?;

        let plan = state.versioned_plan(id, expected_version)?;
        plan.title = changes.title.to_owned();
        plan.description = changes.description.to_owned();
        plan.subject = changes.subject.to_owned();
        plan.estimated_days = changes.estimated_days;
        plan.completion_percentage = changes.completion_percentage;
        plan.version += 1;
        let row = plan.clone();

        state.remove_children(id);
        let (topics, resources) = state.insert_children(id, topics, resources)?;

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
        let mut state = self.lock()?;

        state.versioned_plan(plan_id, expected_version)?;
        match state.topics.get_mut(&topic_id) {
            Some(topic) if topic.plan_id == plan_id => topic.completed = completed,
            _ => {
                return Err(StoreError::NotFound {
                    entity: "topic",
                    id: topic_id,
                });
            }
        }

        let plan = state.versioned_plan(plan_id, expected_version)?;
        plan.completion_percentage = completion_percentage;
        plan.version += 1;
        Ok(plan.clone())
    }

    async fn adjust_followers(
        &self,
        id: Uuid,
        delta: i32,
        following: bool,
    ) -> Result<Option<LearningPlan>, StoreError> {
        let mut state = self.lock()?;
        let Some(plan) = state.plans.get_mut(&id) else {
            return Ok(None);
        };
        plan.followers = plan.followers.saturating_add(delta).max(0);
        plan.following = following;
        plan.version += 1;
        Ok(Some(plan.clone()))
    }

    async fn delete_plan(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let removed = state.plans.remove(&id).is_some();
        if removed {
            state.remove_children(id);
        }
        Ok(removed)
    }
}
