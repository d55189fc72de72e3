//! Storage seam for learning plans.
//!
//! [`PlanStore`] is what the service layer talks to. Two implementations
//! ship with the crate:
//!
//! - [`PgPlanStore`], backed by the `planwise-db` query functions, and
//! - [`MemoryPlanStore`], a mutex-guarded map used by tests and by
//!   `planwise serve --in-memory`.
//!
//! Stores return plain rows. Assembling a plan together with its children
//! happens eagerly in the service.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use planwise_db::models::{LearningPlan, Resource, ResourceKind, Topic};
use planwise_db::queries::plans::{NewPlan, PlanChanges};

use crate::error::StoreError;

pub use memory::MemoryPlanStore;
pub use postgres::PgPlanStore;

/// A topic to be attached to a plan. Its position is its index in the
/// slice handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic<'a> {
    pub title: &'a str,
    pub completed: bool,
}

/// A resource to be attached to a plan, positioned like [`NewTopic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource<'a> {
    pub title: &'a str,
    pub url: &'a str,
    pub kind: ResourceKind,
}

/// A plan row together with its ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDetail {
    pub plan: LearningPlan,
    pub topics: Vec<Topic>,
    pub resources: Vec<Resource>,
}

/// Persistence operations needed by [`crate::plan::PlanService`].
///
/// Every write that touches a plan row bumps its version. Versioned writes
/// report [`StoreError::Conflict`] when the expected version is stale and
/// [`StoreError::NotFound`] when the plan is gone.
#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Insert the plan row (assigning its id), then its children under that
    /// id. Implementations make the pair atomic.
    async fn create_plan(
        &self,
        plan: &NewPlan<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError>;

    async fn get_plan(&self, id: Uuid) -> Result<Option<LearningPlan>, StoreError>;

    /// All plans, newest first.
    async fn list_plans(&self) -> Result<Vec<LearningPlan>, StoreError>;

    /// Plans owned by `owner_id`, newest first.
    async fn list_plans_for_owner(&self, owner_id: Uuid)
    -> Result<Vec<LearningPlan>, StoreError>;

    async fn list_topics(&self, plan_id: Uuid) -> Result<Vec<Topic>, StoreError>;

    async fn list_resources(&self, plan_id: Uuid) -> Result<Vec<Resource>, StoreError>;

    async fn get_topic(&self, id: Uuid) -> Result<Option<Topic>, StoreError>;

    /// Overwrite the plan's editable columns and replace its children
    /// wholesale, provided `expected_version` is current.
    async fn replace_plan(
        &self,
        id: Uuid,
        expected_version: i64,
        changes: &PlanChanges<'_>,
        topics: &[NewTopic<'_>],
        resources: &[NewResource<'_>],
    ) -> Result<PlanDetail, StoreError>;

    /// Set one topic's completed flag and store the recomputed completion
    /// percentage on its plan as a single unit, provided `expected_version`
    /// is current.
    async fn record_topic_toggle(
        &self,
        plan_id: Uuid,
        expected_version: i64,
        topic_id: Uuid,
        completed: bool,
        completion_percentage: f64,
    ) -> Result<LearningPlan, StoreError>;

    /// Add `delta` to the follower count, clamped at zero, and set the
    /// following flag. `None` if the plan does not exist.
    async fn adjust_followers(
        &self,
        id: Uuid,
        delta: i32,
        following: bool,
    ) -> Result<Option<LearningPlan>, StoreError>;

    /// Delete a plan and its children. Returns whether anything was removed.
    async fn delete_plan(&self, id: Uuid) -> Result<bool, StoreError>;
}

const _: () = {
    fn _assert_object_safe(_: &dyn PlanStore) {}
};

/// Distinguish a versioned write that matched nothing: either the plan is
/// gone or someone else moved its version on.
pub(crate) fn missed_write(id: Uuid, expected: i64, current: Option<&LearningPlan>) -> StoreError {
    match current {
        Some(plan) => StoreError::Conflict {
            id,
            expected,
            actual: plan.version,
        },
        None => StoreError::NotFound {
            entity: "learning plan",
            id,
        },
    }
}
