//! Error taxonomy for learning plan operations.

use uuid::Uuid;

/// Failures reported by a [`crate::store::PlanStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("learning plan {id} was modified concurrently (expected version {expected}, found {actual})")]
    Conflict { id: Uuid, expected: i64, actual: i64 },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures surfaced to callers of [`crate::plan::PlanService`].
///
/// The HTTP layer maps each variant onto a status code; nothing here is
/// swallowed on the way.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage failure: {0:#}")]
    Storage(anyhow::Error),
}

impl PlanError {
    pub fn plan_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "learning plan",
            id,
        }
    }

    pub fn topic_not_found(id: Uuid) -> Self {
        Self::NotFound {
            entity: "topic",
            id,
        }
    }
}

impl From<StoreError> for PlanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            conflict @ StoreError::Conflict { .. } => Self::Conflict(conflict.to_string()),
            StoreError::Backend(source) => Self::Storage(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_becomes_plan_conflict() {
        let id = Uuid::nil();
        let err: PlanError = StoreError::Conflict {
            id,
            expected: 3,
            actual: 4,
        }
        .into();
        match err {
            PlanError::Conflict(msg) => {
                assert!(msg.contains("expected version 3"), "got: {msg}");
                assert!(msg.contains("found 4"), "got: {msg}");
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn store_not_found_keeps_entity() {
        let id = Uuid::new_v4();
        let err: PlanError = StoreError::NotFound { entity: "topic", id }.into();
        assert_eq!(err.to_string(), format!("topic {id} not found"));
    }

    #[test]
    fn backend_error_keeps_context_chain() {
        let source = anyhow::anyhow!("connection reset").context("failed to fetch topic");
        let err: PlanError = StoreError::Backend(source).into();
        let msg = err.to_string();
        assert!(msg.contains("failed to fetch topic"), "got: {msg}");
        assert!(msg.contains("connection reset"), "got: {msg}");
    }
}
