//! Learning plan domain logic: plan generation from the subject catalog,
//! topic progress tracking, and ownership rules for plan CRUD, behind a
//! storage-agnostic [`store::PlanStore`].

pub mod clock;
pub mod error;
pub mod plan;
pub mod store;

pub use error::{PlanError, StoreError};
