//! Learning plans: catalog-driven generation, caller input, progress
//! tracking and the service that ties them to a store.

pub mod catalog;
pub mod generate;
pub mod input;
pub mod progress;
pub mod service;
pub mod view;

pub use catalog::{CatalogResource, Difficulty, Subject};
pub use generate::{GenerationRequest, PlanDraft, draft_plan};
pub use input::{PlanInput, ResourceInput, TopicInput};
pub use progress::completion_percentage;
pub use service::PlanService;
pub use view::{PlanView, ResourceView, TopicView};
