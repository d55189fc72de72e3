//! Caller-supplied plan bodies for create and update.
//!
//! The same shape is accepted as a JSON request body and as a TOML file by
//! `planwise plan create`, and is what `planwise plan export` writes back:
//!
//! ```toml
//! title = "Mastering Maths"
//! subject = "maths"
//! estimatedDays = 21
//!
//! [[topics]]
//! title = "Linear Equations"
//! completed = true
//!
//! [[resources]]
//! title = "Khan Academy Math"
//! url = "https://www.khanacademy.org/math"
//! type = "video"
//! ```

use serde::{Deserialize, Serialize};

use planwise_db::models::ResourceKind;

use super::generate::DEFAULT_ESTIMATED_DAYS;
use crate::error::PlanError;
use crate::store::{NewResource, NewTopic, PlanDetail};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    #[serde(default = "default_estimated_days")]
    pub estimated_days: i32,
    /// Version the caller last saw. Update fails with a conflict when the
    /// stored plan has moved on. Ignored on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
    #[serde(default)]
    pub topics: Vec<TopicInput>,
    #[serde(default)]
    pub resources: Vec<ResourceInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInput {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInput {
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default = "default_resource_type")]
    pub kind: String,
}

fn default_estimated_days() -> i32 {
    DEFAULT_ESTIMATED_DAYS
}

fn default_resource_type() -> String {
    ResourceKind::Link.as_str().to_string()
}

impl PlanInput {
    /// Parse a TOML plan file.
    pub fn from_toml(content: &str) -> Result<Self, PlanError> {
        toml::from_str(content)
            .map_err(|e| PlanError::InvalidArgument(format!("invalid plan file: {e}")))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject bodies the store would refuse or that make no sense as a plan.
    pub fn validate(&self) -> Result<(), PlanError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("title must not be empty".to_string());
        }
        if self.estimated_days <= 0 {
            problems.push(format!(
                "estimatedDays must be positive, got {}",
                self.estimated_days
            ));
        }
        for (i, topic) in self.topics.iter().enumerate() {
            if topic.title.trim().is_empty() {
                problems.push(format!("topics[{i}] has an empty title"));
            }
        }
        for (i, resource) in self.resources.iter().enumerate() {
            if resource.url.trim().is_empty() {
                problems.push(format!("resources[{i}] has an empty url"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(PlanError::InvalidArgument(problems.join("; ")))
        }
    }

    pub(crate) fn new_topics(&self) -> Vec<NewTopic<'_>> {
        self.topics
            .iter()
            .map(|t| NewTopic {
                title: &t.title,
                completed: t.completed,
            })
            .collect()
    }

    pub(crate) fn new_resources(&self) -> Vec<NewResource<'_>> {
        self.resources
            .iter()
            .map(|r| NewResource {
                title: &r.title,
                url: &r.url,
                kind: ResourceKind::from(r.kind.as_str()),
            })
            .collect()
    }
}

impl From<&PlanDetail> for PlanInput {
    fn from(detail: &PlanDetail) -> Self {
        Self {
            title: detail.plan.title.clone(),
            description: detail.plan.description.clone(),
            subject: detail.plan.subject.clone(),
            estimated_days: detail.plan.estimated_days,
            topics: detail
                .topics
                .iter()
                .map(|t| TopicInput {
                    title: t.title.clone(),
                    completed: t.completed,
                })
                .collect(),
            resources: detail
                .resources
                .iter()
                .map(|r| ResourceInput {
                    title: r.title.clone(),
                    url: r.url.clone(),
                    kind: r.kind.clone(),
                })
                .collect(),
            expected_version: Some(detail.plan.version),
        }
    }
}
