//! Response shapes for plans, built by explicit mapping from store rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use planwise_db::models::{Resource, Topic};

use crate::store::PlanDetail;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub completion_percentage: f64,
    pub estimated_days: i32,
    pub followers: i32,
    pub created_at: DateTime<Utc>,
    pub following: bool,
    pub owner_id: Uuid,
    pub version: i64,
    pub topics: Vec<TopicView>,
    pub resources: Vec<ResourceView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicView {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceView {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<Topic> for TopicView {
    fn from(topic: Topic) -> Self {
        Self {
            id: topic.id,
            title: topic.title,
            completed: topic.completed,
        }
    }
}

impl From<Resource> for ResourceView {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            title: resource.title,
            url: resource.url,
            kind: resource.kind,
        }
    }
}

impl From<PlanDetail> for PlanView {
    fn from(detail: PlanDetail) -> Self {
        let PlanDetail {
            plan,
            topics,
            resources,
        } = detail;

        Self {
            id: plan.id,
            title: plan.title,
            description: plan.description,
            subject: plan.subject,
            completion_percentage: plan.completion_percentage,
            estimated_days: plan.estimated_days,
            followers: plan.followers,
            created_at: plan.created_at,
            following: plan.following,
            owner_id: plan.owner_id,
            version: plan.version,
            topics: topics.into_iter().map(TopicView::from).collect(),
            resources: resources.into_iter().map(ResourceView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use planwise_db::models::LearningPlan;

    use super::*;

    #[test]
    fn serializes_with_camel_case_and_type_key() {
        let plan_id = Uuid::new_v4();
        let detail = PlanDetail {
            plan: LearningPlan {
                id: plan_id,
                owner_id: Uuid::nil(),
                title: "Introduction to Science".to_string(),
                description: String::new(),
                subject: "science".to_string(),
                completion_percentage: 50.0,
                estimated_days: 30,
                followers: 2,
                following: true,
                version: 4,
                created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
            },
            topics: vec![Topic {
                id: Uuid::nil(),
                plan_id,
                position: 0,
                title: "Genetics".to_string(),
                completed: true,
            }],
            resources: vec![Resource {
                id: Uuid::nil(),
                plan_id,
                position: 0,
                title: "NASA Science".to_string(),
                url: "https://science.nasa.gov/".to_string(),
                kind: "link".to_string(),
            }],
        };

        let json = serde_json::to_value(PlanView::from(detail)).unwrap();

        assert_eq!(json["completionPercentage"], 50.0);
        assert_eq!(json["estimatedDays"], 30);
        assert_eq!(json["ownerId"], Uuid::nil().to_string());
        assert_eq!(json["createdAt"], "2025-03-01T12:00:00Z");
        assert_eq!(json["topics"][0]["completed"], true);
        assert!(json["topics"][0].get("planId").is_none());
        assert_eq!(json["resources"][0]["type"], "link");
    }
}
