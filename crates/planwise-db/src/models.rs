use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of external resource attached to a plan.
///
/// The set is open: anything other than the three known kinds is kept
/// verbatim in [`ResourceKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Video,
    Document,
    Link,
    Other(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Video => "video",
            Self::Document => "document",
            Self::Link => "link",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "video" => Self::Video,
            "document" => Self::Document,
            "link" => Self::Link,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A learning plan owned by a single user.
///
/// `completion_percentage` is derived from the plan's topics and is only
/// written alongside a recount. `version` starts at 1 and increases on every
/// write to the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LearningPlan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub completion_percentage: f64,
    pub estimated_days: i32,
    pub followers: i32,
    pub following: bool,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// A checkable unit of a plan's curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Topic {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub position: i32,
    pub title: String,
    pub completed: bool,
}

/// An external reference attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub position: i32,
    pub title: String,
    pub url: String,
    pub kind: String,
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        ResourceKind::from(self.kind.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
