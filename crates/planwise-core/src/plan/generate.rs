//! Plan generation: turn a subject and difficulty into a populated draft.
//!
//! Title, description and resources are table lookups. Topics are a uniform
//! random subset of the subject's pool, drawn without replacement by
//! shuffling a copy of the pool and taking a prefix. The random source is
//! supplied by the caller so a seeded `StdRng` makes the draw reproducible.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::catalog::{CatalogResource, Difficulty, Subject};
use crate::error::PlanError;

/// Used when a request does not specify `estimatedDays`.
pub const DEFAULT_ESTIMATED_DAYS: i32 = 30;

/// Stored subject (and, capitalised, the title suffix) for a blank subject.
pub const GENERAL_SUBJECT: &str = "general";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Everything the generator decides, before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDraft {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub estimated_days: i32,
    pub topics: Vec<&'static str>,
    pub resources: Vec<CatalogResource>,
}

/// Build a draft plan for `request`.
///
/// Unknown or blank subjects and difficulties never fail; they select the
/// generic tables. A non-positive `estimatedDays` is rejected.
pub fn draft_plan<R: Rng + ?Sized>(
    request: &GenerationRequest,
    rng: &mut R,
) -> Result<PlanDraft, PlanError> {
    let estimated_days = request.estimated_days.unwrap_or(DEFAULT_ESTIMATED_DAYS);
    if estimated_days <= 0 {
        return Err(PlanError::InvalidArgument(format!(
            "estimatedDays must be positive, got {estimated_days}"
        )));
    }

    let subject_name = non_blank(&request.subject).unwrap_or(GENERAL_SUBJECT);
    let difficulty_name = non_blank(&request.difficulty).unwrap_or(GENERAL_SUBJECT);
    let subject = Subject::parse(subject_name);
    let difficulty = Difficulty::parse(difficulty_name);

    let description = match request.description.as_deref() {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => describe(subject_name, difficulty_name),
    };

    Ok(PlanDraft {
        title: format!("{}{}", difficulty.title_prefix(), capitalize(subject_name)),
        description,
        subject: subject_name.to_owned(),
        estimated_days,
        topics: select_topics(subject, difficulty, rng),
        resources: subject.resource_pool(),
    })
}

/// Draw `difficulty.topic_count()` distinct topics from the subject's pool,
/// or the whole pool if it is smaller.
pub fn select_topics<R: Rng + ?Sized>(
    subject: Subject,
    difficulty: Difficulty,
    rng: &mut R,
) -> Vec<&'static str> {
    let mut pool = subject.topic_pool();
    pool.shuffle(rng);
    pool.truncate(difficulty.topic_count());
    pool
}

fn describe(subject: &str, difficulty: &str) -> String {
    format!(
        "A {} level learning plan designed to help you master {} concepts \
         through structured topics and curated resources.",
        difficulty.to_lowercase(),
        subject.to_lowercase()
    )
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// First character upper case, the rest lower case.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
