//! Operator CLI handlers for `planwise plan` subcommands.
//!
//! Implements:
//! - `planwise plan generate`          -- generate a plan from the catalog
//! - `planwise plan create <file>`     -- create a plan from a TOML file
//! - `planwise plan list`              -- list plans, optionally by owner
//! - `planwise plan show <plan-id>`    -- show one plan with its topics
//! - `planwise plan export <plan-id>`  -- write a plan back out as TOML
//! - `planwise plan toggle|follow|unfollow|delete`

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use planwise_core::plan::{GenerationRequest, PlanInput, PlanService};
use planwise_core::store::PlanDetail;

use crate::PlanCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
pub async fn run_plan_command(command: PlanCommands, service: &PlanService) -> Result<()> {
    match command {
        PlanCommands::Generate {
            subject,
            difficulty,
            days,
            description,
            seed,
            user,
        } => {
            let request = GenerationRequest {
                subject,
                difficulty,
                estimated_days: days,
                description,
            };
            cmd_generate(service, &request, user, seed).await
        }
        PlanCommands::Create { file, user } => cmd_create(service, &file, user).await,
        PlanCommands::List { owner } => cmd_list(service, owner.as_deref()).await,
        PlanCommands::Show { plan_id } => cmd_show(service, &plan_id).await,
        PlanCommands::Export { plan_id, output } => {
            cmd_export(service, &plan_id, output.as_deref()).await
        }
        PlanCommands::Toggle {
            plan_id,
            topic_id,
            user,
        } => cmd_toggle(service, &plan_id, &topic_id, user).await,
        PlanCommands::Follow { plan_id, user } => {
            let detail = service.follow(parse_id("plan", &plan_id)?, user).await?;
            println!("Following {} ({} followers).", detail.plan.title, detail.plan.followers);
            Ok(())
        }
        PlanCommands::Unfollow { plan_id, user } => {
            let detail = service.unfollow(parse_id("plan", &plan_id)?, user).await?;
            println!("Unfollowed {} ({} followers).", detail.plan.title, detail.plan.followers);
            Ok(())
        }
        PlanCommands::Delete { plan_id, user } => {
            service.delete(parse_id("plan", &plan_id)?, user).await?;
            println!("Plan {plan_id} deleted.");
            Ok(())
        }
    }
}

fn parse_id(what: &str, raw: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("invalid {what} ID: {raw:?}"))
}

// -----------------------------------------------------------------------
// planwise plan generate
// -----------------------------------------------------------------------

async fn cmd_generate(
    service: &PlanService,
    request: &GenerationRequest,
    user: Uuid,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let detail = service.generate(request, user, &mut rng).await?;

    println!("Plan generated.");
    println!();
    print!("{}", render_detail(&detail));
    Ok(())
}

// -----------------------------------------------------------------------
// planwise plan create <file>
// -----------------------------------------------------------------------

async fn cmd_create(service: &PlanService, file_path: &str, user: Uuid) -> Result<()> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read plan file: {file_path}"))?;
    let input = PlanInput::from_toml(&content)
        .with_context(|| format!("failed to parse plan file: {file_path}"))?;

    let detail = service.create(&input, user).await?;

    println!("Plan created.");
    println!();
    print!("{}", render_detail(&detail));
    Ok(())
}

// -----------------------------------------------------------------------
// planwise plan list
// -----------------------------------------------------------------------

async fn cmd_list(service: &PlanService, owner: Option<&str>) -> Result<()> {
    let plans = service.list(owner).await?;

    if plans.is_empty() {
        println!("No plans found. Use `planwise plan generate` to create one.");
        return Ok(());
    }

    print!("{}", render_table(&plans));
    Ok(())
}

/// One row per plan: id, title, subject, progress and creation date.
fn render_table(plans: &[PlanDetail]) -> String {
    // ID is always 36 chars (UUID).
    let id_w = 36;
    let title_w = plans
        .iter()
        .map(|d| d.plan.title.chars().count())
        .max()
        .unwrap_or(5)
        .max(5);
    let subject_w = plans
        .iter()
        .map(|d| d.plan.subject.chars().count())
        .max()
        .unwrap_or(7)
        .max(7);
    let done_w = 8;

    let mut out = format!(
        "{:<id_w$}  {:<title_w$}  {:<subject_w$}  {:>done_w$}  {:>9}  CREATED\n",
        "ID", "TITLE", "SUBJECT", "PROGRESS", "FOLLOWERS",
    );
    for detail in plans {
        let plan = &detail.plan;
        let done = detail.topics.iter().filter(|t| t.completed).count();
        let progress = format!("{done}/{}", detail.topics.len());
        out.push_str(&format!(
            "{:<id_w$}  {:<title_w$}  {:<subject_w$}  {:>done_w$}  {:>9}  {}\n",
            plan.id,
            plan.title,
            plan.subject,
            progress,
            plan.followers,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// planwise plan show <plan-id>
// -----------------------------------------------------------------------

async fn cmd_show(service: &PlanService, plan_id: &str) -> Result<()> {
    let detail = service.get(parse_id("plan", plan_id)?).await?;
    print!("{}", render_detail(&detail));
    Ok(())
}

fn render_detail(detail: &PlanDetail) -> String {
    let plan = &detail.plan;
    let mut out = String::new();

    out.push_str(&format!("Plan: {}\n", plan.title));
    out.push_str(&format!("  ID:           {}\n", plan.id));
    out.push_str(&format!("  Owner:        {}\n", plan.owner_id));
    out.push_str(&format!("  Subject:      {}\n", plan.subject));
    out.push_str(&format!("  Days:         {}\n", plan.estimated_days));
    out.push_str(&format!("  Completion:   {:.1}%\n", plan.completion_percentage));
    out.push_str(&format!(
        "  Followers:    {}{}\n",
        plan.followers,
        if plan.following { " (following)" } else { "" }
    ));
    out.push_str(&format!("  Version:      {}\n", plan.version));
    out.push_str(&format!(
        "  Created:      {}\n",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if !plan.description.is_empty() {
        out.push_str(&format!("  Description:  {}\n", plan.description));
    }

    if !detail.topics.is_empty() {
        out.push_str("\nTopics:\n");
        for topic in &detail.topics {
            let mark = if topic.completed { "x" } else { " " };
            out.push_str(&format!("  [{mark}] {}  ({})\n", topic.title, topic.id));
        }
    }

    if !detail.resources.is_empty() {
        out.push_str("\nResources:\n");
        for resource in &detail.resources {
            out.push_str(&format!(
                "  {:<8} {}  {}\n",
                resource.kind, resource.title, resource.url
            ));
        }
    }

    out
}

// -----------------------------------------------------------------------
// planwise plan export <plan-id> [--output <file>]
// -----------------------------------------------------------------------

/// Write a stored plan as a TOML file that `planwise plan create` accepts.
async fn cmd_export(service: &PlanService, plan_id: &str, output: Option<&str>) -> Result<()> {
    let detail = service.get(parse_id("plan", plan_id)?).await?;
    let toml_content = PlanInput::from(&detail).to_toml()?;

    match output {
        Some(path) => {
            std::fs::write(path, &toml_content)
                .with_context(|| format!("failed to write to {path}"))?;
            println!("Plan exported to {path}");
        }
        None => print!("{toml_content}"),
    }

    Ok(())
}

// -----------------------------------------------------------------------
// planwise plan toggle <plan-id> <topic-id>
// -----------------------------------------------------------------------

async fn cmd_toggle(
    service: &PlanService,
    plan_id: &str,
    topic_id: &str,
    user: Uuid,
) -> Result<()> {
    let plan_id = parse_id("plan", plan_id)?;
    let topic_id = parse_id("topic", topic_id)?;

    let detail = service.toggle_topic(plan_id, topic_id, user).await?;
    let state = detail
        .topics
        .iter()
        .find(|t| t.id == topic_id)
        .map(|t| if t.completed { "completed" } else { "not completed" })
        .unwrap_or("updated");

    println!("Topic {topic_id} marked {state}.");
    println!(
        "Plan {} is {:.1}% complete.",
        detail.plan.title, detail.plan.completion_percentage
    );
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use planwise_core::plan::TopicInput;
    use planwise_core::store::MemoryPlanStore;

    fn service() -> PlanService {
        PlanService::new(Arc::new(MemoryPlanStore::new()))
    }

    fn input() -> PlanInput {
        PlanInput::from_toml(
            r#"
title = "Mastering Maths"
subject = "maths"
estimatedDays = 21

[[topics]]
title = "Linear Equations"
completed = true

[[topics]]
title = "Matrices"

[[resources]]
title = "Khan Academy Math"
url = "https://www.khanacademy.org/math"
type = "video"
"#,
        )
        .unwrap()
    }

    #[test]
    fn parse_id_reports_what_was_wrong() {
        let err = parse_id("topic", "not-a-uuid").unwrap_err();
        assert!(err.to_string().contains("invalid topic ID"), "got: {err}");
        assert!(parse_id("plan", "550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[tokio::test]
    async fn render_detail_lists_topics_and_resources() {
        let detail = service().create(&input(), Uuid::new_v4()).await.unwrap();
        let text = render_detail(&detail);

        assert!(text.starts_with("Plan: Mastering Maths\n"));
        assert!(text.contains("Completion:   50.0%"));
        assert!(text.contains("[x] Linear Equations"));
        assert!(text.contains("[ ] Matrices"));
        assert!(text.contains("video    Khan Academy Math"));
    }

    #[tokio::test]
    async fn render_table_has_one_row_per_plan() {
        let service = service();
        let owner = Uuid::new_v4();
        service.create(&input(), owner).await.unwrap();
        let mut second = input();
        second.title = "A much longer plan title than the first".to_string();
        second.topics.push(TopicInput {
            title: "Trigonometry".to_string(),
            completed: false,
        });
        service.create(&second, owner).await.unwrap();

        let plans = service.list(None).await.unwrap();
        let table = render_table(&plans);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(table.contains("1/2"));
        assert!(table.contains("1/3"));
    }

    #[tokio::test]
    async fn export_round_trips_through_create() {
        let service = service();
        let owner = Uuid::new_v4();
        let exported = service.create(&input(), owner).await.unwrap();

        let toml_content = PlanInput::from(&exported).to_toml().unwrap();
        let reparsed = PlanInput::from_toml(&toml_content).unwrap();
        let copy = service.create(&reparsed, owner).await.unwrap();

        assert_eq!(copy.plan.title, exported.plan.title);
        assert_eq!(copy.plan.completion_percentage, 50.0);
        assert_eq!(copy.topics.len(), 2);
        assert_eq!(copy.resources[0].kind, "video");
    }
}
