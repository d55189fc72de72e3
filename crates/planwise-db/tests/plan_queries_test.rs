//! Integration tests for the learning plan, topic and resource queries.
//!
//! Each test runs against its own migrated database on the shared test
//! server (see `planwise-test-utils`).

use chrono::Utc;
use uuid::Uuid;

use planwise_db::models::ResourceKind;
use planwise_db::queries::plans::{self, NewPlan, PlanChanges};
use planwise_db::queries::{resources, topics};
use planwise_test_utils::TestDb;

fn new_plan(owner_id: Uuid, title: &str) -> NewPlan<'_> {
    NewPlan {
        owner_id,
        title,
        description: "a plan for testing",
        subject: "maths",
        estimated_days: 30,
        completion_percentage: 0.0,
        created_at: Utc::now(),
    }
}

// -----------------------------------------------------------------------
// Plans
// -----------------------------------------------------------------------

#[tokio::test]
async fn insert_and_get_plan() {
    let db = TestDb::create().await;
    let owner = Uuid::new_v4();

    let plan = plans::insert_plan(&db.pool, &new_plan(owner, "Introduction to Maths"))
        .await
        .expect("insert_plan should succeed");

    assert_eq!(plan.owner_id, owner);
    assert_eq!(plan.title, "Introduction to Maths");
    assert_eq!(plan.followers, 0);
    assert!(!plan.following);
    assert_eq!(plan.version, 1);

    let fetched = plans::get_plan(&db.pool, plan.id)
        .await
        .expect("get_plan should succeed")
        .expect("plan should exist");
    assert_eq!(fetched, plan);

    db.cleanup().await;
}

#[tokio::test]
async fn get_missing_plan_returns_none() {
    let db = TestDb::create().await;

    let fetched = plans::get_plan(&db.pool, Uuid::new_v4())
        .await
        .expect("get_plan should succeed");
    assert!(fetched.is_none());

    db.cleanup().await;
}

#[tokio::test]
async fn list_plans_filters_by_owner() {
    let db = TestDb::create().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    plans::insert_plan(&db.pool, &new_plan(alice, "a1")).await.unwrap();
    plans::insert_plan(&db.pool, &new_plan(alice, "a2")).await.unwrap();
    plans::insert_plan(&db.pool, &new_plan(bob, "b1")).await.unwrap();

    let all = plans::list_plans(&db.pool).await.unwrap();
    assert_eq!(all.len(), 3);

    let alices = plans::list_plans_for_owner(&db.pool, alice).await.unwrap();
    assert_eq!(alices.len(), 2);
    assert!(alices.iter().all(|p| p.owner_id == alice));

    let nobody = plans::list_plans_for_owner(&db.pool, Uuid::new_v4())
        .await
        .unwrap();
    assert!(nobody.is_empty());

    db.cleanup().await;
}

#[tokio::test]
async fn update_plan_checks_version() {
    let db = TestDb::create().await;
    let plan = plans::insert_plan(&db.pool, &new_plan(Uuid::new_v4(), "before"))
        .await
        .unwrap();

    let changes = PlanChanges {
        title: "after",
        description: "rewritten",
        subject: "english",
        estimated_days: 12,
        completion_percentage: 0.0,
    };

    let updated = plans::update_plan(&db.pool, plan.id, plan.version, &changes)
        .await
        .unwrap()
        .expect("current version should match");
    assert_eq!(updated.title, "after");
    assert_eq!(updated.subject, "english");
    assert_eq!(updated.estimated_days, 12);
    assert_eq!(updated.version, plan.version + 1);

    // The first version is now stale.
    let stale = plans::update_plan(&db.pool, plan.id, plan.version, &changes)
        .await
        .unwrap();
    assert!(stale.is_none());

    db.cleanup().await;
}

#[tokio::test]
async fn adjust_followers_never_goes_negative() {
    let db = TestDb::create().await;
    let plan = plans::insert_plan(&db.pool, &new_plan(Uuid::new_v4(), "popular"))
        .await
        .unwrap();

    let followed = plans::adjust_followers(&db.pool, plan.id, 1, true)
        .await
        .unwrap()
        .unwrap();
    let followed = plans::adjust_followers(&db.pool, followed.id, 1, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(followed.followers, 2);
    assert!(followed.following);

    let mut current = followed;
    for _ in 0..3 {
        current = plans::adjust_followers(&db.pool, current.id, -1, false)
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(current.followers, 0);
    assert!(!current.following);

    let missing = plans::adjust_followers(&db.pool, Uuid::new_v4(), 1, true)
        .await
        .unwrap();
    assert!(missing.is_none());

    db.cleanup().await;
}

#[tokio::test]
async fn delete_plan_cascades_to_children() {
    let db = TestDb::create().await;
    let plan = plans::insert_plan(&db.pool, &new_plan(Uuid::new_v4(), "doomed"))
        .await
        .unwrap();

    let topic = topics::insert_topic(&db.pool, plan.id, 0, "Linear Equations", false)
        .await
        .unwrap();
    resources::insert_resource(
        &db.pool,
        plan.id,
        0,
        "Khan Academy Math",
        "https://www.khanacademy.org/math",
        &ResourceKind::Video,
    )
    .await
    .unwrap();

    assert!(plans::delete_plan(&db.pool, plan.id).await.unwrap());
    assert!(!plans::delete_plan(&db.pool, plan.id).await.unwrap());

    assert!(topics::get_topic(&db.pool, topic.id).await.unwrap().is_none());
    let remaining = resources::list_resources_for_plan(&db.pool, plan.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());

    db.cleanup().await;
}

// -----------------------------------------------------------------------
// Topics and resources
// -----------------------------------------------------------------------

#[tokio::test]
async fn topics_keep_position_order() {
    let db = TestDb::create().await;
    let plan = plans::insert_plan(&db.pool, &new_plan(Uuid::new_v4(), "ordered"))
        .await
        .unwrap();

    for (position, title) in ["Genetics", "Astronomy", "Earth Science"].iter().enumerate() {
        topics::insert_topic(&db.pool, plan.id, position as i32, title, false)
            .await
            .unwrap();
    }

    let listed = topics::list_topics_for_plan(&db.pool, plan.id).await.unwrap();
    let titles: Vec<&str> = listed.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, ["Genetics", "Astronomy", "Earth Science"]);

    db.cleanup().await;
}

#[tokio::test]
async fn set_topic_completed_is_scoped_to_plan() {
    let db = TestDb::create().await;
    let owner = Uuid::new_v4();
    let plan_a = plans::insert_plan(&db.pool, &new_plan(owner, "a")).await.unwrap();
    let plan_b = plans::insert_plan(&db.pool, &new_plan(owner, "b")).await.unwrap();
    let topic = topics::insert_topic(&db.pool, plan_a.id, 0, "Matrices", false)
        .await
        .unwrap();

    topics::set_topic_completed(&db.pool, plan_a.id, topic.id, true)
        .await
        .unwrap();
    let fetched = topics::get_topic(&db.pool, topic.id).await.unwrap().unwrap();
    assert!(fetched.completed);

    let err = topics::set_topic_completed(&db.pool, plan_b.id, topic.id, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not found"));

    db.cleanup().await;
}

#[tokio::test]
async fn resources_keep_unknown_kinds() {
    let db = TestDb::create().await;
    let plan = plans::insert_plan(&db.pool, &new_plan(Uuid::new_v4(), "listening"))
        .await
        .unwrap();

    resources::insert_resource(
        &db.pool,
        plan.id,
        0,
        "Some Podcast",
        "https://example.com/podcast",
        &ResourceKind::Other("podcast".to_string()),
    )
    .await
    .unwrap();

    let listed = resources::list_resources_for_plan(&db.pool, plan.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].kind(), ResourceKind::Other("podcast".to_string()));

    let removed = resources::delete_resources_for_plan(&db.pool, plan.id)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    db.cleanup().await;
}
