//! The plan service over [`PgPlanStore`], against a real PostgreSQL.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use planwise_core::PlanError;
use planwise_core::StoreError;
use planwise_core::plan::{GenerationRequest, PlanService};
use planwise_core::store::{NewTopic, PgPlanStore, PlanStore};
use planwise_db::queries::plans::PlanChanges;
use planwise_test_utils::TestDb;

fn generation(subject: &str, difficulty: &str) -> GenerationRequest {
    GenerationRequest {
        subject: subject.to_string(),
        difficulty: difficulty.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn generated_plan_round_trips_through_postgres() {
    let db = TestDb::create().await;
    let service = PlanService::new(Arc::new(PgPlanStore::new(db.pool.clone())));
    let owner = Uuid::new_v4();

    let created = service
        .generate(&generation("english", "advanced"), owner, &mut StdRng::seed_from_u64(2))
        .await
        .expect("generate should succeed");
    assert_eq!(created.topics.len(), 9);
    assert_eq!(created.resources.len(), 3);

    let fetched = service.get(created.plan.id).await.unwrap();
    let titles = |topics: &[planwise_db::models::Topic]| {
        topics.iter().map(|t| t.title.clone()).collect::<Vec<_>>()
    };
    assert_eq!(titles(&fetched.topics), titles(&created.topics));
    assert_eq!(fetched.resources[0].title, "Purdue Online Writing Lab");
    assert_eq!(fetched.resources[0].kind, "document");

    db.cleanup().await;
}

#[tokio::test]
async fn toggle_persists_topic_and_completion_together() {
    let db = TestDb::create().await;
    let service = PlanService::new(Arc::new(PgPlanStore::new(db.pool.clone())));
    let owner = Uuid::new_v4();

    let created = service
        .generate(&generation("maths", "beginner"), owner, &mut StdRng::seed_from_u64(4))
        .await
        .unwrap();
    let topic = &created.topics[2];

    let toggled = service
        .toggle_topic(created.plan.id, topic.id, owner)
        .await
        .unwrap();
    assert_eq!(toggled.plan.completion_percentage, 20.0);

    let reread = service.get(created.plan.id).await.unwrap();
    assert_eq!(reread.plan.completion_percentage, 20.0);
    assert!(reread.topics.iter().find(|t| t.id == topic.id).unwrap().completed);
    assert_eq!(reread.plan.version, created.plan.version + 1);

    db.cleanup().await;
}

#[tokio::test]
async fn stale_toggle_rolls_back_topic_change() {
    let db = TestDb::create().await;
    let store = PgPlanStore::new(db.pool.clone());
    let service = PlanService::new(Arc::new(store.clone()));
    let owner = Uuid::new_v4();

    let created = service
        .generate(&generation("science", "beginner"), owner, &mut StdRng::seed_from_u64(8))
        .await
        .unwrap();
    service.follow(created.plan.id, owner).await.unwrap();

    // Version 1 is stale after the follow bumped it.
    let err = store
        .record_topic_toggle(created.plan.id, 1, created.topics[0].id, true, 20.0)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict { actual: 2, .. }), "got {err:?}");

    let topic = store.get_topic(created.topics[0].id).await.unwrap().unwrap();
    assert!(!topic.completed);

    db.cleanup().await;
}

#[tokio::test]
async fn replace_plan_swaps_children_atomically() {
    let db = TestDb::create().await;
    let store = PgPlanStore::new(db.pool.clone());
    let service = PlanService::new(Arc::new(store.clone()));
    let owner = Uuid::new_v4();

    let created = service
        .generate(&generation("maths", "advanced"), owner, &mut StdRng::seed_from_u64(6))
        .await
        .unwrap();
    let changes = PlanChanges {
        title: "Trimmed",
        description: "",
        subject: "maths",
        estimated_days: 7,
        completion_percentage: 100.0,
    };
    let topics = [NewTopic {
        title: "Matrices",
        completed: true,
    }];

    let replaced = store
        .replace_plan(created.plan.id, created.plan.version, &changes, &topics, &[])
        .await
        .unwrap();
    assert_eq!(replaced.topics.len(), 1);
    assert_eq!(store.list_topics(created.plan.id).await.unwrap().len(), 1);
    assert!(store.list_resources(created.plan.id).await.unwrap().is_empty());

    let err = store
        .replace_plan(Uuid::new_v4(), 1, &changes, &topics, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }), "got {err:?}");

    db.cleanup().await;
}

#[tokio::test]
async fn concurrent_toggles_do_not_lose_updates() {
    let db = TestDb::create().await;
    let service = PlanService::new(Arc::new(PgPlanStore::new(db.pool.clone())));
    let owner = Uuid::new_v4();

    let created = service
        .generate(&generation("english", "beginner"), owner, &mut StdRng::seed_from_u64(10))
        .await
        .unwrap();
    let plan_id = created.plan.id;

    let handles: Vec<_> = created
        .topics
        .iter()
        .map(|topic| {
            let service = service.clone();
            let topic_id = topic.id;
            tokio::spawn(async move { service.toggle_topic(plan_id, topic_id, owner).await })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => applied += 1,
            Err(PlanError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(applied >= 1);

    // Whatever interleaving happened, the stored percentage matches the
    // stored topics.
    let reread = service.get(plan_id).await.unwrap();
    let done = reread.topics.iter().filter(|t| t.completed).count();
    assert_eq!(done, applied);
    assert_eq!(
        reread.plan.completion_percentage,
        done as f64 / reread.topics.len() as f64 * 100.0
    );

    db.cleanup().await;
}
