use fitrank::models::{
    AchievementKey, ActivityRecord, ActivityType, Comment, Reaction, ReactionKind, ScoreCategory,
};
use fitrank::services::reconciler::NewActivity;
use uuid::Uuid;

mod common;
use common::test_state;

const NUM_CONCURRENT_PUBLISHES: usize = 10;

fn rank_announcement() -> NewActivity {
    NewActivity {
        activity_type: ActivityType::Ranking,
        category: Some(ScoreCategory::Strength),
        title: "Achieved Rank 1 👑".to_string(),
        description: "Ranked #1 in Strength".to_string(),
    }
}

#[tokio::test]
async fn test_publish_is_idempotent() {
    let state = test_state();
    let key = AchievementKey::rank(1, ScoreCategory::Strength);

    let first = state
        .reconciler
        .publish("alice", &key, rank_announcement())
        .await
        .expect("First publish failed");
    let second = state
        .reconciler
        .publish("alice", &key, rank_announcement())
        .await
        .expect("Second publish failed");

    assert_eq!(first.id, second.id, "Republishing the same fact must return the existing record");

    let records = state
        .activities
        .find_by_key("alice", &key)
        .await
        .expect("find_by_key failed");
    assert_eq!(records.len(), 1, "Only one record should exist for the fact");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_publish_then_reconcile_leaves_one_record() {
    // Two concurrent publishes can both miss the existence check and
    // both insert. That is allowed; reconcile must collapse the result
    // back to a single record no matter how many slipped through.
    let state = test_state();
    let key = AchievementKey::rank(2, ScoreCategory::Consistency);

    let mut handles = vec![];
    for _ in 0..NUM_CONCURRENT_PUBLISHES {
        let reconciler = state.reconciler.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            reconciler
                .publish(
                    "bob",
                    &key,
                    NewActivity {
                        activity_type: ActivityType::Ranking,
                        category: Some(ScoreCategory::Consistency),
                        title: "Achieved Rank 2 🥈".to_string(),
                        description: "Ranked #2 in Consistency".to_string(),
                    },
                )
                .await
        }));
    }

    for handle in handles {
        handle
            .await
            .expect("Task join failed")
            .expect("Publish failed");
    }

    let survivor = state
        .reconciler
        .reconcile("bob", &key)
        .await
        .expect("Reconcile failed")
        .expect("Expected a surviving record");

    let records = state
        .activities
        .find_by_key("bob", &key)
        .await
        .expect("find_by_key failed");
    assert_eq!(
        records.len(),
        1,
        "Reconcile must leave exactly one record per (user, key)"
    );
    assert_eq!(records[0].id, survivor.id);
}

#[tokio::test]
async fn test_reconcile_merges_engagement_into_survivor() {
    let state = test_state();
    let key = AchievementKey::parse("workout-complete-wk1-1700000000000");

    // Two duplicates created behind the reconciler's back, each with
    // engagement the other lacks.
    let older = ActivityRecord {
        id: Uuid::new_v4(),
        user_id: "carol".to_string(),
        activity_type: ActivityType::Achievement,
        achievement_key: Some(key.clone()),
        category: None,
        title: "Completed Push Workout".to_string(),
        description: "Bench Press: 3 sets × 10 reps with 60kg".to_string(),
        reactions: vec![
            Reaction {
                user_id: "dave".to_string(),
                kind: ReactionKind::Fire,
                created_at: "2026-02-01T10:00:00Z".to_string(),
            },
            Reaction {
                user_id: "erin".to_string(),
                kind: ReactionKind::Muscle,
                created_at: "2026-02-01T10:05:00Z".to_string(),
            },
        ],
        comments: vec![],
        created_at: "2026-02-01T09:00:00Z".to_string(),
    };
    let newer = ActivityRecord {
        id: Uuid::new_v4(),
        user_id: "carol".to_string(),
        activity_type: ActivityType::Achievement,
        achievement_key: Some(key.clone()),
        category: None,
        title: "Completed Push Workout".to_string(),
        description: "Bench Press: 3 sets × 10 reps with 60kg".to_string(),
        reactions: vec![],
        comments: vec![Comment {
            id: Uuid::new_v4(),
            user_id: "dave".to_string(),
            text: "Strong work".to_string(),
            created_at: "2026-02-01T11:00:00Z".to_string(),
        }],
        created_at: "2026-02-01T09:30:00Z".to_string(),
    };
    state.activities.create(&older).await.expect("create failed");
    state.activities.create(&newer).await.expect("create failed");

    let survivor = state
        .reconciler
        .reconcile("carol", &key)
        .await
        .expect("Reconcile failed")
        .expect("Expected a surviving record");

    // The older record has more engagement (2 reactions vs 1 comment),
    // so it wins, and the comment is merged into it.
    assert_eq!(survivor.id, older.id);
    assert_eq!(survivor.reactions.len(), 2);
    assert_eq!(survivor.comments.len(), 1);
    assert_eq!(survivor.comments[0].text, "Strong work");

    assert!(
        state
            .activities
            .get(newer.id)
            .await
            .expect("get failed")
            .is_none(),
        "The duplicate should be deleted"
    );
}

#[tokio::test]
async fn test_reconcile_is_idempotent() {
    let state = test_state();
    let key = AchievementKey::rank(3, ScoreCategory::WeightLoss);

    state
        .reconciler
        .publish(
            "frank",
            &key,
            NewActivity {
                activity_type: ActivityType::Ranking,
                category: Some(ScoreCategory::WeightLoss),
                title: "Achieved Rank 3 🥉".to_string(),
                description: "Ranked #3 in Weight Loss".to_string(),
            },
        )
        .await
        .expect("Publish failed");

    let first = state
        .reconciler
        .reconcile("frank", &key)
        .await
        .expect("First reconcile failed")
        .expect("Expected a record");
    let second = state
        .reconciler
        .reconcile("frank", &key)
        .await
        .expect("Second reconcile failed")
        .expect("Expected a record");

    assert_eq!(first.id, second.id);
    assert_eq!(first.reactions.len(), second.reactions.len());
    assert_eq!(first.comments.len(), second.comments.len());
}

#[tokio::test]
async fn test_reconcile_returns_none_for_unknown_key() {
    let state = test_state();
    let key = AchievementKey::parse("workout-complete-missing-0");

    let result = state
        .reconciler
        .reconcile("nobody", &key)
        .await
        .expect("Reconcile failed");
    assert!(result.is_none());
}
