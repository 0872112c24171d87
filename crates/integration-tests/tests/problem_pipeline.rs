use domains::{
    ForumError, LogAction, LogFilter, ProblemPatch, ProblemRepository, SolutionRepository,
    TargetModel,
};
use integration_tests::{fake_problem, fake_solution, problem_titled, Forum};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_create_stamps_actor_and_logs_creation() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    assert_eq!(problem.created_by, forum.owner);
    assert!(forum.store.problems.find_by_id(problem.id).await.unwrap().is_some());

    let logs = assert_ok!(
        forum
            .services
            .audit
            .logs(LogFilter {
                action: Some(LogAction::Create),
                target_model: Some(TargetModel::Problem),
                target_id: Some(problem.id.as_uuid()),
            })
            .await
    );
    assert_eq!(logs.len(), 1);
    assert!(logs[0].is_success);
    assert_eq!(logs[0].user_id, Some(forum.owner));
}

#[tokio::test]
async fn test_second_create_inside_window_is_rate_limited() {
    let forum = Forum::with_window(Duration::from_secs(60));
    assert_ok!(forum.services.problems.create(fake_problem()).await);

    let err = assert_err!(forum.services.problems.create(fake_problem()).await);
    assert!(matches!(err, ForumError::RateLimited(_)));
    assert_eq!(forum.store.problems.len(), 1);
}

#[tokio::test]
async fn test_rate_limit_is_per_actor() {
    let forum = Forum::with_window(Duration::from_secs(60));
    assert_ok!(forum.services.problems.create(fake_problem()).await);

    forum.act_as_stranger();
    assert_ok!(forum.services.problems.create(fake_problem()).await);
    assert_eq!(forum.store.problems.len(), 2);
}

#[tokio::test]
async fn test_duplicate_title_inserts_nothing() {
    let forum = Forum::new();
    assert_ok!(forum.services.problems.create(problem_titled("Trait objects and generics")).await);
    let logs_before = forum.store.logs.len().await;

    let err = assert_err!(
        forum
            .services
            .problems
            .create(problem_titled("  TRAIT OBJECTS AND GENERICS "))
            .await
    );
    assert!(matches!(err, ForumError::DuplicateTitle(_)));
    assert_eq!(forum.store.problems.len(), 1);
    assert_eq!(forum.store.logs.len().await, logs_before);
}

#[tokio::test]
async fn test_similar_but_not_equal_title_is_allowed() {
    let forum = Forum::new();
    assert_ok!(forum.services.problems.create(problem_titled("Pinning futures")).await);
    assert_ok!(forum.services.problems.create(problem_titled("Pinning futures safely")).await);
    assert_eq!(forum.store.problems.len(), 2);
}

#[tokio::test]
async fn test_failed_audit_removes_created_problem() {
    let forum = Forum::new();
    forum.store.logs.fail_writes().set(true);

    let err = assert_err!(forum.services.problems.create(fake_problem()).await);
    assert!(matches!(&err, ForumError::LogFailure(msg) if msg.contains("rolled back")));
    assert!(forum.store.problems.is_empty());
}

#[tokio::test]
async fn test_failed_audit_withdraws_vote() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    forum.store.logs.fail_writes().set(true);

    let err = assert_err!(forum.services.problems.vote(problem.id, true).await);
    assert!(matches!(err, ForumError::LogFailure(_)));

    let stored = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(stored.up_votes, 0);
}

#[tokio::test]
async fn test_stranger_cannot_update() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    forum.act_as_stranger();
    let patch = ProblemPatch {
        details: Some("hijacked".into()),
        ..Default::default()
    };
    let err = assert_err!(forum.services.problems.update(problem.id, patch).await);
    assert!(matches!(err, ForumError::Unauthorized(_)));

    let stored = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(stored, problem);
}

#[tokio::test]
async fn test_owner_update_and_audit_failure_restores_snapshot() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    let patch = ProblemPatch {
        details: Some("clarified".into()),
        ..Default::default()
    };
    let updated = assert_ok!(forum.services.problems.update(problem.id, patch).await);
    assert_eq!(updated.details, "clarified");

    forum.store.logs.fail_writes().set(true);
    let patch = ProblemPatch {
        details: Some("lost edit".into()),
        ..Default::default()
    };
    let err = assert_err!(forum.services.problems.update(problem.id, patch).await);
    assert!(matches!(err, ForumError::LogFailure(_)));

    let stored = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(stored.details, "clarified");
}

#[tokio::test]
async fn test_renaming_onto_existing_title_is_duplicate() {
    let forum = Forum::new();
    assert_ok!(forum.services.problems.create(problem_titled("Send bounds")).await);
    let other = assert_ok!(forum.services.problems.create(problem_titled("Sync bounds")).await);

    let patch = ProblemPatch {
        title: Some("send BOUNDS".into()),
        ..Default::default()
    };
    let err = assert_err!(forum.services.problems.update(other.id, patch).await);
    assert!(matches!(err, ForumError::DuplicateTitle(_)));
}

#[tokio::test]
async fn test_delete_cascades_to_solutions() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);
    assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    let deleted = assert_ok!(forum.services.problems.delete(problem.id).await);
    assert_eq!(deleted.solution_count, 2);

    let remaining = assert_ok!(forum.store.solutions.find_by_problem(problem.id).await);
    assert!(remaining.is_empty());
    let err = assert_err!(forum.services.problems.get(problem.id).await);
    assert!(matches!(err, ForumError::NotFound { .. }));
}

#[tokio::test]
async fn test_failed_audit_on_delete_reinserts_problem() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.store.logs.fail_writes().set(true);
    let err = assert_err!(forum.services.problems.delete(problem.id).await);
    assert!(matches!(err, ForumError::LogFailure(_)));

    let restored = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(restored.solution_count, 1);
    assert_eq!(forum.store.solutions.len(), 1);
}

#[tokio::test]
async fn test_stranger_cannot_delete() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    forum.act_as_stranger();
    let err = assert_err!(forum.services.problems.delete(problem.id).await);
    assert!(matches!(err, ForumError::Unauthorized(_)));
    assert_eq!(forum.store.problems.len(), 1);
}

#[tokio::test]
async fn test_concurrent_votes_are_all_counted() {
    let forum = Arc::new(Forum::new());
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    let mut handles = Vec::new();
    for i in 0..40 {
        let forum = forum.clone();
        handles.push(tokio::spawn(async move {
            forum.services.problems.vote(problem.id, i % 4 != 0).await
        }));
    }
    for handle in handles {
        assert_ok!(handle.await.unwrap());
    }

    let stored = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(stored.up_votes, 30);
    assert_eq!(stored.down_votes, 10);
}

#[tokio::test]
async fn test_view_increments_views() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    assert_ok!(forum.services.problems.view(problem.id).await);
    let details = assert_ok!(forum.services.problems.view(problem.id).await);
    assert_eq!(details.problem.views, 2);
    assert!(details.solutions.is_empty());
}

#[tokio::test]
async fn test_failed_cascade_still_deletes_problem_and_records_failure() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.store.solutions.fail_writes().set(true);
    let deleted = assert_ok!(forum.services.problems.delete(problem.id).await);
    assert_eq!(deleted.id, problem.id);
    assert!(forum.store.problems.find_by_id(problem.id).await.unwrap().is_none());
    assert_eq!(forum.store.solutions.len(), 1);

    let failures = assert_ok!(
        forum
            .services
            .audit
            .logs(LogFilter {
                action: Some(LogAction::Delete),
                target_model: Some(TargetModel::Solution),
                target_id: None,
            })
            .await
    );
    assert_eq!(failures.len(), 1);
    assert!(!failures[0].is_success);
    assert!(failures[0].details.as_deref().unwrap_or_default().contains("solution store rejected"));

    let problem_delete = assert_ok!(
        forum
            .services
            .audit
            .logs(LogFilter {
                action: Some(LogAction::Delete),
                target_model: Some(TargetModel::Problem),
                target_id: Some(problem.id.as_uuid()),
            })
            .await
    );
    assert_eq!(problem_delete.len(), 1);
    assert!(problem_delete[0].is_success);
}

#[tokio::test]
async fn test_failed_view_count_leaves_failure_record() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);

    forum.store.problems.fail_writes().set(true);
    let err = assert_err!(forum.services.problems.view(problem.id).await);
    assert!(matches!(err, ForumError::Database(_)));

    let logs = assert_ok!(forum.services.audit.all().await);
    assert_eq!(logs.len(), 2);
    assert!(!logs[1].is_success);
    assert_eq!(logs[1].target_model, TargetModel::Problem);
}
