use domains::{
    ForumError, LogAction, LogFilter, ProblemId, ProblemRepository, SolutionPatch,
    SolutionRepository, TargetModel,
};
use integration_tests::{fake_problem, fake_solution, Forum};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_solution_on_missing_problem_is_not_found() {
    let forum = Forum::new();
    let err = assert_err!(forum.services.solutions.create(ProblemId::new(), fake_solution()).await);
    assert!(matches!(err, ForumError::NotFound { entity: "Problem", .. }));
    assert!(forum.store.solutions.is_empty());
}

#[tokio::test]
async fn test_create_attaches_solution_to_problem() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let solution = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    let parent = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(parent.solutions, vec![solution.id]);
    assert_eq!(parent.solution_count, 1);

    let logs = assert_ok!(
        forum
            .services
            .audit
            .logs(LogFilter {
                action: Some(LogAction::Create),
                target_model: Some(TargetModel::Solution),
                target_id: None,
            })
            .await
    );
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].target_id, Some(solution.id.as_uuid()));
}

#[tokio::test]
async fn test_failed_attach_leaves_no_solution() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    forum.store.problems.fail_writes().set(true);

    let err = assert_err!(forum.services.solutions.create(problem.id, fake_solution()).await);
    assert!(matches!(err, ForumError::Database(_)));
    assert!(forum.store.solutions.is_empty());
}

#[tokio::test]
async fn test_failed_audit_undoes_attach_and_insert() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    forum.store.logs.fail_writes().set(true);

    let err = assert_err!(forum.services.solutions.create(problem.id, fake_solution()).await);
    assert!(matches!(err, ForumError::LogFailure(_)));
    assert!(forum.store.solutions.is_empty());

    let parent = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert!(parent.solutions.is_empty());
    assert_eq!(parent.solution_count, 0);
}

#[tokio::test]
async fn test_delete_detaches_from_problem() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let keep = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);
    let drop = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    assert_ok!(forum.services.solutions.delete(drop.id).await);

    let parent = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(parent.solutions, vec![keep.id]);
    assert_eq!(parent.solution_count, 1);
    assert!(forum.store.solutions.find_by_id(drop.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_audit_on_delete_restores_solution_and_reference() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let solution = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.store.logs.fail_writes().set(true);
    let err = assert_err!(forum.services.solutions.delete(solution.id).await);
    assert!(matches!(err, ForumError::LogFailure(_)));

    let restored = forum.store.solutions.find_by_id(solution.id).await.unwrap().unwrap();
    assert_eq!(restored, solution);
    let parent = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(parent.solutions, vec![solution.id]);
    assert_eq!(parent.solution_count, 1);
}

#[tokio::test]
async fn test_stranger_cannot_edit_or_delete_solution() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let solution = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.act_as_stranger();
    let patch = SolutionPatch {
        details: "not mine".into(),
    };
    let err = assert_err!(forum.services.solutions.update(solution.id, patch).await);
    assert!(matches!(err, ForumError::Unauthorized(_)));
    let err = assert_err!(forum.services.solutions.delete(solution.id).await);
    assert!(matches!(err, ForumError::Unauthorized(_)));

    forum.act_as_owner();
    let patch = SolutionPatch {
        details: "mine".into(),
    };
    let updated = assert_ok!(forum.services.solutions.update(solution.id, patch).await);
    assert_eq!(updated.details, "mine");
}

#[tokio::test]
async fn test_solution_votes_and_listing() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let first = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);
    let second = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    assert_ok!(forum.services.solutions.vote(first.id, true).await);
    let voted = assert_ok!(forum.services.solutions.vote(first.id, false).await);
    assert_eq!((voted.up_votes, voted.down_votes), (1, 1));

    let listed = assert_ok!(forum.services.solutions.list_for_problem(problem.id).await);
    let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[tokio::test]
async fn test_failed_audit_on_update_restores_previous_details() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let solution = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.store.logs.fail_writes().set(true);
    let patch = SolutionPatch {
        details: "rewritten".into(),
    };
    let err = assert_err!(forum.services.solutions.update(solution.id, patch).await);
    assert!(matches!(&err, ForumError::LogFailure(msg) if msg.contains("rolled back")));

    let stored = forum.store.solutions.find_by_id(solution.id).await.unwrap().unwrap();
    assert_eq!(stored, solution);
}

#[tokio::test]
async fn test_failed_detach_on_delete_restores_solution() {
    let forum = Forum::new();
    let problem = assert_ok!(forum.services.problems.create(fake_problem()).await);
    let solution = assert_ok!(forum.services.solutions.create(problem.id, fake_solution()).await);

    forum.store.problems.fail_writes().set(true);
    let err = assert_err!(forum.services.solutions.delete(solution.id).await);
    assert!(matches!(&err, ForumError::Database(msg) if msg.contains("problem store rejected")));

    let restored = forum.store.solutions.find_by_id(solution.id).await.unwrap().unwrap();
    assert_eq!(restored, solution);
    let parent = forum.store.problems.find_by_id(problem.id).await.unwrap().unwrap();
    assert_eq!(parent.solutions, vec![solution.id]);

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
}
