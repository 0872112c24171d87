//! The create / vote / answer walkthrough, checked field by field.

use domains::{NewProblem, NewSolution, ProblemStatus};
use integration_tests::Forum;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_create_vote_answer() {
    let forum = Forum::new();
    let problems = &forum.services.problems;

    let created = assert_ok!(
        problems
            .create(NewProblem {
                title: "X".into(),
                details: "Y".into(),
                try_and_expect: None,
                tags: None,
                status: Some(ProblemStatus::Active),
            })
            .await
    );
    assert_eq!(created.title, "X");
    assert_eq!(created.details, "Y");
    assert_eq!(created.up_votes, 0);
    assert_eq!(created.down_votes, 0);
    assert_eq!(created.views, 0);
    assert_eq!(created.solution_count, 0);
    assert!(created.solutions.is_empty());

    let voted = assert_ok!(problems.vote(created.id, true).await);
    assert_eq!(voted.up_votes, 1);
    assert_eq!(voted.down_votes, 0);

    let solution = assert_ok!(
        forum
            .services
            .solutions
            .create(created.id, NewSolution { details: "Z".into() })
            .await
    );
    assert_eq!(solution.problem_id, created.id);

    let after = assert_ok!(problems.get(created.id).await);
    assert_eq!(after.solution_count, 1);
    assert_eq!(after.solutions, vec![solution.id]);
    assert_eq!(after.up_votes, 1);
}
