//! The whole forum driven over HTTP, with the actor switched between calls.

use api_adapters::{router, AppState, Metrics};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use integration_tests::Forum;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn http(forum: &Forum) -> Router {
    router(AppState::new(forum.services.clone(), Arc::new(Metrics::new())))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_problem_lifecycle_over_http() {
    let forum = Forum::new();
    let app = http(&forum);

    let (status, created) = call(
        &app,
        Method::POST,
        "/forum/problem",
        Some(json!({ "title": "X", "details": "Y", "status": "ACTIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let problem_id = created["data"]["id"].as_str().unwrap().to_owned();

    let (status, voted) = call(&app, Method::POST, &format!("/forum/problem/upvote/{problem_id}/true"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voted["data"]["upVotes"], 1);

    let (status, solution) = call(
        &app,
        Method::POST,
        &format!("/forum/solution/{problem_id}"),
        Some(json!({ "details": "Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let solution_id = solution["data"]["id"].as_str().unwrap().to_owned();

    let (status, viewed) = call(&app, Method::GET, &format!("/forum/problem/{problem_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(viewed["data"]["problem"]["solutionCount"], 1);
    assert_eq!(viewed["data"]["problem"]["solutions"], json!([solution_id]));
    assert_eq!(viewed["data"]["solutions"][0]["details"], "Z");

    let (status, _) = call(&app, Method::PUT, &format!("/forum/solution/upvote/{solution_id}/false"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, deleted) = call(&app, Method::DELETE, &format!("/forum/problem/{problem_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["message"], "Problem deleted successfully");

    let (status, _) = call(&app, Method::GET, &format!("/forum/problem/{problem_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(forum.store.solutions.is_empty());

    let (status, logs) = call(&app, Method::GET, "/forum/log/search?action=DELETE", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_foreign_edits_are_forbidden_over_http() {
    let forum = Forum::new();
    let app = http(&forum);

    let (_, created) = call(
        &app,
        Method::POST,
        "/forum/problem",
        Some(json!({ "title": "Lifetimes in closures", "details": "borrowed value does not live long enough" })),
    )
    .await;
    let problem_id = created["data"]["id"].as_str().unwrap().to_owned();

    forum.act_as_stranger();
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/forum/problem/{problem_id}"),
        Some(json!({ "details": "spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["statusCode"], 403);

    let (status, _) = call(&app, Method::DELETE, &format!("/forum/problem/{problem_id}"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    forum.act_as_owner();
    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/forum/problem/{problem_id}"),
        Some(json!({ "details": "closure captures by reference" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["details"], "closure captures by reference");
}

#[tokio::test]
async fn test_audit_failure_surfaces_as_server_error() {
    let forum = Forum::new();
    let app = http(&forum);
    forum.store.logs.fail_writes().set(true);

    let (status, body) = call(
        &app,
        Method::POST,
        "/forum/problem",
        Some(json!({ "title": "Unlogged", "details": "never kept" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);
    assert!(forum.store.problems.is_empty());
}
