use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use crate::shell::http::router;
use crate::tests::fixtures::events::{NewEventBuilder, VERTRETER_UPDATED};
use crate::tests::fixtures::state::test_app;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post_event(app: &Router, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

/// Poll the aggregate endpoint the way a client would, tolerating 404
/// while the projector catches up.
async fn poll_aggregate(app: &Router, uri: &str, applied_version: u64) -> Option<Value> {
    for _ in 0..300 {
        let (status, json) = get(app, uri).await;
        if status == StatusCode::OK && json["appliedVersion"] == applied_version {
            return Some(json);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

#[tokio::test]
async fn ingests_reads_back_and_projects_then_rejects_a_reused_version() {
    let test = test_app();
    let app = router(test.state.clone());
    let e1 = Uuid::new_v4();

    let first = NewEventBuilder::new()
        .id(e1)
        .subject("A")
        .data(json!({ "x": 1 }))
        .body();
    let (status, _) = post_event(&app, first.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, stored) = get(&app, &format!("/events/{e1}")).await;
    assert_eq!(status, StatusCode::OK);
    for field in ["id", "source", "type", "subject", "aggregateVersion", "data"] {
        assert_eq!(stored[field], first[field], "field {field} differs");
    }

    let model = poll_aggregate(&app, "/aggregates/vertreter/A", 1)
        .await
        .expect("aggregate never projected");
    assert_eq!(model["id"], "A");
    assert_eq!(model["state"]["x"], 1);

    let reused = NewEventBuilder::new()
        .subject("A")
        .event_type(VERTRETER_UPDATED)
        .data(json!({ "x": 2 }))
        .body();
    let (status, _) = post_event(&app, reused).await;
    assert_eq!(status, StatusCode::CONFLICT);

    test.state.projector.trigger().await.unwrap();
    let (status, unchanged) = get(&app, "/aggregates/vertreter/A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unchanged["appliedVersion"], 1);
    assert_eq!(unchanged["state"]["x"], 1);

    test.state.projector.shutdown().await;
}

#[tokio::test]
async fn converges_on_the_fold_of_every_ingested_event() {
    let test = test_app();
    let app = router(test.state.clone());

    for version in 1..=25u64 {
        let mut data = json!({ "counter": version });
        data[format!("v{version}")] = json!(true);
        let body = NewEventBuilder::new()
            .subject("B")
            .aggregate_version(version)
            .event_type(VERTRETER_UPDATED)
            .data(data)
            .body();
        let (status, _) = post_event(&app, body).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let model = poll_aggregate(&app, "/aggregates/vertreter/B", 25)
        .await
        .expect("aggregate never converged");
    assert_eq!(model["state"]["counter"], 25);
    assert_eq!(model["state"]["v1"], true);
    assert_eq!(model["state"]["v25"], true);

    test.state.projector.shutdown().await;
}

#[tokio::test]
async fn lets_exactly_one_of_many_concurrent_writers_win_a_version() {
    let test = test_app();
    let app = router(test.state.clone());

    let mut tasks = Vec::new();
    for writer in 0..10 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let body = NewEventBuilder::new()
                .subject("C")
                .data(json!({ "writer": writer }))
                .body();
            post_event(&app, body).await.0
        }));
    }
    let mut statuses = Vec::new();
    for task in tasks {
        statuses.push(task.await.unwrap());
    }

    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CREATED).count(),
        1
    );
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
        9
    );
    let (_, stream) = get(&app, "/events/subject/C").await;
    assert_eq!(stream.as_array().unwrap().len(), 1);

    test.state.projector.shutdown().await;
}

#[tokio::test]
async fn accepts_a_resubmitted_event_without_writing_it_twice() {
    let test = test_app();
    let app = router(test.state.clone());
    let body = NewEventBuilder::new().subject("D").body();

    let (first, created) = post_event(&app, body.clone()).await;
    let (second, duplicate) = post_event(&app, body).await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::ACCEPTED);
    assert_eq!(created, duplicate);
    let (_, stream) = get(&app, "/events/subject/D").await;
    assert_eq!(stream.as_array().unwrap().len(), 1);

    test.state.projector.shutdown().await;
}

#[tokio::test]
async fn replays_into_the_same_read_models() {
    let test = test_app();
    let app = router(test.state.clone());
    for subject in ["E", "F"] {
        for version in 1..=2u64 {
            let body = NewEventBuilder::new()
                .subject(subject)
                .aggregate_version(version)
                .data(json!({ "step": version }))
                .body();
            post_event(&app, body).await;
        }
    }
    let before = poll_aggregate(&app, "/aggregates/vertreter/F", 2)
        .await
        .expect("aggregate never projected");

    let (status, replayed) = send(
        &app,
        Request::post("/admin/replay").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replayed, json!({ "eventsReplayed": 4 }));

    let (_, after) = get(&app, "/aggregates/vertreter/F").await;
    assert_eq!(after["state"], before["state"]);
    assert_eq!(after["appliedVersion"], 2);

    let (status, health) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health, json!({ "status": "UP" }));

    test.state.projector.shutdown().await;
}
