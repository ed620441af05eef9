//! Integration tests for the import job lifecycle endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, get, post_empty, post_json};
use serde_json::json;
use taskforge_import::memory::MemoryStore;

/// Poll GET /jobs/{id} until the job reaches a terminal state, returning the
/// final response body.
async fn poll_job_until_terminal(app: Router, id: i64) -> serde_json::Value {
    for _ in 0..200 {
        let response = get(app.clone(), &format!("/api/v1/import/jobs/{id}")).await;
        let body = body_json(response).await;
        let status = body["data"]["job"]["status"].as_str().unwrap_or_default();
        if status == "completed" || status == "failed" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("import job {id} did not reach a terminal state in time");
}

// ---------------------------------------------------------------------------
// Test: POST /jobs creates a pending job
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_job_returns_201_pending() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));

    let response = post_json(
        app,
        "/api/v1/import/jobs",
        json!({
            "entity_type": "project",
            "csv_data": "Name,Key\nAlpha,AL1",
            "field_mapping": { "name": "Name", "key": "Key" },
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);

    let job = &body_json(response).await["data"];
    assert!(job["id"].is_i64());
    assert_eq!(job["status"], "pending");
    assert_eq!(job["entity_type"], "project");
    assert_eq!(job["processed_rows"], 0);
    assert_eq!(job["field_mapping"]["key"], "Key");
    // The uploaded text stays server-side.
    assert!(job.get("source_text").is_none());
    assert!(job["started_at"].is_null());
}

// ---------------------------------------------------------------------------
// Test: unknown job IDs return 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_returns_404() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));

    let response = get(app.clone(), "/api/v1/import/jobs/9999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");

    let response = post_empty(app, "/api/v1/import/jobs/9999/start").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: full lifecycle -- create, start, poll to completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn project_import_runs_to_completion() {
    let store = Arc::new(MemoryStore::with_default_reference_data());
    let app = common::build_test_app(store.clone());

    let response = post_json(
        app.clone(),
        "/api/v1/import/jobs",
        json!({
            "entity_type": "project",
            "csv_data": "Name,Key,Description\nAlpha Project,alpha,First\nBeta Project,beta,",
            "field_mapping": { "name": "Name", "key": "Key", "description": "Description" },
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/import/jobs/{id}/start")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let claimed = &body_json(response).await["data"];
    assert_eq!(claimed["status"], "importing");
    assert!(claimed["started_at"].is_string());

    let body = poll_job_until_terminal(app, id).await;
    let job = &body["data"]["job"];
    assert_eq!(job["status"], "completed");
    assert_eq!(job["processed_rows"], 2);
    assert_eq!(job["successful_rows"], 2);
    assert_eq!(job["failed_rows"], 0);
    assert!(job["completed_at"].is_string());
    assert_eq!(body["data"]["errors"].as_array().unwrap().len(), 0);

    // Keys were normalized on the way in.
    let keys = store.project_keys();
    assert!(keys.contains(&"ALPHA".to_string()));
    assert!(keys.contains(&"BETA".to_string()));
}

// ---------------------------------------------------------------------------
// Test: row failures land in the persisted error log
// ---------------------------------------------------------------------------

#[tokio::test]
async fn row_failures_are_reported_in_job_detail() {
    let store = Arc::new(MemoryStore::with_default_reference_data());
    store.seed_project("Alpha", "AL1");
    let app = common::build_test_app(store);

    let response = post_json(
        app.clone(),
        "/api/v1/import/jobs",
        json!({
            "entity_type": "work_item",
            "csv_data": "Title,Project\nFix login,Alpha\nAdd search,Ghost",
            "field_mapping": { "title": "Title", "project": "Project" },
        }),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/import/jobs/{id}/start")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = poll_job_until_terminal(app, id).await;
    let job = &body["data"]["job"];
    // A bad row never fails the job, only its own counters.
    assert_eq!(job["status"], "completed");
    assert_eq!(job["processed_rows"], 2);
    assert_eq!(job["successful_rows"], 1);
    assert_eq!(job["failed_rows"], 1);

    let errors = body["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["row_number"], 3);
    assert_eq!(errors[0]["field_name"], "project");
    assert_eq!(errors[0]["error_type"], "reference");
    assert_eq!(errors[0]["original_value"], "Ghost");
}

// ---------------------------------------------------------------------------
// Test: unknown entity type fails the whole job at start
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_entity_type_fails_the_job() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));

    // Creation accepts any entity type string.
    let response = post_json(
        app.clone(),
        "/api/v1/import/jobs",
        json!({
            "entity_type": "widget",
            "csv_data": "A\n1",
            "field_mapping": {},
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/import/jobs/{id}/start")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = poll_job_until_terminal(app, id).await;
    let job = &body["data"]["job"];
    assert_eq!(job["status"], "failed");
    assert_eq!(job["processed_rows"], 0);
    assert!(job["error_message"].as_str().unwrap().contains("widget"));
}

// ---------------------------------------------------------------------------
// Test: starting a job twice returns 409
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_start_returns_409() {
    let app = common::build_test_app(Arc::new(MemoryStore::with_default_reference_data()));

    let response = post_json(
        app.clone(),
        "/api/v1/import/jobs",
        json!({
            "entity_type": "project",
            "csv_data": "Name,Key\nAlpha,AL1",
            "field_mapping": { "name": "Name", "key": "Key" },
        }),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_empty(app.clone(), &format!("/api/v1/import/jobs/{id}/start")).await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = post_empty(app, &format!("/api/v1/import/jobs/{id}/start")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Test: GET /jobs lists newest first and honours limit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_jobs_newest_first_with_limit() {
    let app = common::build_test_app(Arc::new(MemoryStore::new()));

    let mut ids = Vec::new();
    for name in ["one", "two", "three"] {
        let response = post_json(
            app.clone(),
            "/api/v1/import/jobs",
            json!({
                "entity_type": "project",
                "csv_data": format!("Name,Key\n{name},K{name}"),
                "field_mapping": { "name": "Name", "key": "Key" },
            }),
        )
        .await;
        ids.push(body_json(response).await["data"]["id"].as_i64().unwrap());
    }

    let response = get(app.clone(), "/api/v1/import/jobs").await;
    assert_eq!(response.status(), StatusCode::OK);
    let jobs = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0]["id"].as_i64().unwrap(), ids[2]);
    assert_eq!(jobs[2]["id"].as_i64().unwrap(), ids[0]);

    let response = get(app, "/api/v1/import/jobs?limit=2&offset=1").await;
    let jobs = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["id"].as_i64().unwrap(), ids[1]);
}
