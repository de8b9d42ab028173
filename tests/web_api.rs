//! JSON API routes over an in-memory context

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use common::{Behavior, FakeQueryClient, Harness, RecordingNotifier};
use ticket_watch::web::responses::{ApiResponse, HealthResponse};
use ticket_watch::web::{AppState, create_router};

fn server() -> (TestServer, Harness) {
    let harness = Harness::new(
        FakeQueryClient::new(Behavior::Tickets(Vec::new())),
        RecordingNotifier::default(),
    );
    let server = TestServer::new(create_router(AppState::from(&harness.context))).unwrap();
    (server, harness)
}

fn body() -> Value {
    json!({
        "date": "2024-05-01",
        "start_station": "北京",
        "end_station": "上海",
        "email": "rider@example.com"
    })
}

#[tokio::test]
async fn test_register_returns_accepted_with_id() {
    let (server, harness) = server();

    let response = server.post("/api/v1/jobs").json(&body()).await;
    assert_eq!(response.status_code(), StatusCode::ACCEPTED);

    let json: Value = response.json();
    assert_eq!(json["success"], true);
    let id = json["data"]["id"].as_str().unwrap().to_string();
    assert!(json["data"]["next_run_time"].is_string());

    let jobs = harness.context.jobs.list().await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id.to_string(), id);
    assert_eq!(jobs[0].from_code, "BJP");
    assert_eq!(jobs[0].to_code, "SHH");
    assert_eq!(jobs[0].recipients, vec!["rider@example.com".to_string()]);
}

#[tokio::test]
async fn test_register_rejects_unknown_station() {
    let (server, harness) = server();

    let mut request = body();
    request["end_station"] = json!("火星");
    let response = server.post("/api/v1/jobs").json(&request).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("火星"));
    assert!(harness.context.jobs.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (server, _harness) = server();

    let mut request = body();
    request["email"] = json!("not-an-address");
    let response = server.post("/api/v1/jobs").json(&request).await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_malformed_date() {
    let (server, _harness) = server();

    let mut request = body();
    request["date"] = json!("May first");
    let response = server.post("/api/v1/jobs").json(&request).await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_list_and_get_jobs() {
    let (server, _harness) = server();

    server.post("/api/v1/jobs").json(&body()).await;
    let created: Value = server.post("/api/v1/jobs").json(&body()).await.json();
    let id = created["data"]["id"].as_str().unwrap();

    let listed: Value = server.get("/api/v1/jobs").await.json();
    assert_eq!(listed["data"].as_array().unwrap().len(), 2);

    let response = server.get(&format!("/api/v1/jobs/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let job: Value = response.json();
    assert_eq!(job["data"]["id"], id);
    assert_eq!(job["data"]["from_code"], "BJP");
}

#[tokio::test]
async fn test_delete_then_not_found() {
    let (server, harness) = server();

    let created: Value = server.post("/api/v1/jobs").json(&body()).await.json();
    let id = created["data"]["id"].as_str().unwrap();
    let path = format!("/api/v1/jobs/{id}");

    assert_eq!(server.delete(&path).await.status_code(), StatusCode::NO_CONTENT);
    assert!(harness.context.jobs.list().await.unwrap().is_empty());

    assert_eq!(server.delete(&path).await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(server.get(&path).await.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_job_id() {
    let (server, _harness) = server();
    let response = server.get("/api/v1/jobs/not-a-uuid").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_stats() {
    let (server, _harness) = server();
    server.post("/api/v1/jobs").json(&body()).await;

    let health: Value = server.get("/health").await.json();
    assert_eq!(health["data"]["status"], "healthy");
    assert_eq!(health["data"]["database"], "in-memory");
    assert_eq!(health["data"]["jobs"], 1);
    assert_eq!(health["data"]["firings"]["fired"], 0);

    let stats: Value = server.get("/api/v1/scheduler/stats").await.json();
    assert_eq!(stats["data"]["running"], 0);
}

#[tokio::test]
async fn test_health_body_reads_back_as_typed_response() {
    let (server, _harness) = server();

    let health: ApiResponse<HealthResponse> = server.get("/health").await.json();
    let health = health.data.unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.jobs, 0);
    assert_eq!(health.firings.running, 0);
}
