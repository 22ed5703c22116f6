//! Integration tests for the cloud automation REST client.
//!
//! A small axum app stands in for the automation service: it records the
//! task submission and replays a scripted sequence of status responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use grocer_bot::automation::cloud::CloudAgent;
use grocer_bot::automation::{AgentTask, AutomationAgent};
use grocer_bot::config::GlobalConfig;
use grocer_bot::AppError;

use super::test_helpers::test_config;

const TASK_ID: &str = "task-7f3a";

#[derive(Default)]
struct MockService {
    submissions: Mutex<Vec<(Option<String>, Value)>>,
    polled_ids: Mutex<Vec<String>>,
    statuses: Mutex<VecDeque<(StatusCode, Value)>>,
}

impl MockService {
    fn scripted(statuses: Vec<(StatusCode, Value)>) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        })
    }
}

async fn run_task(
    State(mock): State<Arc<MockService>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    mock.submissions.lock().unwrap().push((auth, body));
    Json(json!({ "id": TASK_ID, "live_url": "https://live.example.com/session/1" }))
}

async fn task_details(
    State(mock): State<Arc<MockService>>,
    Path(id): Path<String>,
) -> Response {
    mock.polled_ids.lock().unwrap().push(id);
    let next = mock.statuses.lock().unwrap().pop_front();
    match next {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (StatusCode::OK, Json(json!({ "status": "running" }))).into_response(),
    }
}

/// Serve the mock on an ephemeral port and point a config at it.
async fn spawn_mock(mock: Arc<MockService>) -> GlobalConfig {
    let app = Router::new()
        .route("/api/v1/run-task", post(run_task))
        .route("/api/v1/task/{id}", get(task_details))
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let port = listener.local_addr().expect("local addr").port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let mut config = test_config();
    config.automation.base_url = format!("http://127.0.0.1:{port}/");
    config.automation.max_poll_failures = 2;
    config
}

fn fast_agent(config: &GlobalConfig) -> CloudAgent {
    CloudAgent::new(config).with_poll_interval(Duration::from_millis(10))
}

fn task() -> AgentTask {
    AgentTask {
        prompt: "add milk to the trolley".into(),
        max_steps: 150,
    }
}

// ── Happy path ───────────────────────────────────────────────

#[tokio::test]
async fn polls_until_finished_and_returns_output() {
    let mock = MockService::scripted(vec![
        (StatusCode::OK, json!({ "status": "created" })),
        (StatusCode::OK, json!({ "status": "running" })),
        (
            StatusCode::OK,
            json!({ "status": "finished", "output": "CART_URL: https://www.tesco.ie/trolley" }),
        ),
    ]);
    let config = spawn_mock(Arc::clone(&mock)).await;

    let run = fast_agent(&config).run(task()).await.expect("run succeeds");

    assert_eq!(run.task_id, TASK_ID);
    assert_eq!(run.output, "CART_URL: https://www.tesco.ie/trolley");
    assert_eq!(
        run.live_url.as_deref(),
        Some("https://live.example.com/session/1")
    );
    let polled = mock.polled_ids.lock().unwrap().clone();
    assert_eq!(polled, vec![TASK_ID; 3]);
}

#[tokio::test]
async fn submission_carries_bearer_key_secrets_and_limits() {
    let mock = MockService::scripted(vec![(
        StatusCode::OK,
        json!({ "status": "finished", "output": "done" }),
    )]);
    let mut config = spawn_mock(Arc::clone(&mock)).await;
    config.credentials.automation_profile_id = Some("profile-42".into());

    fast_agent(&config).run(task()).await.expect("run succeeds");

    let submissions = mock.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    let (auth, body) = &submissions[0];
    assert_eq!(auth.as_deref(), Some("Bearer bu-test-key"));
    assert_eq!(body["task"], "add milk to the trolley");
    assert_eq!(body["max_agent_steps"], 150);
    assert_eq!(body["use_vision"], true);
    assert_eq!(body["allowed_domains"], json!(["tesco.ie"]));
    assert_eq!(body["browser_profile_id"], "profile-42");
    assert_eq!(
        body["secrets"],
        json!({
            "retailer_email": "shopper@example.com",
            "retailer_password": "hunter2",
        })
    );
}

#[tokio::test]
async fn profile_id_is_omitted_when_unset() {
    let mock = MockService::scripted(vec![(
        StatusCode::OK,
        json!({ "status": "finished", "output": "done" }),
    )]);
    let config = spawn_mock(Arc::clone(&mock)).await;

    fast_agent(&config).run(task()).await.expect("run succeeds");

    let submissions = mock.submissions.lock().unwrap().clone();
    assert!(submissions[0].1.get("browser_profile_id").is_none());
}

#[tokio::test]
async fn transient_poll_errors_are_tolerated() {
    let mock = MockService::scripted(vec![
        (StatusCode::BAD_GATEWAY, json!({})),
        (StatusCode::SERVICE_UNAVAILABLE, json!({})),
        (StatusCode::OK, json!({ "status": "finished", "output": "done" })),
    ]);
    let config = spawn_mock(mock).await;

    let run = fast_agent(&config).run(task()).await.expect("run succeeds");
    assert_eq!(run.output, "done");
}

// ── Failures ─────────────────────────────────────────────────

#[tokio::test]
async fn failed_status_is_an_agent_error() {
    let mock = MockService::scripted(vec![(
        StatusCode::OK,
        json!({ "status": "failed", "output": "login rejected" }),
    )]);
    let config = spawn_mock(mock).await;

    let err = fast_agent(&config).run(task()).await.unwrap_err();
    assert!(matches!(err, AppError::Agent(_)), "got {err:?}");
    assert_eq!(err.to_string(), format!("agent: task {TASK_ID} failed: login rejected"));
}

#[tokio::test]
async fn stopped_status_is_an_agent_error() {
    let mock = MockService::scripted(vec![(StatusCode::OK, json!({ "status": "stopped" }))]);
    let config = spawn_mock(mock).await;

    let err = fast_agent(&config).run(task()).await.unwrap_err();
    assert!(err.to_string().contains("was stopped"), "got {err}");
}

#[tokio::test]
async fn finished_without_output_is_an_agent_error() {
    let mock = MockService::scripted(vec![(
        StatusCode::OK,
        json!({ "status": "finished", "output": "   " }),
    )]);
    let config = spawn_mock(mock).await;

    let err = fast_agent(&config).run(task()).await.unwrap_err();
    assert!(err.to_string().contains("without output"), "got {err}");
}

#[tokio::test]
async fn too_many_consecutive_poll_errors_abandon_the_run() {
    let mock = MockService::scripted(vec![
        (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        (StatusCode::INTERNAL_SERVER_ERROR, json!({})),
        (StatusCode::OK, json!({ "status": "finished", "output": "too late" })),
    ]);
    let config = spawn_mock(Arc::clone(&mock)).await;

    let err = fast_agent(&config).run(task()).await.unwrap_err();
    assert!(err.to_string().contains("lost contact"), "got {err}");
    assert_eq!(mock.polled_ids.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_service_is_an_agent_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let mut config = test_config();
    config.automation.base_url = format!("http://127.0.0.1:{port}");

    let err = fast_agent(&config).run(task()).await.unwrap_err();
    assert!(matches!(err, AppError::Agent(_)), "got {err:?}");
}
