use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{SortDirection, SortField};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;
use crate::query::ListQuery;

const TABLE_PATH: &str = "/v0/appBase/Todos";

#[derive(Clone)]
enum Mode {
    Ok,
    Fail(StatusCode, String),
    EmptyWrite,
}

#[derive(Debug, Clone)]
struct Captured {
    method: &'static str,
    authorization: Option<String>,
    query: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct StoreState {
    mode: Mode,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl StoreState {
    async fn capture(
        &self,
        method: &'static str,
        headers: &HeaderMap,
        query: Option<String>,
        body: Option<Value>,
    ) {
        self.captured.lock().await.push(Captured {
            method,
            authorization: headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            query,
            body,
        });
    }

    fn failure(&self) -> Option<(StatusCode, String)> {
        match &self.mode {
            Mode::Fail(status, body) => Some((*status, body.clone())),
            _ => None,
        }
    }
}

async fn list_records(
    State(state): State<StoreState>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    state.capture("GET", &headers, query, None).await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    let body = json!({
        "records": [
            {
                "id": "r1",
                "createdTime": "2024-05-01T10:00:00.000Z",
                "fields": {"title": "Buy milk"}
            },
            {"id": "r2", "fields": {"title": "Walk dog", "isCompleted": true}}
        ]
    });
    (StatusCode::OK, body.to_string())
}

async fn create_record(
    State(state): State<StoreState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let title = body["records"][0]["fields"]["title"].clone();
    state.capture("POST", &headers, None, Some(body)).await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    if matches!(state.mode, Mode::EmptyWrite) {
        return (StatusCode::OK, json!({"records": []}).to_string());
    }
    let body = json!({"records": [{"id": "recNew", "fields": {"title": title}}]});
    (StatusCode::OK, body.to_string())
}

async fn update_record(
    State(state): State<StoreState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let id = body["records"][0]["id"].clone();
    state.capture("PATCH", &headers, None, Some(body)).await;
    if let Some(failure) = state.failure() {
        return failure;
    }
    let body = json!({
        "records": [{"id": id, "fields": {"title": "Buy oat milk", "isCompleted": true}}]
    });
    (StatusCode::OK, body.to_string())
}

async fn spawn_store(mode: Mode) -> (HttpRecordGateway, Arc<Mutex<Vec<Captured>>>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = StoreState {
        mode,
        captured: Arc::clone(&captured),
    };
    let app = Router::new()
        .route(
            TABLE_PATH,
            get(list_records).post(create_record).patch(update_record),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let base = table_url(&format!("http://{addr}/v0"), "appBase", "Todos");
    let gateway = HttpRecordGateway::new(&base, "pat-secret").expect("gateway");
    (gateway, captured)
}

#[test]
fn builds_table_url_from_parts() {
    assert_eq!(
        table_url("https://api.airtable.com/v0/", "appX", "Todos"),
        "https://api.airtable.com/v0/appX/Todos"
    );
}

#[test]
fn rejects_unparsable_base_url() {
    let err = HttpRecordGateway::new("not a url", "t")
        .err()
        .expect("must reject");
    assert!(matches!(err, SyncError::InvalidBaseUrl { .. }));
}

#[tokio::test]
async fn list_sends_bearer_token_and_normalizes_records() {
    let (gateway, captured) = spawn_store(Mode::Ok).await;
    let url =
        ListQuery::new(SortField::Title, SortDirection::Asc, "milk").encode(gateway.base_url());

    let tasks = gateway.list(&url).await.expect("list");

    assert_eq!(
        tasks,
        vec![
            Task::new("r1", "Buy milk", false),
            Task::new("r2", "Walk dog", true),
        ]
    );
    let captured = captured.lock().await;
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].method, "GET");
    assert_eq!(captured[0].authorization.as_deref(), Some("Bearer pat-secret"));
    let query = captured[0].query.clone().expect("query string");
    assert!(query.contains("filterByFormula="), "query: {query}");
    assert!(query.contains("sort%5B0%5D%5Bfield%5D=title"), "query: {query}");
}

#[tokio::test]
async fn create_posts_incomplete_record_and_returns_assigned_id() {
    let (gateway, captured) = spawn_store(Mode::Ok).await;

    let task = gateway.create("Buy milk").await.expect("create");

    assert_eq!(task, Task::new("recNew", "Buy milk", false));
    let captured = captured.lock().await;
    assert_eq!(captured[0].method, "POST");
    assert_eq!(
        captured[0].body,
        Some(json!({"records": [{"fields": {"title": "Buy milk", "isCompleted": false}}]}))
    );
}

#[tokio::test]
async fn update_patches_partial_fields_by_id() {
    let (gateway, captured) = spawn_store(Mode::Ok).await;

    let task = gateway
        .update(&TaskId::new("r1"), TaskPatch::title("Buy oat milk").with_completion(false))
        .await
        .expect("update");

    assert_eq!(task, Task::new("r1", "Buy oat milk", true));
    let captured = captured.lock().await;
    assert_eq!(captured[0].method, "PATCH");
    assert_eq!(
        captured[0].body,
        Some(json!({
            "records": [{"id": "r1", "fields": {"title": "Buy oat milk", "isCompleted": false}}]
        }))
    );
}

#[tokio::test]
async fn non_success_status_carries_store_error_message() {
    let body = json!({"error": {"type": "SERVER_ERROR", "message": "boom"}}).to_string();
    let (gateway, _captured) =
        spawn_store(Mode::Fail(StatusCode::INTERNAL_SERVER_ERROR, body)).await;

    let err = gateway
        .update(&TaskId::new("r1"), TaskPatch::completion(true))
        .await
        .expect_err("must fail");

    match err {
        SyncError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "SERVER_ERROR: boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn bare_error_codes_and_plain_bodies_are_reported() {
    let (gateway, _captured) = spawn_store(Mode::Fail(
        StatusCode::NOT_FOUND,
        json!({"error": "NOT_FOUND"}).to_string(),
    ))
    .await;
    let url = gateway.base_url().clone();
    let err = gateway.list(&url).await.expect_err("must fail");
    assert_eq!(err.to_string(), "remote store returned 404: NOT_FOUND");
    assert_eq!(err.status(), Some(404));

    let (gateway, _captured) =
        spawn_store(Mode::Fail(StatusCode::SERVICE_UNAVAILABLE, "oops".to_string())).await;
    let err = gateway.create("x").await.expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "remote store returned 503: Service Unavailable"
    );
}

#[tokio::test]
async fn empty_write_response_is_an_error() {
    let (gateway, _captured) = spawn_store(Mode::EmptyWrite).await;
    let err = gateway.create("Buy milk").await.expect_err("must fail");
    assert!(matches!(err, SyncError::EmptyResponse { operation: "create" }));
}

#[tokio::test]
async fn unreachable_store_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let gateway = HttpRecordGateway::new(&format!("http://{addr}/v0/appBase/Todos"), "t")
        .expect("gateway");
    let url = gateway.base_url().clone();
    let err = gateway.list(&url).await.expect_err("must fail");
    assert!(matches!(err, SyncError::Network(_)), "unexpected error: {err:?}");
}

#[test]
fn client_build_failure_is_a_configuration_error() {
    let err = build_client(Client::builder().user_agent("bad\nagent"))
        .err()
        .expect("must reject");
    assert!(matches!(err, SyncError::ClientBuild(_)), "unexpected error: {err:?}");
    assert_eq!(err.status(), None);
}
