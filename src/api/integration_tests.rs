//! End-to-end tests: a real bridge server talking to a stub upstream.
//!
//! The stub counts calls and records the `Authorization` header it saw, so
//! the tests can check what actually left the bridge.

#![cfg(test)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::client::BridgeClient;
use crate::config::BridgeConfig;
use crate::server::serve_with_listener;
use crate::tools::JsonObject;

#[derive(Clone, Default)]
struct Upstream {
    calls: Arc<AtomicUsize>,
    auth: Arc<Mutex<Vec<String>>>,
}

impl Upstream {
    async fn record(&self, headers: &HeaderMap) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let value = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth.lock().await.push(value);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn projects(State(up): State<Upstream>, headers: HeaderMap) -> Json<Value> {
    up.record(&headers).await;
    Json(json!({ "projects": [{ "id": "prj_1", "name": "site" }] }))
}

async fn project(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    up.record(&headers).await;
    match id.as_str() {
        "missing" => (StatusCode::NOT_FOUND, "not found").into_response(),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "id": id })).into_response()
        }
        _ => Json(json!({ "id": id })).into_response(),
    }
}

async fn deployments(
    State(up): State<Upstream>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Json<Value> {
    up.record(&headers).await;
    Json(json!({ "query": query }))
}

async fn user(State(up): State<Upstream>, headers: HeaderMap) -> Json<Value> {
    up.record(&headers).await;
    Json(json!({ "x": 1 }))
}

async fn aliases(State(up): State<Upstream>, headers: HeaderMap) -> Response {
    up.record(&headers).await;
    (StatusCode::OK, "<html>not json</html>").into_response()
}

async fn spawn_upstream() -> (SocketAddr, Upstream) {
    let state = Upstream::default();
    let app = Router::new()
        .route("/v9/projects", get(projects))
        .route("/v9/projects/{id}", get(project))
        .route("/v6/deployments", get(deployments))
        .route("/v2/user", get(user))
        .route("/v2/deployments/{id}/aliases", get(aliases))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn spawn_bridge(config: BridgeConfig) -> BridgeClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_with_listener(
        listener,
        config,
        std::future::pending::<()>(),
    ));
    BridgeClient::new(&format!("http://{}", addr)).unwrap()
}

async fn setup(token: Option<&str>) -> (BridgeClient, Upstream) {
    let (upstream_addr, upstream) = spawn_upstream().await;
    let config = BridgeConfig {
        api_base_url: format!("http://{}", upstream_addr),
        upstream_timeout: Duration::from_millis(500),
        ..BridgeConfig::default()
    }
    .with_token(token);
    (spawn_bridge(config).await, upstream)
}

fn params(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn test_discovery_lists_every_tool_once() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    assert!(client.ping().await);
    let tools = client.list_tools().await.unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "list_projects",
            "list_deployments",
            "get_project_info",
            "check_server_status",
            "set_credential",
            "list_project_domains",
            "list_environment_variables",
            "get_user_info",
            "list_deployment_aliases",
        ]
    );
    assert!(tools.iter().all(|t| !t.description.is_empty()));

    let info = client.server_info().await.unwrap();
    assert_eq!(info["status"], "running");
}

#[tokio::test]
async fn test_unknown_tool_is_404() {
    let (client, upstream) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool("does_not_exist", &JsonObject::new())
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 404);
    assert!(!outcome.is_success());
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_missing_credential_makes_no_upstream_call() {
    let (client, upstream) = setup(None).await;

    let outcome = client
        .call_tool("list_projects", &JsonObject::new())
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 200);
    assert_eq!(outcome.body["status"], "error");
    assert!(outcome.message().unwrap().contains("credential not configured"));
    assert_eq!(upstream.calls(), 0);

    let status = client
        .call_tool("check_server_status", &JsonObject::new())
        .await
        .unwrap();
    assert!(status.is_success());
    assert_eq!(status.data().unwrap()["vercel_token_configured"], false);
}

#[tokio::test]
async fn test_set_credential_applies_to_later_calls() {
    let (client, upstream) = setup(None).await;

    let outcome = client
        .call_tool("set_credential", &params(json!({ "token": "abcd1234efgh" })))
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.data().unwrap()["masked_token"], "abcd****efgh");
    assert!(!outcome.body.to_string().contains("abcd1234efgh"));

    let outcome = client
        .call_tool("get_user_info", &JsonObject::new())
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.data(), Some(&json!({ "x": 1 })));

    assert_eq!(*upstream.auth.lock().await, vec!["Bearer abcd1234efgh"]);
}

#[tokio::test]
async fn test_upstream_failure_status() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool("get_project_info", &params(json!({ "project_id": "missing" })))
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 200);
    assert_eq!(outcome.body["status"], "error");
    assert!(outcome.message().unwrap().contains("404"));
    assert_eq!(outcome.body["error"], "not found");
}

#[tokio::test]
async fn test_path_params_are_one_segment() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool("get_project_info", &params(json!({ "project_id": "team/prj" })))
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.data().unwrap()["id"], "team/prj");
}

#[tokio::test]
async fn test_list_deployments_query() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool("list_deployments", &JsonObject::new())
        .await
        .unwrap();
    assert_eq!(outcome.data().unwrap()["query"], "limit=5");

    let outcome = client
        .call_tool(
            "list_deployments",
            &params(json!({ "project_id": "prj_1", "limit": 2 })),
        )
        .await
        .unwrap();
    assert_eq!(outcome.data().unwrap()["query"], "projectId=prj_1&limit=2");
}

#[tokio::test]
async fn test_undecodable_upstream_body_is_transport_error() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool(
            "list_deployment_aliases",
            &params(json!({ "deployment_id": "dpl_1" })),
        )
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 200);
    assert_eq!(outcome.body["status"], "error");
    assert!(outcome.message().unwrap().starts_with("Error: "));
}

#[tokio::test]
async fn test_upstream_timeout_is_transport_error() {
    let (client, _) = setup(Some("abcd1234efgh")).await;

    let outcome = client
        .call_tool("get_project_info", &params(json!({ "project_id": "slow" })))
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 200);
    assert_eq!(outcome.body["status"], "error");
    assert!(outcome.message().unwrap().starts_with("Error: "));
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let closed = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let config = BridgeConfig {
        api_base_url: format!("http://{}", closed),
        ..BridgeConfig::default()
    }
    .with_token(Some("abcd1234efgh"));
    let client = spawn_bridge(config).await;

    let outcome = client
        .call_tool("list_projects", &JsonObject::new())
        .await
        .unwrap();
    assert_eq!(outcome.http_status, 200);
    assert_eq!(outcome.body["status"], "error");
    assert!(outcome.message().unwrap().starts_with("Error: "));
}

#[tokio::test]
async fn test_invalid_json_body_is_400() {
    let (client, upstream) = setup(Some("abcd1234efgh")).await;
    let url = client.base_url().join("tools/list_projects").unwrap();

    let response = reqwest::Client::new()
        .post(url)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{\"project_id\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(response.headers()[header::CONNECTION], "close");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn test_concurrent_credential_swaps_never_tear() {
    let (client, upstream) = setup(Some("aaaa1111aaaa")).await;
    let tokens = ["aaaa1111aaaa", "bbbb2222bbbb"];

    let mut tasks = Vec::new();
    for i in 0..20 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let token = tokens[(i / 2) % 2];
                client
                    .call_tool("set_credential", &params(json!({ "token": token })))
                    .await
                    .unwrap()
            } else {
                client
                    .call_tool("get_user_info", &JsonObject::new())
                    .await
                    .unwrap()
            }
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }

    let seen = upstream.auth.lock().await;
    assert_eq!(seen.len(), 10);
    for header in seen.iter() {
        assert!(
            tokens.iter().any(|t| header == &format!("Bearer {}", t)),
            "torn header: {header}"
        );
    }
}
