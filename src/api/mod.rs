// HTTP transport for the tool registry

use std::any::Any;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, FromRequest, Path, Request, State},
    http::{HeaderValue, Method, StatusCode, Uri, header},
    response::Response,
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{BridgeConfig, SERVER_DESCRIPTION, SERVER_NAME, SERVER_VERSION};
use crate::envelope::{ErrorKind, ResponseEnvelope};
use crate::tools::{JsonObject, ToolRegistry};

#[cfg(test)]
mod integration_tests;

pub type AppState = Arc<ToolRegistry>;

pub fn create_router(state: AppState, config: &BridgeConfig) -> Router {
    Router::new()
        .route("/", get(server_info))
        .route("/tools", get(list_tools))
        .route("/tools/{name}", get(describe_tool).post(call_tool))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONNECTION,
                    HeaderValue::from_static("close"),
                ))
                .layer(cors_layer())
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    config.request_timeout,
                )),
        )
        .with_state(state)
}

/// Permissive CORS; also answers every `OPTIONS` preflight.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn server_info() -> Response {
    json_response(
        StatusCode::OK,
        &json!({
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": SERVER_DESCRIPTION,
            "status": "running",
        }),
    )
}

/// Discovery. Always 200, even with nothing registered.
async fn list_tools(State(registry): State<AppState>) -> Response {
    let tools: Vec<Value> = registry
        .list()
        .into_iter()
        .map(|tool| json!({ "name": tool.name, "description": tool.description }))
        .collect();

    info!(count = tools.len(), "Tool discovery request");
    json_response(StatusCode::OK, &tools)
}

async fn describe_tool(State(registry): State<AppState>, Path(name): Path<String>) -> Response {
    match registry.get(&name) {
        Some(handler) => json_response(StatusCode::OK, &handler.descriptor()),
        None => envelope_response(&unknown_tool(&name)),
    }
}

async fn call_tool(
    State(registry): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    // Unknown names are rejected before the body is buffered.
    if !registry.contains(&name) {
        warn!(tool = %name, "Call for unknown tool");
        return envelope_response(&unknown_tool(&name));
    }

    // Buffering through `Bytes` keeps `DefaultBodyLimit` in force.
    let body = match Bytes::from_request(request, &()).await {
        Ok(body) => body,
        Err(rejection) => {
            warn!(tool = %name, "Rejected request body: {}", rejection.body_text());
            let status = rejection.status();
            return json_response(status, &json!({ "error": rejection.body_text() }));
        }
    };

    let params = match parse_parameters(&body) {
        Ok(params) => params,
        Err(message) => {
            warn!(tool = %name, "Rejected request body: {}", message);
            return envelope_response(&ResponseEnvelope::internal(ErrorKind::BadArguments, message));
        }
    };

    let envelope = registry.invoke(&name, params).await;
    envelope_response(&envelope)
}

async fn not_found(uri: Uri) -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        &json!({ "error": format!("Not found: {}", uri.path()) }),
    )
}

fn unknown_tool(name: &str) -> ResponseEnvelope {
    ResponseEnvelope::internal(ErrorKind::NotFound, format!("Tool '{}' not found", name))
}

/// Parse a call body into a parameter map.
///
/// An empty body means no parameters. Anything else must be a UTF-8 JSON object.
pub fn parse_parameters(body: &[u8]) -> Result<JsonObject, String> {
    let text = std::str::from_utf8(body).map_err(|_| "Request body is not valid UTF-8".to_string())?;
    if text.trim().is_empty() {
        return Ok(JsonObject::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(params)) => Ok(params),
        Ok(_) => Err("Request body must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON in request body: {}", e)),
    }
}

fn envelope_response(envelope: &ResponseEnvelope) -> Response {
    json_response(envelope.http_status(), envelope)
}

/// Pretty-printed JSON with an explicit `Content-Length`.
fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    let (status, bytes) = match serde_json::to_vec_pretty(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"internal serialization error"}"#.to_vec(),
            )
        }
    };

    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    response
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Request handler panicked: {}", detail);

    envelope_response(&ResponseEnvelope::internal(
        ErrorKind::Internal,
        "Internal server error",
    ))
}
