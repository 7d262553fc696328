//! `POST /<verb>` + `GET /health` + `GET /state` HTTP front-end (spec.md
//! §6), grounded on the workspace's axum/tower stack (the teacher's own
//! front-end is STDIO-only; the HTTP router is new but reuses its
//! dispatch-and-envelope shape).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use memory_core::verbs::validation::require_non_empty;
use memory_core::VerbsService;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::dto::{AskRequest, AugmentRequest, InspectRequest, PanRequest, RecallRequest, TellRequest, TiltRequest, ZoomRequest};

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn envelope(result: &memory_core::VerbResult) -> Json<Value> {
    Json(serde_json::to_value(result).unwrap_or_else(|_| json!({"success": false, "error": "envelope serialization failed"})))
}

/// Pre-check a required field the same way the verb itself would (spec.md
/// §7: `InvalidArgument` is "never retried" and is the one kind that gets
/// its own HTTP status rather than an in-envelope failure). Kept separate
/// from `VerbsService` so the 400 short-circuits before any provider call.
fn bad_request(field: &str, value: &str) -> Option<(StatusCode, Json<Value>)> {
    require_non_empty(field, value)
        .err()
        .map(|message| (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": message }))))
}

fn bad_request_optional(field: &str, value: Option<&str>) -> Option<(StatusCode, Json<Value>)> {
    value.and_then(|v| bad_request(field, v))
}

/// Build the router over a shared [`VerbsService`] (spec.md §6's
/// `POST /<verb>` surface plus `GET /health` and `GET /state`).
#[must_use]
pub fn router(verbs: Arc<VerbsService>) -> Router {
    Router::new()
        .route("/tell", post(tell))
        .route("/ask", post(ask))
        .route("/augment", post(augment))
        .route("/zoom", post(zoom))
        .route("/pan", post(pan))
        .route("/tilt", post(tilt))
        .route("/recall", post(recall))
        .route("/inspect", post(inspect))
        .route("/health", get(health))
        .route("/state", get(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
        .with_state(verbs)
}

async fn tell(State(verbs): State<Arc<VerbsService>>, Json(body): Json<TellRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request("content", &body.content) {
        return rejection;
    }
    let result = verbs.tell(&body.content, body.content_type, body.lazy, now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn ask(State(verbs): State<Arc<VerbsService>>, Json(body): Json<AskRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request("question", &body.question) {
        return rejection;
    }
    let result = verbs
        .ask(
            &body.question,
            body.mode,
            body.use_hyde,
            body.use_wikipedia,
            body.use_wikidata,
            body.use_web_search,
            now_ms(),
        )
        .await;
    (StatusCode::OK, envelope(&result))
}

async fn augment(State(verbs): State<Arc<VerbsService>>, Json(body): Json<AugmentRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request("target", &body.target) {
        return rejection;
    }
    let result = verbs.augment(&body.target, body.operation, now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn zoom(State(verbs): State<Arc<VerbsService>>, Json(body): Json<ZoomRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request_optional("query", body.query.as_deref()) {
        return rejection;
    }
    let result = verbs.zoom(body.level, body.query.as_deref(), now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn pan(State(verbs): State<Arc<VerbsService>>, Json(body): Json<PanRequest>) -> (StatusCode, Json<Value>) {
    let result = verbs.pan(body, now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn tilt(State(verbs): State<Arc<VerbsService>>, Json(body): Json<TiltRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request_optional("query", body.query.as_deref()) {
        return rejection;
    }
    let result = verbs.tilt(body.style, body.query.as_deref(), now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn recall(State(verbs): State<Arc<VerbsService>>, Json(body): Json<RecallRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request("query", &body.query) {
        return rejection;
    }
    let result = verbs.recall(&body.query, now_ms()).await;
    (StatusCode::OK, envelope(&result))
}

async fn inspect(State(verbs): State<Arc<VerbsService>>, Json(body): Json<InspectRequest>) -> (StatusCode, Json<Value>) {
    if let Some(rejection) = bad_request("type", &body.kind) {
        return rejection;
    }
    let result = verbs.inspect(&body.kind, body.target.as_deref(), body.include_recommendations);
    (StatusCode::OK, envelope(&result))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": now_ms(), "server_state": "running" }))
}

async fn state(State(verbs): State<Arc<VerbsService>>) -> Json<Value> {
    let snapshot = verbs.inspect("session", None, false);
    Json(json!({ "state": snapshot.zpt_state }))
}
