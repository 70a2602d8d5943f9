//! HTTP-level tests for the log API.

use axum::{
  body::{to_bytes, Body},
  http::{header, Request, StatusCode},
  Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

use log_api::{router, AppState};
use log_engine::insights::Summarizer;
use log_engine::types::InsightsContext;
use log_engine::{Engine, LogError};

fn app() -> Router {
  router(Arc::new(AppState::new(Engine::with_defaults())))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(req).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, body)
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

#[tokio::test]
async fn health_check() {
  let response = app().oneshot(get("/health")).await.unwrap();
  assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn ingest_then_group() {
  let app = app();
  let (status, report) = send(
    &app,
    post(
      "/ingest",
      json!({"logs": [
        {"msg": "Cache miss for key 17", "service": "cache"},
        {"msg": "Cache miss for key 94210", "service": "cache"},
        {"level": "INVALID", "message": ""},
        42
      ]}),
    ),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["accepted"], 2);
  assert_eq!(report["rejected"], 2);
  assert_eq!(report["errors"][0]["index"], 2);
  assert_eq!(report["errors"][1]["index"], 3);

  let (status, groups) = send(&app, get("/group?service=cache")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(groups["total_groups"], 1);
  assert_eq!(groups["groups"][0]["count"], 2);

  let (_, stats) = send(&app, get("/stats")).await;
  assert_eq!(stats["total_logs"], 2);
  assert_eq!(stats["total_rejected"], 2);
  assert_eq!(stats["recent_ingests"].as_array().unwrap().len(), 1);

  let (_, rejected) = send(&app, get("/api/rejected?limit=1")).await;
  assert_eq!(rejected["rejected"].as_array().unwrap().len(), 1);
  assert_eq!(rejected["rejected"][0]["index"], 3);

  let (_, logs) = send(&app, get("/api/logs")).await;
  assert_eq!(logs["logs"][0]["message"], "Cache miss for key 94210");
}

#[tokio::test]
async fn normalize_and_validate_previews() {
  let app = app();
  let (status, canonical) = send(
    &app,
    post("/normalize", json!({"log": {"msg": "hi", "lvl": "warning", "region": "eu"}})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(canonical["level"], "WARNING");
  assert_eq!(canonical["service"], "unknown");
  assert_eq!(canonical["metadata"]["region"], "eu");

  let (_, outcome) = send(&app, post("/validate", json!({"log": {"level": "shouty"}}))).await;
  assert_eq!(outcome["valid"], false);
  assert!(outcome["errors"][0].as_str().unwrap().contains("SHOUTY"));

  // Previews never touch the store.
  let (_, stats) = send(&app, get("/stats")).await;
  assert_eq!(stats["total_logs"], 0);
}

#[tokio::test]
async fn query_bounds_are_enforced() {
  let app = app();
  for uri in [
    "/group?limit=0",
    "/group?limit=501",
    "/group?since=yesterday",
    "/spikes?window_minutes=61",
    "/spikes?ratio_threshold=0.5",
    "/spikes?baseline_windows=0",
    "/spikes?ratio_threshold=NaN",
    "/spikes?ratio_threshold=inf",
    "/api/logs?limit=101",
    "/api/groups?limit=0",
    "/api/spikes?limit=101",
  ] {
    let (status, body) = send(&app, get(uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    assert_eq!(body["error"], true, "{}", uri);
  }
}

#[tokio::test]
async fn spikes_default_to_empty() {
  let (status, body) = send(&app(), get("/spikes")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["spikes"], json!([]));
}

#[tokio::test]
async fn nan_threshold_does_not_flag_quiet_groups() {
  let app = app();
  let now = Utc::now();
  // 60 baseline events (avg 10 per window) and a single current one.
  let mut logs: Vec<Value> = (0..60)
    .map(|i| {
      let ts = now - Duration::minutes(6) - Duration::seconds(i * 20);
      json!({"msg": "queue lag", "level": "warning", "service": "jobs", "timestamp": ts.to_rfc3339()})
    })
    .collect();
  logs.push(json!({"msg": "queue lag", "level": "warning", "service": "jobs"}));
  let (_, report) = send(&app, post("/ingest", json!({ "logs": logs }))).await;
  assert_eq!(report["accepted"], 61);

  let (status, body) = send(&app, get("/spikes?ratio_threshold=NaN")).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["field"], "ratio_threshold");

  let (status, body) = send(&app, get("/spikes")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["spikes"], json!([]));
}

#[tokio::test]
async fn drill_down_groups_and_spikes() {
  let app = app();
  send(
    &app,
    post(
      "/ingest",
      json!({"logs": [
        {"msg": "disk 91% full", "service": "node-1"},
        {"msg": "disk 93% full", "service": "node-1"},
        {"msg": "oom killed", "level": "error", "service": "node-2"}
      ]}),
    ),
  )
  .await;

  let (status, body) = send(&app, get("/api/groups?limit=1")).await;
  assert_eq!(status, StatusCode::OK);
  let groups = body["groups"].as_array().unwrap();
  assert_eq!(groups.len(), 1);
  assert_eq!(groups[0]["service"], "node-1");
  assert_eq!(groups[0]["count"], 2);

  let (status, body) = send(&app, get("/api/spikes")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["spikes"], json!([]));
}

struct Offline;

impl Summarizer for Offline {
  fn summarize(&self, _context: &InsightsContext) -> Result<String, LogError> {
    Err(LogError::Summarizer("model endpoint unreachable".into()))
  }
}

#[tokio::test]
async fn insights_survive_summarizer_failure() {
  let state = AppState::new(Engine::with_defaults()).with_summarizer(Arc::new(Offline));
  let app = router(Arc::new(state));
  send(&app, post("/ingest", json!({"logs": [{"msg": "boom", "level": "error", "service": "api"}]}))).await;

  let (status, body) = send(&app, get("/insights?service=api")).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["summary"].as_str().unwrap().contains("unreachable"));
  assert_eq!(body["top_groups"][0]["service"], "api");
}
