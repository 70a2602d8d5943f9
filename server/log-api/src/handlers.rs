//! HTTP handlers for the log API.

use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use std::fmt::Display;
use std::sync::Arc;

use log_engine::types::*;

use crate::date;
use crate::state::AppState;
use crate::types::*;

/// Error response: status plus an `ErrorOutput` body.
pub struct ApiError {
  status: StatusCode,
  output: ErrorOutput,
}

impl ApiError {
  fn bad_request(field: &str, message: impl Into<String>) -> Self {
    Self {
      status: StatusCode::BAD_REQUEST,
      output: ErrorOutput::new(message).with_field(field),
    }
  }

  fn internal(message: impl Into<String>) -> Self {
    Self {
      status: StatusCode::INTERNAL_SERVER_ERROR,
      output: ErrorOutput::new(message),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(self.output)).into_response()
  }
}

/// Apply a default and check `min <= value (<= max)`. Values that do not
/// compare (NaN) are rejected.
fn bounded<T: PartialOrd + Copy + Display>(
  field: &str,
  value: Option<T>,
  default: T,
  min: T,
  max: Option<T>,
) -> Result<T, ApiError> {
  let v = value.unwrap_or(default);
  let too_big = max.map_or(false, |m| v > m);
  if v.partial_cmp(&min).is_none() || v < min || too_big {
    let range = match max {
      Some(m) => format!("{}..={}", min, m),
      None => format!(">= {}", min),
    };
    return Err(ApiError::bad_request(field, format!("{} must be {}", field, range)));
  }
  Ok(v)
}

fn finite(field: &str, v: f64) -> Result<f64, ApiError> {
  if v.is_finite() {
    Ok(v)
  } else {
    Err(ApiError::bad_request(field, format!("{} must be a finite number", field)))
  }
}

fn non_blank(s: Option<String>) -> Option<String> {
  s.filter(|v| !v.trim().is_empty())
}

pub async fn health() -> &'static str {
  "ok"
}

pub async fn ingest(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
  let result = tokio::task::spawn_blocking(move || state.engine.ingest(&payload.logs))
    .await
    .map_err(|e| ApiError::internal(format!("ingest task: {}", e)))?;

  match result {
    Ok(report) => Ok(Json(report)),
    Err(e) => {
      tracing::error!(error = %e, "ingest: storage error");
      Err(ApiError::internal(e.to_string()))
    }
  }
}

pub async fn normalize(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<NormalizeRequest>,
) -> Json<CanonicalLogEntry> {
  Json(state.engine.normalize(&payload.log))
}

pub async fn validate(
  State(state): State<Arc<AppState>>,
  Json(payload): Json<ValidateRequest>,
) -> Json<ValidationOutcome> {
  Json(state.engine.validate(&payload.log))
}

pub async fn group(
  State(state): State<Arc<AppState>>,
  Query(params): Query<GroupParams>,
) -> Result<Json<GroupResponse>, ApiError> {
  let query = GroupQuery {
    service: non_blank(params.service),
    level: non_blank(params.level),
    since: date::parse_since(params.since.as_deref()).map_err(|e| ApiError::bad_request("since", e))?,
    limit: bounded("limit", params.limit, 50, 1, Some(500))?,
  };
  Ok(Json(state.engine.groups(&query)))
}

pub async fn spikes(
  State(state): State<Arc<AppState>>,
  Query(params): Query<SpikeParams>,
) -> Result<Json<SpikesResponse>, ApiError> {
  let query = SpikeQuery {
    window_minutes: bounded("window_minutes", params.window_minutes, 5, 1, Some(60))?,
    ratio_threshold: finite(
      "ratio_threshold",
      bounded("ratio_threshold", params.ratio_threshold, 2.0, 1.0, None)?,
    )?,
    baseline_windows: bounded("baseline_windows", params.baseline_windows, 6, 1, None)?,
    service: non_blank(params.service),
    level: non_blank(params.level),
  };
  Ok(Json(state.engine.spikes(&query)))
}

pub async fn insights(
  State(state): State<Arc<AppState>>,
  Query(params): Query<InsightsParams>,
) -> Result<Json<InsightsReport>, ApiError> {
  let query = InsightsQuery {
    service: non_blank(params.service),
    level: non_blank(params.level),
    since: date::parse_since(params.since.as_deref()).map_err(|e| ApiError::bad_request("since", e))?,
  };
  // The summarizer may call out to a remote model; keep it off the reactor.
  let report = tokio::task::spawn_blocking(move || {
    state.engine.insights(&query, state.summarizer.as_ref())
  })
  .await
  .map_err(|e| ApiError::internal(format!("insights task: {}", e)))?;
  Ok(Json(report))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
  Json(state.engine.stats())
}

pub async fn recent_logs(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<RecentLogs>, ApiError> {
  let limit = bounded("limit", params.limit, 10, 1, Some(100))?;
  Ok(Json(RecentLogs {
    logs: state.engine.recent_logs(limit),
  }))
}

/// Largest groups, for dashboard drill-down.
pub async fn top_groups(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<TopGroups>, ApiError> {
  let limit = bounded("limit", params.limit, 10, 1, Some(100))?;
  let response = state.engine.groups(&GroupQuery {
    limit,
    ..GroupQuery::default()
  });
  Ok(Json(TopGroups {
    groups: response.groups,
  }))
}

/// Current spikes under default parameters, for dashboard drill-down.
pub async fn top_spikes(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<SpikesResponse>, ApiError> {
  let limit = bounded("limit", params.limit, 10, 1, Some(100))?;
  let mut response = state.engine.spikes(&SpikeQuery::default());
  response.spikes.truncate(limit);
  Ok(Json(response))
}

pub async fn recent_rejected(
  State(state): State<Arc<AppState>>,
  Query(params): Query<LimitParams>,
) -> Result<Json<RecentRejected>, ApiError> {
  let limit = bounded("limit", params.limit, 10, 1, Some(100))?;
  Ok(Json(RecentRejected {
    rejected: state.engine.recent_rejections(limit),
  }))
}
