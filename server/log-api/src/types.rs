//! Request/response types for the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use log_engine::types::{GroupItem, RejectionRecord, StoredEntry};
use log_engine::RawEvent;

#[derive(Deserialize)]
pub struct IngestRequest {
  /// Items are kept untyped so non-objects are rejected per index, not per request.
  pub logs: Vec<Value>,
}

#[derive(Deserialize)]
pub struct NormalizeRequest {
  pub log: RawEvent,
}

#[derive(Deserialize)]
pub struct ValidateRequest {
  pub log: Value,
}

#[derive(Deserialize)]
pub struct GroupParams {
  pub service: Option<String>,
  pub level: Option<String>,
  pub limit: Option<usize>,
  pub since: Option<String>,
}

#[derive(Deserialize)]
pub struct SpikeParams {
  pub window_minutes: Option<u32>,
  pub ratio_threshold: Option<f64>,
  pub baseline_windows: Option<u32>,
  pub service: Option<String>,
  pub level: Option<String>,
}

#[derive(Deserialize)]
pub struct InsightsParams {
  pub service: Option<String>,
  pub level: Option<String>,
  pub since: Option<String>,
}

#[derive(Deserialize)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct RecentLogs {
  pub logs: Vec<StoredEntry>,
}

#[derive(Serialize)]
pub struct TopGroups {
  pub groups: Vec<GroupItem>,
}

#[derive(Serialize)]
pub struct RecentRejected {
  pub rejected: Vec<RejectionRecord>,
}
