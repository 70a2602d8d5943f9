//! Core types for the log engine (JSON contracts + internal models).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what producers send)
// ---------------------------------------------------------------------------

/// One raw event as sent by a producer. No fixed schema; any field may be missing.
pub type RawEvent = Map<String, Value>;

// ---------------------------------------------------------------------------
// Canonical entry
// ---------------------------------------------------------------------------

/// Canonical log entry after normalization. Every field has a defined value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: String,
  pub message: String,
  pub service: String,
  /// Empty when the producer sent no correlation/request/trace id.
  pub correlation_id: String,
  /// Every producer field not consumed by an alias set, keys preserved.
  pub metadata: Map<String, Value>,
  /// Deterministic rendering of the original payload ("" for an empty object).
  pub raw: String,
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Grouping key: `service|LEVEL|templated message`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

// ---------------------------------------------------------------------------
// Persisted row
// ---------------------------------------------------------------------------

/// One accepted entry as written to the store. Fingerprint and group id are
/// fixed at write time and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
  pub id: u64,
  #[serde(flatten)]
  pub entry: CanonicalLogEntry,
  pub fingerprint: Fingerprint,
  pub group_id: String,
  pub created_at: DateTime<Utc>,
}

/// Scalar lifetime counters persisted next to the log rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
  pub total_rejected: u64,
}

// ---------------------------------------------------------------------------
// Ingestion results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestError {
  pub index: usize,
  pub error: String,
}

/// Accept/reject tally for one batch. `errors` preserves batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
  pub accepted: usize,
  pub rejected: usize,
  pub errors: Vec<IngestError>,
}

/// Outcome of validating one entry or untyped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
  pub valid: bool,
  pub errors: Vec<String>,
}

/// Summary of one processed batch, kept in the recent-ingests ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
  pub accepted: usize,
  pub rejected: usize,
  pub at: DateTime<Utc>,
}

/// One rejected item, kept in the recent-rejections ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectionRecord {
  pub at: DateTime<Utc>,
  pub index: usize,
  pub error: String,
}

// ---------------------------------------------------------------------------
// Group query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupQuery {
  pub service: Option<String>,
  pub level: Option<String>,
  /// Inclusive lower bound on entry timestamp.
  pub since: Option<DateTime<Utc>>,
  pub limit: usize,
}

impl Default for GroupQuery {
  fn default() -> Self {
    Self {
      service: None,
      level: None,
      since: None,
      limit: 50,
    }
  }
}

/// One cluster of entries sharing a fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupItem {
  pub group_id: String,
  pub fingerprint: String,
  pub count: u64,
  pub level: String,
  pub service: String,
  pub sample_message: String,
  pub first_seen: DateTime<Utc>,
  pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResponse {
  pub groups: Vec<GroupItem>,
  /// Number of groups matching the filters, before the limit is applied.
  pub total_groups: usize,
}

// ---------------------------------------------------------------------------
// Spike query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpikeQuery {
  pub window_minutes: u32,
  pub ratio_threshold: f64,
  pub baseline_windows: u32,
  pub service: Option<String>,
  pub level: Option<String>,
}

impl Default for SpikeQuery {
  fn default() -> Self {
    Self {
      window_minutes: 5,
      ratio_threshold: 2.0,
      baseline_windows: 6,
      service: None,
      level: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeItem {
  pub group_id: String,
  pub service: String,
  pub level: String,
  pub window_start: String,
  pub count: u64,
  pub baseline_avg: f64,
  pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikesResponse {
  pub spikes: Vec<SpikeItem>,
}

// ---------------------------------------------------------------------------
// Dashboard / insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
  pub total_logs: u64,
  pub total_groups: usize,
  pub total_rejected: u64,
  pub spikes_count: usize,
  pub recent_ingests: Vec<BatchSummary>,
}

/// Filters shared by the insights context builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightsQuery {
  pub service: Option<String>,
  pub level: Option<String>,
  pub since: Option<DateTime<Utc>>,
}

/// Structured context handed to the summarizer collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsContext {
  pub top_groups: Vec<GroupItem>,
  pub spikes: Vec<SpikeItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsReport {
  pub summary: String,
  pub top_groups: Vec<GroupItem>,
  pub spikes: Vec<SpikeItem>,
}

// ---------------------------------------------------------------------------
// CLI / HTTP error wrapper
// ---------------------------------------------------------------------------

/// Structured error output for unusable input lines and failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
