//! Normalize raw, schema-less events into canonical log entries.
//!
//! Total by construction: missing or unparseable fields fall back to
//! defaults, never to errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::types::{CanonicalLogEntry, RawEvent};

const TIMESTAMP_ALIASES: &[&str] = &["timestamp", "time", "ts", "@timestamp", "datetime", "date"];
const LEVEL_ALIASES: &[&str] = &[
  "lvl",
  "level",
  "severity",
  "log_level",
  "severityLevel",
  "logLevel",
  "severity_level",
];
const MESSAGE_ALIASES: &[&str] = &["msg", "message", "text", "log", "description"];
const SERVICE_ALIASES: &[&str] = &["service", "service_name", "app", "application", "source", "logger"];
const CORRELATION_ALIASES: &[&str] = &[
  "correlation_id",
  "correlationId",
  "request_id",
  "trace_id",
  "traceId",
  "requestId",
];

const ALL_ALIASES: &[&[&str]] = &[
  TIMESTAMP_ALIASES,
  LEVEL_ALIASES,
  MESSAGE_ALIASES,
  SERVICE_ALIASES,
  CORRELATION_ALIASES,
];

pub const DEFAULT_LEVEL: &str = "INFO";
pub const DEFAULT_MESSAGE: &str = "(no message)";
pub const DEFAULT_SERVICE: &str = "unknown";

/// Epoch values above this are milliseconds.
const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Normalize a raw event, defaulting the timestamp to now.
pub fn normalize(raw: &RawEvent) -> CanonicalLogEntry {
  normalize_at(raw, Utc::now())
}

/// Normalize a raw event with an explicit ingestion time.
pub fn normalize_at(raw: &RawEvent, now: DateTime<Utc>) -> CanonicalLogEntry {
  let lowered = lowercase_keys(raw);

  let timestamp = coerce_timestamp(find_value(&lowered, TIMESTAMP_ALIASES), now);
  let level = coerce_level(find_value(&lowered, LEVEL_ALIASES));
  let message = non_empty_or(coerce_string(find_value(&lowered, MESSAGE_ALIASES)), DEFAULT_MESSAGE);
  let service = non_empty_or(coerce_string(find_value(&lowered, SERVICE_ALIASES)), DEFAULT_SERVICE);
  let correlation_id = coerce_string(find_value(&lowered, CORRELATION_ALIASES));

  CanonicalLogEntry {
    timestamp,
    level,
    message,
    service,
    correlation_id,
    metadata: leftover_fields(raw),
    raw: render_raw(raw),
  }
}

/// Parse an ISO-8601 timestamp; naive forms are read as UTC.
pub fn parse_iso_timestamp(s: &str) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if s.is_empty() {
    return None;
  }
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
  ] {
    if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
      return Some(dt.with_timezone(&Utc));
    }
  }
  for fmt in [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
  ] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

/// Map of lowercased key -> value. On case collisions the later key wins.
fn lowercase_keys(raw: &RawEvent) -> HashMap<String, &Value> {
  raw.iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

/// First alias present (case-insensitive) wins, even if its value is null.
fn find_value<'a>(lowered: &HashMap<String, &'a Value>, aliases: &[&str]) -> Option<&'a Value> {
  aliases
    .iter()
    .find_map(|alias| lowered.get(&alias.to_lowercase()).copied())
}

fn is_alias(key: &str) -> bool {
  let key = key.to_lowercase();
  ALL_ALIASES
    .iter()
    .flat_map(|set| set.iter())
    .any(|alias| alias.to_lowercase() == key)
}

fn leftover_fields(raw: &RawEvent) -> Map<String, Value> {
  raw
    .iter()
    .filter(|(k, v)| !is_alias(k) && !v.is_null())
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

fn render_raw(raw: &RawEvent) -> String {
  if raw.is_empty() {
    return String::new();
  }
  serde_json::to_string(raw).unwrap_or_default()
}

fn coerce_timestamp(value: Option<&Value>, now: DateTime<Utc>) -> DateTime<Utc> {
  let parsed = match value {
    Some(Value::Number(n)) => n.as_f64().and_then(from_epoch),
    Some(Value::String(s)) => parse_iso_timestamp(s).or_else(|| {
      s.trim().parse::<f64>().ok().and_then(from_epoch)
    }),
    _ => None,
  };
  parsed.unwrap_or(now)
}

/// Epoch seconds, or milliseconds when above the threshold.
fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
  if !value.is_finite() {
    return None;
  }
  let secs = if value > EPOCH_MILLIS_THRESHOLD {
    value / 1000.0
  } else {
    value
  };
  let whole = secs.floor();
  let nanos = (((secs - whole) * 1e9).round() as u32).min(999_999_999);
  if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
    return None;
  }
  DateTime::from_timestamp(whole as i64, nanos)
}

fn coerce_level(value: Option<&Value>) -> String {
  let level = coerce_string(value).to_uppercase();
  if level.is_empty() {
    DEFAULT_LEVEL.to_string()
  } else {
    level
  }
}

fn coerce_string(value: Option<&Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(s)) => s.trim().to_string(),
    Some(other) => other.to_string().trim().to_string(),
  }
}

fn non_empty_or(s: String, default: &str) -> String {
  if s.is_empty() {
    default.to_string()
  } else {
    s
  }
}
