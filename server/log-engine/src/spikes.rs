//! Per-group volume spike detection: current window vs. prior-window baseline.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::group::{matches, normalize_level_filter};
use crate::store::Store;
use crate::types::{SpikeItem, SpikeQuery, SpikesResponse, StoredEntry};

/// Detect spikes against the current wall clock.
pub fn detect(store: &Store, query: &SpikeQuery) -> SpikesResponse {
  detect_at(store, query, Utc::now())
}

pub fn detect_at(store: &Store, query: &SpikeQuery, now: DateTime<Utc>) -> SpikesResponse {
  SpikesResponse {
    spikes: store.scan(|rows| find_spikes(rows, query, now)),
  }
}

/// `at` minus `minutes`, clamped to the earliest representable instant.
fn minutes_before(at: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
  Duration::try_minutes(minutes)
    .and_then(|d| at.checked_sub_signed(d))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Round to two decimals.
fn round2(v: f64) -> f64 {
  (v * 100.0).round() / 100.0
}

struct Current<'a> {
  row: &'a StoredEntry,
  count: u64,
}

/// Compare each group's count in `[now - w, now)` with its average per-window
/// count over the `baseline_windows` windows immediately before.
///
/// Groups with no baseline volume are never reported, and a non-finite
/// threshold matches nothing.
pub fn find_spikes(rows: &[StoredEntry], query: &SpikeQuery, now: DateTime<Utc>) -> Vec<SpikeItem> {
  if !query.ratio_threshold.is_finite() {
    return Vec::new();
  }
  let baseline_windows = query.baseline_windows.max(1);
  let window_minutes = i64::from(query.window_minutes);
  let current_start = minutes_before(now, window_minutes);
  let baseline_start = window_minutes
    .checked_mul(i64::from(baseline_windows))
    .map_or(DateTime::<Utc>::MIN_UTC, |m| minutes_before(current_start, m));

  let level = query.level.as_deref().map(normalize_level_filter);
  let filtered = rows
    .iter()
    .filter(|r| matches(r, query.service.as_deref(), level.as_deref(), None));

  let mut current: HashMap<&str, Current> = HashMap::new();
  let mut baseline: HashMap<&str, u64> = HashMap::new();
  for row in filtered {
    let ts = row.entry.timestamp;
    if ts >= current_start && ts < now {
      current
        .entry(row.group_id.as_str())
        .or_insert(Current { row, count: 0 })
        .count += 1;
    } else if ts >= baseline_start && ts < current_start {
      *baseline.entry(row.group_id.as_str()).or_insert(0) += 1;
    }
  }

  let window_start = current_start.to_rfc3339();
  let mut spikes: Vec<SpikeItem> = current
    .into_iter()
    .filter_map(|(group_id, cur)| {
      let baseline_avg = *baseline.get(group_id)? as f64 / f64::from(baseline_windows);
      if baseline_avg <= 0.0 || (cur.count as f64) < query.ratio_threshold * baseline_avg {
        return None;
      }
      Some(SpikeItem {
        group_id: group_id.to_string(),
        service: cur.row.entry.service.clone(),
        level: cur.row.entry.level.clone(),
        window_start: window_start.clone(),
        count: cur.count,
        baseline_avg,
        ratio: round2(cur.count as f64 / baseline_avg),
      })
    })
    .collect();

  spikes.sort_by(|a, b| {
    b.ratio
      .partial_cmp(&a.ratio)
      .unwrap_or(Ordering::Equal)
      .then_with(|| a.group_id.cmp(&b.group_id))
  });
  spikes
}
