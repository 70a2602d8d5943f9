//! On-demand grouping of stored entries by fingerprint.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::store::Store;
use crate::types::{GroupItem, GroupQuery, GroupResponse, StoredEntry};

/// Aggregate the store's current contents. Pure read; nothing is cached.
pub fn query_groups(store: &Store, query: &GroupQuery) -> GroupResponse {
  store.scan(|rows| aggregate(rows, query))
}

struct Acc<'a> {
  row: &'a StoredEntry,
  count: u64,
  first_seen: DateTime<Utc>,
  last_seen: DateTime<Utc>,
}

/// Group rows (in id order) by group id.
///
/// `sample_message` is the earliest-appended member that matches the
/// filters. Ties on count are broken by group id so output is stable.
pub fn aggregate(rows: &[StoredEntry], query: &GroupQuery) -> GroupResponse {
  let level = query.level.as_deref().map(normalize_level_filter);
  let mut groups: HashMap<&str, Acc> = HashMap::new();

  for row in rows.iter().filter(|r| matches(r, query.service.as_deref(), level.as_deref(), query.since)) {
    let ts = row.entry.timestamp;
    groups
      .entry(row.group_id.as_str())
      .and_modify(|acc| {
        acc.count += 1;
        acc.first_seen = acc.first_seen.min(ts);
        acc.last_seen = acc.last_seen.max(ts);
      })
      .or_insert(Acc {
        row,
        count: 1,
        first_seen: ts,
        last_seen: ts,
      });
  }

  let total_groups = groups.len();
  let mut items: Vec<GroupItem> = groups
    .into_values()
    .map(|acc| GroupItem {
      group_id: acc.row.group_id.clone(),
      fingerprint: acc.row.fingerprint.0.clone(),
      count: acc.count,
      level: acc.row.entry.level.clone(),
      service: acc.row.entry.service.clone(),
      sample_message: acc.row.entry.message.clone(),
      first_seen: acc.first_seen,
      last_seen: acc.last_seen,
    })
    .collect();

  items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.group_id.cmp(&b.group_id)));
  items.truncate(query.limit);

  GroupResponse {
    groups: items,
    total_groups,
  }
}

/// Stored levels are uppercase; accept filters in any case.
pub(crate) fn normalize_level_filter(level: &str) -> String {
  level.trim().to_uppercase()
}

pub(crate) fn matches(
  row: &StoredEntry,
  service: Option<&str>,
  level: Option<&str>,
  since: Option<DateTime<Utc>>,
) -> bool {
  service.map_or(true, |s| row.entry.service == s)
    && level.map_or(true, |l| row.entry.level == l)
    && since.map_or(true, |t| row.entry.timestamp >= t)
}
