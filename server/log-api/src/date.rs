//! Date parsing utilities.

use chrono::{DateTime, Utc};
use log_engine::normalize::parse_iso_timestamp;

/// Parse an optional ISO8601 `since` parameter. Blank means no bound.
pub fn parse_since(s: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
  match s.map(str::trim) {
    None | Some("") => Ok(None),
    Some(raw) => parse_iso_timestamp(raw)
      .map(Some)
      .ok_or_else(|| format!("since: invalid ISO timestamp {:?}", raw)),
  }
}
