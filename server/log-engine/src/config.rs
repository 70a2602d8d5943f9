//! Engine configuration with sane defaults, overridable from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::LogError;

/// Levels accepted by the validator, in severity order.
pub const ALLOWED_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

/// Tunables for validation, storage and read-side queries.
#[derive(Debug, Clone)]
pub struct Config {
  /// Directory holding `logs.jsonl` and `totals.json`.
  pub data_dir: PathBuf,
  /// Ceiling on UTF-8 bytes of message + raw payload.
  pub max_log_size_bytes: usize,
  pub allowed_levels: Vec<String>,
  /// Ring capacity for recent ingest batch summaries.
  pub recent_batches_capacity: usize,
  /// Ring capacity for recent rejection reasons.
  pub recent_rejections_capacity: usize,
  /// How many groups the insights context includes.
  pub insights_top_groups: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_dir: PathBuf::from("./data"),
      max_log_size_bytes: 50_000,
      allowed_levels: ALLOWED_LEVELS.iter().map(|l| l.to_string()).collect(),
      recent_batches_capacity: 50,
      recent_rejections_capacity: 100,
      insights_top_groups: 10,
    }
  }
}

impl Config {
  /// Defaults overlaid with `LOG_ENGINE_DATA_DIR` and `MAX_LOG_SIZE_BYTES`.
  pub fn from_env() -> Result<Self, LogError> {
    let mut config = Self::default();
    if let Ok(dir) = std::env::var("LOG_ENGINE_DATA_DIR") {
      if !dir.trim().is_empty() {
        config.data_dir = PathBuf::from(dir);
      }
    }
    if let Some(max) = env_parse::<usize>("MAX_LOG_SIZE_BYTES")? {
      config.max_log_size_bytes = max;
    }
    Ok(config)
  }

  pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.data_dir = dir.into();
    self
  }

  pub fn logs_path(&self) -> PathBuf {
    self.data_dir.join("logs.jsonl")
  }

  pub fn totals_path(&self) -> PathBuf {
    self.data_dir.join("totals.json")
  }

  pub fn is_allowed_level(&self, level: &str) -> bool {
    self.allowed_levels.iter().any(|l| l == level)
  }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, LogError> {
  match std::env::var(key) {
    Ok(v) => v
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|_| LogError::config(key, &format!("cannot parse {:?}", v))),
    Err(_) => Ok(None),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_documented_values() {
    let config = Config::default();
    assert_eq!(config.max_log_size_bytes, 50_000);
    assert_eq!(config.recent_batches_capacity, 50);
    assert_eq!(config.recent_rejections_capacity, 100);
    assert!(config.is_allowed_level("WARNING"));
    assert!(!config.is_allowed_level("WARN"));
  }

  #[test]
  fn paths_live_under_data_dir() {
    let config = Config::default().with_data_dir("/tmp/logs-x");
    assert_eq!(config.logs_path(), PathBuf::from("/tmp/logs-x/logs.jsonl"));
    assert_eq!(config.totals_path(), PathBuf::from("/tmp/logs-x/totals.json"));
  }
}
