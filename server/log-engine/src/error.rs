//! Structured error types for the log engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LogError {
  /// The event is not a structured object.
  #[error("{0}")]
  MalformedInput(String),

  /// One or more acceptance rules failed; reasons are kept in rule order.
  #[error("{}", .0.join("; "))]
  Validation(Vec<String>),

  /// The persistence medium rejected a read or write.
  #[error("storage failed: {0}")]
  Storage(String),

  #[error("config: {key}: {reason}")]
  Config { key: String, reason: String },

  /// The insights collaborator could not produce text.
  #[error("summarizer: {0}")]
  Summarizer(String),
}

impl LogError {
  pub fn malformed(msg: impl Into<String>) -> Self {
    Self::MalformedInput(msg.into())
  }

  pub fn storage(msg: impl Into<String>) -> Self {
    Self::Storage(msg.into())
  }

  pub fn config(key: &str, reason: &str) -> Self {
    Self::Config {
      key: key.to_string(),
      reason: reason.to_string(),
    }
  }
}

impl From<std::io::Error> for LogError {
  fn from(e: std::io::Error) -> Self {
    Self::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for LogError {
  fn from(e: serde_json::Error) -> Self {
    Self::Storage(format!("json: {}", e))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn validation_reasons_are_joined_in_order() {
    let err = LogError::Validation(vec!["first".into(), "second".into()]);
    assert_eq!(err.to_string(), "first; second");
  }

  #[test]
  fn io_errors_classify_as_storage() {
    let err: LogError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
    assert!(matches!(err, LogError::Storage(_)));
    assert_eq!(err.to_string(), "storage failed: disk gone");
  }
}
