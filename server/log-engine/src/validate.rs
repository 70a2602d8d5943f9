//! Acceptance rules for canonical entries and untyped records.
//!
//! Every rule is checked independently; errors accumulate in rule order.

use serde_json::Value;

use crate::config::Config;
use crate::types::{CanonicalLogEntry, ValidationOutcome};

/// Validate a normalized entry. Payload size is message + raw, in UTF-8 bytes.
pub fn validate_entry(entry: &CanonicalLogEntry, config: &Config) -> ValidationOutcome {
  let payload_size = entry.message.len() + entry.raw.len();
  check(&entry.level, payload_size, config)
}

/// Validate an untyped record before normalization.
///
/// Level is read from `level`, `lvl` or `severity` (default INFO); payload
/// size is the compact JSON rendering of the whole record.
pub fn validate_raw(value: &Value, config: &Config) -> ValidationOutcome {
  let Value::Object(map) = value else {
    return ValidationOutcome {
      valid: false,
      errors: vec!["log must be a JSON object".to_string()],
    };
  };

  let level_value = ["level", "lvl", "severity"]
    .iter()
    .filter_map(|k| map.get(*k))
    .find(|v| is_truthy(v));
  let level = match level_value {
    Some(Value::String(s)) => s.to_uppercase(),
    _ => "INFO".to_string(),
  };
  let payload_size = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);

  check(&level, payload_size, config)
}

fn check(level: &str, payload_size: usize, config: &Config) -> ValidationOutcome {
  let mut errors = Vec::new();

  if !config.is_allowed_level(level) {
    errors.push(format!(
      "invalid level: {:?} (allowed: {})",
      level,
      config.allowed_levels.join(", ")
    ));
  }

  if payload_size > config.max_log_size_bytes {
    errors.push(format!(
      "log payload too large: {} > {} bytes",
      payload_size, config.max_log_size_bytes
    ));
  }

  ValidationOutcome {
    valid: errors.is_empty(),
    errors,
  }
}

/// Empty strings, zero, false and null do not count as a provided level.
fn is_truthy(v: &Value) -> bool {
  match v {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::String(s) => !s.is_empty(),
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
    Value::Array(a) => !a.is_empty(),
    Value::Object(o) => !o.is_empty(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::normalize::normalize;
  use serde_json::json;

  fn entry(value: Value) -> CanonicalLogEntry {
    match value {
      Value::Object(map) => normalize(&map),
      _ => panic!("fixture must be an object"),
    }
  }

  #[test]
  fn accepts_every_whitelisted_level() {
    let config = Config::default();
    for level in ["debug", "INFO", "Warning", "error", "critical"] {
      let outcome = validate_entry(&entry(json!({"level": level, "msg": "ok"})), &config);
      assert!(outcome.valid, "{} should be accepted: {:?}", level, outcome.errors);
    }
  }

  #[test]
  fn rejects_unknown_level_naming_the_value() {
    let outcome = validate_entry(&entry(json!({"level": "INVALID", "message": ""})), &Config::default());
    assert!(!outcome.valid);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("INVALID"));
  }

  #[test]
  fn rejects_oversized_payload_with_both_numbers() {
    let config = Config {
      max_log_size_bytes: 64,
      ..Config::default()
    };
    let outcome = validate_entry(&entry(json!({"msg": "x".repeat(100)})), &config);
    assert!(!outcome.valid);
    assert!(outcome.errors[0].contains("> 64"));
  }

  #[test]
  fn errors_accumulate_without_short_circuit() {
    let config = Config {
      max_log_size_bytes: 10,
      ..Config::default()
    };
    let outcome = validate_entry(&entry(json!({"lvl": "loud", "msg": "far too long a message"})), &config);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].starts_with("invalid level"));
    assert!(outcome.errors[1].starts_with("log payload too large"));
  }

  #[test]
  fn payload_at_ceiling_is_accepted() {
    let e = entry(json!({"msg": "abc"}));
    let config = Config {
      max_log_size_bytes: e.message.len() + e.raw.len(),
      ..Config::default()
    };
    assert!(validate_entry(&e, &config).valid);
  }

  #[test]
  fn raw_validation_rejects_non_objects() {
    let outcome = validate_raw(&json!([1, 2, 3]), &Config::default());
    assert!(!outcome.valid);
    assert_eq!(outcome.errors, vec!["log must be a JSON object".to_string()]);
  }

  #[test]
  fn raw_validation_reads_level_aliases() {
    let config = Config::default();
    assert!(validate_raw(&json!({"severity": "warning"}), &config).valid);
    assert!(validate_raw(&json!({"message": "no level at all"}), &config).valid);
    assert!(!validate_raw(&json!({"lvl": "verbose"}), &config).valid);
    // Non-string levels are treated as absent.
    assert!(validate_raw(&json!({"level": 7}), &config).valid);
  }
}
