//! Stable fingerprint computation for grouping similar log entries.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::{CanonicalLogEntry, Fingerprint};

pub const UUID_PLACEHOLDER: &str = "<uuid>";
pub const HEX_PLACEHOLDER: &str = "<hex>";
pub const NUMBER_PLACEHOLDER: &str = "<n>";

const SEPARATOR: &str = "|";

fn uuid_re() -> &'static Regex {
  static UUID_RE: OnceLock<Regex> = OnceLock::new();
  UUID_RE.get_or_init(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
      .expect("valid uuid regex")
  })
}

fn hex_re() -> &'static Regex {
  static HEX_RE: OnceLock<Regex> = OnceLock::new();
  HEX_RE.get_or_init(|| Regex::new(r"\b0x[0-9a-fA-F]+\b").expect("valid hex regex"))
}

fn number_re() -> &'static Regex {
  static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
  NUMBER_RE.get_or_init(|| Regex::new(r"\b\d+\b").expect("valid number regex"))
}

fn colon_number_re() -> &'static Regex {
  static COLON_NUMBER_RE: OnceLock<Regex> = OnceLock::new();
  COLON_NUMBER_RE.get_or_init(|| Regex::new(r":\s*<n>").expect("valid colon regex"))
}

/// Reduce a message to its template. Order matters: each pass runs on the
/// output of the previous one.
pub fn template(message: &str) -> String {
  if message.is_empty() {
    return String::new();
  }
  let text = uuid_re().replace_all(message, UUID_PLACEHOLDER);
  let text = hex_re().replace_all(&text, HEX_PLACEHOLDER);
  let text = number_re().replace_all(&text, NUMBER_PLACEHOLDER);
  let text = colon_number_re().replace_all(&text, ":<n>");
  text.trim().to_string()
}

/// Compute the grouping key: service, level and templated message, skipping
/// empty parts.
pub fn compute(entry: &CanonicalLogEntry) -> Fingerprint {
  let templated = template(&entry.message);
  let parts = [entry.service.as_str(), entry.level.as_str(), templated.as_str()];
  let key = parts
    .iter()
    .filter(|p| !p.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(SEPARATOR);
  Fingerprint(key)
}

/// Compact group identifier derived from the fingerprint with blake3.
pub fn group_id(fingerprint: &Fingerprint) -> String {
  let hash = blake3::hash(fingerprint.as_str().as_bytes());
  let hex = hash.to_hex();
  format!("grp-{}", &hex[..16])
}
