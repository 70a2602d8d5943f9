//! Binary entrypoint: read JSON lines from stdin, write JSON lines to stdout.
//!
//! Each input line is either one raw event object or an array of events
//! forming a batch. Each line yields one output line:
//! - An IngestReport (accepted/rejected tally with per-index errors)
//! - An ErrorOutput (when the line is not valid JSON)
//!
//! Storage failures that prevent counting rejections stop the process.

use log_engine::types::ErrorOutput;
use log_engine::{logging, Config, Engine};
use serde_json::Value;
use std::io::{self, BufRead, Write};

fn main() {
  logging::init_logging();

  let engine = match Config::from_env().and_then(Engine::open) {
    Ok(e) => e,
    Err(e) => {
      tracing::error!(error = %e, "cannot start log engine");
      std::process::exit(1);
    }
  };

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        tracing::error!(error = %e, "stdin read error");
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let parsed: Value = match serde_json::from_str(trimmed) {
      Ok(v) => v,
      Err(e) => {
        let err = ErrorOutput::new(format!("json parse: {}", e));
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        continue;
      }
    };

    let batch = match parsed {
      Value::Array(items) => items,
      single => vec![single],
    };

    match engine.ingest(&batch) {
      Ok(report) => {
        let _ = serde_json::to_writer(&mut out, &report);
        let _ = writeln!(out);
      }
      Err(e) => {
        let err = ErrorOutput::new(e.to_string()).with_field("storage");
        let _ = serde_json::to_writer(&mut out, &err);
        let _ = writeln!(out);
        let _ = out.flush();
        std::process::exit(1);
      }
    }
  }

  let _ = out.flush();
}
