//! Core engine: owns the store, runs the ingest pipeline, serves read queries.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashSet;

use crate::config::Config;
use crate::error::LogError;
use crate::fingerprint;
use crate::group;
use crate::insights::{self, Summarizer};
use crate::normalize;
use crate::spikes;
use crate::store::Store;
use crate::types::*;
use crate::validate;

/// The log engine. Shareable across threads; all methods take `&self`.
pub struct Engine {
  config: Config,
  store: Store,
}

impl Engine {
  pub fn new(config: Config, store: Store) -> Self {
    Self { config, store }
  }

  /// Open the durable store under `config.data_dir`.
  pub fn open(config: Config) -> Result<Self, LogError> {
    let store = Store::open(&config)?;
    Ok(Self::new(config, store))
  }

  /// Default config over an in-memory store.
  pub fn with_defaults() -> Self {
    let config = Config::default();
    let store = Store::in_memory(&config);
    Self::new(config, store)
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn store(&self) -> &Store {
    &self.store
  }

  /// Process a batch item by item. Per-item problems become rejections;
  /// accepted items are committed as they go.
  ///
  /// Returns `Err` only when the rejection counter cannot be persisted.
  pub fn ingest(&self, batch: &[Value]) -> Result<IngestReport, LogError> {
    let mut report = IngestReport::default();

    for (index, raw) in batch.iter().enumerate() {
      match self.admit(raw) {
        Ok(_) => report.accepted += 1,
        Err(e) => {
          let reason = e.to_string();
          tracing::warn!(index, reason = %reason, "ingest reject");
          report.rejected += 1;
          report.errors.push(IngestError { index, error: reason });
        }
      }
    }

    let now = Utc::now();
    if report.rejected > 0 {
      tracing::info!(
        accepted = report.accepted,
        rejected = report.rejected,
        total = batch.len(),
        "ingest batch"
      );
      self.store.record_rejections(
        report
          .errors
          .iter()
          .map(|e| RejectionRecord {
            at: now,
            index: e.index,
            error: e.error.clone(),
          })
          .collect(),
      );
    }
    self.store.record_batch(BatchSummary {
      accepted: report.accepted,
      rejected: report.rejected,
      at: now,
    });

    if report.rejected > 0 {
      self.store.increment_rejected(report.rejected as u64)?;
    }
    Ok(report)
  }

  /// Normalize, validate, fingerprint and append one raw event.
  fn admit(&self, raw: &Value) -> Result<u64, LogError> {
    let Value::Object(map) = raw else {
      return Err(LogError::malformed("each log must be a JSON object"));
    };
    let entry = normalize::normalize(map);

    let outcome = validate::validate_entry(&entry, &self.config);
    if !outcome.valid {
      return Err(LogError::Validation(outcome.errors));
    }

    let fp = fingerprint::compute(&entry);
    let group_id = fingerprint::group_id(&fp);
    self.store.append(entry, fp, group_id)
  }

  pub fn normalize(&self, raw: &RawEvent) -> CanonicalLogEntry {
    normalize::normalize(raw)
  }

  pub fn validate(&self, raw: &Value) -> ValidationOutcome {
    validate::validate_raw(raw, &self.config)
  }

  pub fn groups(&self, query: &GroupQuery) -> GroupResponse {
    group::query_groups(&self.store, query)
  }

  pub fn spikes(&self, query: &SpikeQuery) -> SpikesResponse {
    spikes::detect(&self.store, query)
  }

  pub fn insights_context(&self, query: &InsightsQuery) -> InsightsContext {
    insights::build_context(&self.store, query, &self.config)
  }

  pub fn insights(&self, query: &InsightsQuery, summarizer: &dyn Summarizer) -> InsightsReport {
    insights::summarize(self.insights_context(query), summarizer)
  }

  /// Dashboard totals, current spike count and recent batch summaries.
  pub fn stats(&self) -> StatsSnapshot {
    let (total_logs, total_groups) = self.store.scan(|rows| {
      let groups: HashSet<&str> = rows.iter().map(|r| r.group_id.as_str()).collect();
      (rows.len() as u64, groups.len())
    });
    StatsSnapshot {
      total_logs,
      total_groups,
      total_rejected: self.store.total_rejected(),
      spikes_count: self.spikes(&SpikeQuery::default()).spikes.len(),
      recent_ingests: self.store.recent_batches(),
    }
  }

  pub fn recent_logs(&self, limit: usize) -> Vec<StoredEntry> {
    self.store.recent(limit)
  }

  pub fn recent_rejections(&self, limit: usize) -> Vec<RejectionRecord> {
    self.store.recent_rejections(limit)
  }
}
