//! Insights: structured context for an external summarizer, plus an offline
//! fallback summary. Summarizer failures never touch the structured data.

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::error::LogError;
use crate::group;
use crate::spikes;
use crate::store::Store;
use crate::types::{GroupQuery, InsightsContext, InsightsQuery, InsightsReport, SpikeQuery};

/// Collaborator that turns structured context into prose (e.g. an LLM client).
pub trait Summarizer: Send + Sync {
  fn summarize(&self, context: &InsightsContext) -> Result<String, LogError>;
}

/// Deterministic, offline summary. Used when no external collaborator is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticSummarizer;

impl Summarizer for StaticSummarizer {
  fn summarize(&self, context: &InsightsContext) -> Result<String, LogError> {
    Ok(static_summary(context))
  }
}

pub fn static_summary(context: &InsightsContext) -> String {
  let mut parts: Vec<String> = Vec::new();
  if !context.top_groups.is_empty() {
    parts.push(format!("Top {} error groups by volume.", context.top_groups.len()));
    for g in context.top_groups.iter().take(3) {
      let sample: String = g.sample_message.chars().take(80).collect();
      parts.push(format!("[{}] {}: {}x - {}", g.service, g.level, g.count, sample));
    }
  }
  if !context.spikes.is_empty() {
    parts.push(format!("{} spike(s) detected above baseline.", context.spikes.len()));
  }
  if parts.is_empty() {
    "No log groups or spikes in the selected range.".to_string()
  } else {
    parts.join(" ")
  }
}

/// Top groups and current spikes for the given filters.
pub fn build_context(store: &Store, query: &InsightsQuery, config: &Config) -> InsightsContext {
  build_context_at(store, query, config, Utc::now())
}

pub fn build_context_at(
  store: &Store,
  query: &InsightsQuery,
  config: &Config,
  now: DateTime<Utc>,
) -> InsightsContext {
  let groups = group::query_groups(
    store,
    &GroupQuery {
      service: query.service.clone(),
      level: query.level.clone(),
      since: query.since,
      limit: config.insights_top_groups,
    },
  );
  let spikes = spikes::detect_at(
    store,
    &SpikeQuery {
      service: query.service.clone(),
      level: query.level.clone(),
      ..SpikeQuery::default()
    },
    now,
  );
  InsightsContext {
    top_groups: groups.groups,
    spikes: spikes.spikes,
  }
}

/// Prompt text an external language-model collaborator receives.
pub fn build_prompt(context: &InsightsContext) -> Result<String, LogError> {
  let groups = serde_json::to_string_pretty(&context.top_groups)
    .map_err(|e| LogError::Summarizer(e.to_string()))?;
  let spikes = serde_json::to_string_pretty(&context.spikes)
    .map_err(|e| LogError::Summarizer(e.to_string()))?;
  Ok(format!(
    "You are a log investigation assistant. Based on the following log groups and spikes, \
     write a short human-friendly summary (2-4 sentences) for an on-call engineer. Focus on \
     what is most important: recurring errors, spikes, and suggested attention order.\n\n\
     Top error groups (by count):\n{}\n\n\
     Current spikes (volume above baseline):\n{}\n\n\
     Respond with only the summary text, no markdown.",
    groups, spikes
  ))
}

/// Summarize a context, falling back to a short notice if the collaborator
/// fails.
pub fn summarize(context: InsightsContext, summarizer: &dyn Summarizer) -> InsightsReport {
  let summary = match summarizer.summarize(&context) {
    Ok(text) => text.trim().to_string(),
    Err(e) => {
      tracing::warn!(error = %e, "insights summarizer failed");
      format!(
        "Insights unavailable: {}. Top groups: {}; Spikes: {}.",
        e,
        context.top_groups.len(),
        context.spikes.len()
      )
    }
  };
  InsightsReport {
    summary,
    top_groups: context.top_groups,
    spikes: context.spikes,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::GroupItem;

  fn group(service: &str, count: u64, message: &str) -> GroupItem {
    GroupItem {
      group_id: format!("grp-{}", service),
      fingerprint: format!("{}|ERROR|{}", service, message),
      count,
      level: "ERROR".into(),
      service: service.into(),
      sample_message: message.into(),
      first_seen: Utc::now(),
      last_seen: Utc::now(),
    }
  }

  struct Unreachable;

  impl Summarizer for Unreachable {
    fn summarize(&self, _context: &InsightsContext) -> Result<String, LogError> {
      Err(LogError::Summarizer("connection refused".into()))
    }
  }

  #[test]
  fn empty_context_summary() {
    let ctx = InsightsContext {
      top_groups: vec![],
      spikes: vec![],
    };
    assert_eq!(static_summary(&ctx), "No log groups or spikes in the selected range.");
  }

  #[test]
  fn static_summary_lists_top_three() {
    let ctx = InsightsContext {
      top_groups: vec![
        group("a", 9, "one"),
        group("b", 5, "two"),
        group("c", 3, "three"),
        group("d", 1, "four"),
      ],
      spikes: vec![],
    };
    let text = static_summary(&ctx);
    assert!(text.starts_with("Top 4 error groups by volume."));
    assert!(text.contains("[a] ERROR: 9x - one"));
    assert!(text.contains("[c] ERROR: 3x - three"));
    assert!(!text.contains("four"));
  }

  #[test]
  fn failing_collaborator_keeps_structured_data() {
    let ctx = InsightsContext {
      top_groups: vec![group("a", 2, "boom")],
      spikes: vec![],
    };
    let report = summarize(ctx.clone(), &Unreachable);
    assert!(report.summary.contains("connection refused"));
    assert!(report.summary.contains("Top groups: 1"));
    assert_eq!(report.top_groups, ctx.top_groups);
  }

  #[test]
  fn prompt_embeds_context_as_json() {
    let ctx = InsightsContext {
      top_groups: vec![group("billing", 4, "card declined")],
      spikes: vec![],
    };
    let prompt = build_prompt(&ctx).unwrap();
    assert!(prompt.contains("\"service\": \"billing\""));
    assert!(prompt.ends_with("no markdown."));
  }
}
