//! Log Investigation Engine — deterministic ingestion, grouping and spike detection.
//!
//! Normalizes schema-less log events into canonical entries, rejects invalid
//! ones, fingerprints messages into stable groups, appends accepted entries to
//! an append-only store, and answers group/spike queries at read time.
//!
//! No AI, no network; text summaries come from a pluggable collaborator.

pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod group;
pub mod insights;
pub mod logging;
pub mod normalize;
pub mod ring;
pub mod spikes;
pub mod store;
pub mod types;
pub mod validate;

pub use config::Config;
pub use engine::Engine;
pub use error::LogError;
pub use insights::{StaticSummarizer, Summarizer};
pub use store::Store;
pub use types::{CanonicalLogEntry, IngestReport, RawEvent};
