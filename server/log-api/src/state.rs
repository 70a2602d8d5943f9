//! Shared application state.

use std::sync::Arc;

use log_engine::{Engine, StaticSummarizer, Summarizer};

pub struct AppState {
  pub engine: Engine,
  pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
  /// State with the offline summarizer.
  pub fn new(engine: Engine) -> Self {
    Self {
      engine,
      summarizer: Arc::new(StaticSummarizer),
    }
  }

  pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
    self.summarizer = summarizer;
    self
  }
}
