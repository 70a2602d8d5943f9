//! Log Investigation HTTP API
//!
//! Thin HTTP surface over the log engine: batch ingest, normalize/validate
//! previews, group and spike queries, insights, dashboard stats and
//! drill-down. Bind to 127.0.0.1 by default (internal only).

mod date;
mod handlers;
mod state;
mod types;

use axum::{
  routing::{get, post},
  Router,
};
use std::sync::Arc;

pub use handlers::ApiError;
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route("/ingest", post(handlers::ingest))
    .route("/normalize", post(handlers::normalize))
    .route("/validate", post(handlers::validate))
    .route("/group", get(handlers::group))
    .route("/spikes", get(handlers::spikes))
    .route("/insights", get(handlers::insights))
    .route("/stats", get(handlers::stats))
    .route("/api/logs", get(handlers::recent_logs))
    .route("/api/groups", get(handlers::top_groups))
    .route("/api/spikes", get(handlers::top_spikes))
    .route("/api/rejected", get(handlers::recent_rejected))
    .with_state(state)
}
