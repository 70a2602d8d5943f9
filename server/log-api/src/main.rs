//! Binary entrypoint for the log API.

use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use log_api::{router, AppState};
use log_engine::{logging, Config, Engine};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  logging::init_logging();

  let config = Config::from_env()?;
  let port: u16 = match std::env::var("PORT") {
    Ok(p) => p.parse().map_err(|_| format!("PORT must be a valid u16, got {:?}", p))?,
    Err(_) => 5000,
  };

  let engine = Engine::open(config)?;
  let state = Arc::new(AppState::new(engine));

  let app = router(state).layer(CorsLayer::permissive());

  let addr = SocketAddr::from(([127, 0, 0, 1], port));
  tracing::info!(%addr, "log-api listening");

  let listener = tokio::net::TcpListener::bind(addr).await?;
  axum::serve(listener, app).await?;

  Ok(())
}
