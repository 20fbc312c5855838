//! Fundraising campaign service entry point.
//!
//! Exposes the campaign ledger and donation recorder over a small Axum REST
//! API backed by SQLite. Campaign status is reconciled synchronously on
//! every read and write path; there are no background jobs.

mod api;
mod config;
mod db;
mod donations;
mod errors;
mod ledger;
mod models;

#[cfg(test)]
mod test_donations;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    let state = Arc::new(api::ApiState { pool });

    let app = Router::new()
        .route("/health", get(api::health))
        .route(
            "/campaigns",
            get(api::list_campaigns).post(api::create_campaign),
        )
        .route(
            "/campaigns/:id",
            get(api::get_campaign)
                .patch(api::update_campaign)
                .delete(api::delete_campaign),
        )
        .route("/campaigns/:id/donations", post(api::record_donation))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
