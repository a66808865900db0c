mod cli;
mod figure_config;
mod plot;
mod series;
mod video;
mod web;

use anyhow::Result;
use cli::Args;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use web::server::run_server;
use web::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse_args();
    let state = AppState::from_args(&args)?;

    run_server(Arc::new(state), args.host, args.port).await?;

    Ok(())
}
