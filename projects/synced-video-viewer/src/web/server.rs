use crate::web::api::{get_figure, get_info, get_keys};
use crate::web::assets::{index_handler, static_handler};
use crate::web::state::AppState;
use crate::web::stream::stream_handler;
use anyhow::Result;
use axum::{routing::get, Router};
use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/figure", get(get_figure))
        .route("/api/info", get(get_info))
        .route("/api/keys", get(get_keys))
        .route("/stream", get(stream_handler))
        .route("/*path", get(static_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the viewer, moving to the next port while the requested one is taken.
pub async fn run_server(state: Arc<AppState>, host: IpAddr, port: u16) -> Result<()> {
    let mut current_port = port;
    let listener = loop {
        let addr = SocketAddr::new(host, current_port);
        match TcpListener::bind(addr) {
            Ok(listener) => {
                // Tokio requires a non-blocking socket
                listener.set_nonblocking(true)?;
                info!("Successfully bound to {}", addr);
                break listener;
            }
            Err(e) => {
                warn!("Failed to bind to {}: {}. Trying next port...", addr, e);
                current_port = current_port
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("No available ports found"))?;
            }
        }
    };

    let tokio_listener = tokio::net::TcpListener::from_std(listener)?;
    info!(
        "Synced video viewer started on http://{}",
        tokio_listener.local_addr()?
    );

    axum::serve(tokio_listener, router(state)).await?;

    Ok(())
}
