//! HTTP server implementation

use axum::{routing::any, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers::{key_handler, root_handler};
use crate::store::Store;

/// Build the application router around a store
pub fn router(store: Arc<dyn Store>, cors: bool) -> Router {
    let mut app = Router::new()
        .route("/", any(root_handler))
        .route("/*key", any(key_handler))
        .layer(TraceLayer::new_for_http());

    if cors {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(store)
}

/// Run the web server until Ctrl+C
pub async fn run_web_server(addr: &str, store: Arc<dyn Store>, cors: bool) -> anyhow::Result<()> {
    let app = router(store, cors);

    // Start the server
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => warn!("Could not listen for Ctrl+C: {}", e),
    }
}
