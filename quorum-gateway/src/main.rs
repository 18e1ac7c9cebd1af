//! Entry point for the `quorum-gateway` HTTP server.

use std::sync::Arc;

use quorum_gateway::routes::create_router;
use quorum_service::{NullNotifier, Registry};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("QUORUM_LISTEN_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_owned());

    // No chat transport attached here: notifications are dropped and the
    // audit is driven entirely over HTTP plus whatever embeds Registry.
    let registry = Arc::new(Registry::new(Arc::new(NullNotifier)));
    let app = create_router(registry);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    info!(addr = %addr, "quorum-gateway listening");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
