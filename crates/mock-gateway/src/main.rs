//! Mock gateway binary.

use std::sync::Arc;

use mock_gateway::{router, AppState, GatewayConfig};
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::from_env();
    let listen_port = config.listen_port;
    info!(
        access_ttl_secs = config.access_ttl_secs,
        refresh_ttl_secs = config.refresh_ttl_secs,
        "token lifetimes configured (use GATEWAY_JWT_SECRET in shared deployments)"
    );

    let app = router(Arc::new(AppState::seeded(config)));

    let addr = format!("0.0.0.0:{listen_port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");

    info!(address = %addr, "mock gateway listening");
    axum::serve(listener, app).await.expect("server error");
}
