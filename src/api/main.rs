use std::net::SocketAddr;

use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use home_automation_api::middleware;
use home_automation_api::routes::{self, create_api_router};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG environment variable controls log level (default: info)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    info!("Application starting...");

    let app_state = routes::create_app_state()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {e}"))?;

    let app = create_api_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::cors::create_cors_layer()),
        )
        .with_state(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8081".to_string());
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid BIND_ADDR {bind_addr}: {e}"))?;

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
