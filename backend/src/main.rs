use std::sync::Arc;

use axum::middleware;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use eduportal_backend::{logging, mail, routes, store, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check config.toml or the EDUPORTAL__SECTION__KEY environment variables.",
            e
        )
    })?;

    // Initialize tracing
    logging::init(&config.logging.level);

    tracing::info!("Starting EduPortal API");

    // Initialize components
    let store = store::connect(&config.store)?;
    tracing::info!("Using {} document store", store.backend());

    let mailer = mail::from_config(&config.email)?;
    tracing::info!("Using {} email provider", mailer.provider());

    let state = Arc::new(AppState::new(config.clone(), store, mailer));

    // Build router
    let app = routes::router(state)
        .layer(middleware::from_fn(logging::request_logger))
        .layer(routes::cors_layer(&config))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
