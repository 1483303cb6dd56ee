use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use station_routes::cache::CachedRouteClient;
use station_routes::config::AppConfig;
use station_routes::routing::RouteClient;
use station_routes::session::CalculationSession;
use station_routes::stations::StationDirectory;
use station_routes::web::{AppState, create_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("station_routes=info")),
        )
        .init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    // Create routing client
    let client = RouteClient::new(config.routing.clone()).expect("Failed to create routing client");
    let cached = CachedRouteClient::new(client, &config.cache);

    // Load stations (fail fast if unavailable)
    let stations =
        StationDirectory::load(&config.stations_path).expect("Failed to load station directory");
    info!(
        stations = stations.len().await,
        path = %config.stations_path.display(),
        "Loaded station directory"
    );

    let session = CalculationSession::new(Arc::new(cached), config.calculator.clone(), stations);
    let state = AppState::new(session);
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    info!(
        addr = %config.bind_addr,
        routing = %config.routing.base_url,
        "Station route engine listening"
    );

    let shutdown_state = state.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            shutdown_state.session.cancel();
            shutdown_state.shutdown.cancel();
        })
        .await;

    if let Err(e) = result {
        error!(error = %e, "Server error");
    }
}
