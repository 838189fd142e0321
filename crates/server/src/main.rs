//! ballot-rs server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use ballot_api::{AppState, router as api_router};
use ballot_common::Config;
use ballot_core::{
    PollService, RatingService, StatsOptions, VoteService, VoteStatsService, locker_from_config,
};
use ballot_db::repositories::{DependentRepository, PollRepository, VoteRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ballot=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting ballot-rs server...");

    // Load configuration. A malformed [dependents] routing table fails
    // here, before anything binds.
    let config = Config::load()?;

    // Connect to database
    let db = ballot_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    ballot_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let poll_repo = PollRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let dependent_repo = DependentRepository::new(Arc::clone(&db));

    // Initialize services
    let locker = locker_from_config(&config.lock);
    let poll_service = PollService::new(poll_repo.clone(), locker);
    let vote_service = VoteService::new(vote_repo.clone(), poll_repo);
    let stats_service = VoteStatsService::new(vote_repo, StatsOptions::from(&config.vote));
    let rating_service = RatingService::new(dependent_repo, config.dependents.clone());

    // Create app state
    let state = AppState {
        poll_service,
        vote_service,
        stats_service,
        rating_service,
    };

    // Build router
    let app = api_router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
