use closure_recommender::{
    api::{build_router, AppState},
    catalog::create_catalog,
    config::Config,
    recommender::RecommenderService,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "closure_recommender=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    tracing::info!("Starting closure recommender v{}", env!("CARGO_PKG_VERSION"));

    // Initialize catalog backend
    tracing::info!(backend = ?config.catalog.backend, "Initializing catalog");
    let catalog = create_catalog(&config.catalog)?;

    // Initialize recommendation service with an eager load attempt; a
    // missing artifact is not fatal, queries retry the load lazily
    let recommender = Arc::new(RecommenderService::new(catalog, config.model.clone()));
    match recommender.load().await {
        Ok(()) => tracing::info!("Similarity model loaded at startup"),
        Err(e) => tracing::warn!(
            error = %e,
            "Starting without a similarity model; recommendations unavailable until trained"
        ),
    }

    // Build HTTP router
    let app_state = AppState::new(recommender);
    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Recommendations: http://{}/v1/recommendations", http_addr);
    tracing::info!("   Model reload: http://{}/v1/model/reload", http_addr);

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    tracing::info!("Shutting down gracefully...");
    Ok(())
}
