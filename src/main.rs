mod circuit_breaker;
mod classify;
mod config;
mod ctr;
mod errors;
mod exclusions;
mod export;
mod handlers;
mod metrics;
mod models;
mod pipeline;
mod scoring;
mod search_console;

use axum::{
    routing::{delete, get},
    Router,
};
use moka::future::Cache;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::classify::Classifier;
use crate::config::Config;
use crate::exclusions::ExclusionStore;
use crate::metrics::MetricsStore;
use crate::search_console::SearchConsoleService;

/// Main entry point for the application.
///
/// This function initializes the application, including:
/// - Logging and tracing.
/// - Configuration loading.
/// - The keyword-metrics snapshot (degrading to heuristics-only if the
///   dataset is unavailable).
/// - The exclusion store (brand terms + persisted deletions).
/// - The analysis report cache.
/// - HTTP routes and middleware (CORS, rate limiting).
///
/// It then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "search_opportunity_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Build the read-only keyword metrics snapshot. An unavailable dataset
    // is degraded-but-functional: every lookup falls back to heuristics and
    // rows are marked Estimated.
    let metrics = match MetricsStore::load_dir(Path::new(&config.metrics_data_dir)) {
        Ok(store) => {
            tracing::info!(
                "✓ Metrics snapshot loaded: {} keywords (fingerprint: {})",
                store.len(),
                store.fingerprint().unwrap_or("none")
            );
            store
        }
        Err(e) => {
            tracing::warn!(
                "Metrics dataset unavailable ({}); running with heuristic estimates only",
                e
            );
            MetricsStore::empty()
        }
    };

    // Load the exclusion store (brand terms + persisted deleted keywords)
    let exclusions =
        ExclusionStore::load(config.exclusions_path.clone(), config.brand_terms.clone()).await?;

    // Telemetry client for the search-console style reporting API
    let telemetry = SearchConsoleService::new(&config);
    tracing::info!("✓ Telemetry client initialized: {}", config.search_api_base_url);

    // Analysis report cache: completed immutable snapshots keyed by site and
    // date range. Exclusion edits invalidate; nothing mutates an entry.
    let analysis_cache = Cache::builder()
        .time_to_live(Duration::from_secs(config.analysis_cache_ttl_secs))
        .max_capacity(64)
        .build();
    tracing::info!(
        "Analysis cache initialized ({}s TTL)",
        config.analysis_cache_ttl_secs
    );

    let port = config.port;

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config,
        telemetry,
        classifier: Classifier::new(),
        metrics: Arc::new(metrics),
        exclusions,
        analysis_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/opportunities", get(handlers::list_opportunities))
        .route(
            "/api/v1/opportunities/summary",
            get(handlers::opportunity_summary),
        )
        .route(
            "/api/v1/opportunities/aeo",
            get(handlers::list_answer_opportunities),
        )
        .route(
            "/api/v1/opportunities/export",
            get(handlers::export_opportunities),
        )
        .route(
            "/api/v1/opportunities/export/keywords",
            get(handlers::export_keywords),
        )
        .route(
            "/api/v1/exclusions",
            get(handlers::list_exclusions).post(handlers::add_exclusions),
        )
        .route(
            "/api/v1/exclusions/:keyword",
            delete(handlers::remove_exclusion),
        )
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
