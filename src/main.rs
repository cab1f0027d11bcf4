use axum::{Router, routing::get};
use docs_guard::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    identity::{HttpIdentityClient, IdentityState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the standalone guard binary, responsible
/// for initializing Configuration, Logging, the identity client, and the HTTP
/// server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading
    // Loads .env file settings before configuration can be read.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Sets the default log level. It prioritizes the RUST_LOG environment
    // variable, falling back to sensible defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docs_guard=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    // The structured logging format is dynamically selected based on the APP_ENV.
    match config.env {
        Env::Local => {
            // LOCAL: Pretty print output for human readability during local debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON format output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Access guard starting in {:?} mode", config.env);

    // 4. Identity Client Initialization
    // One shared reqwest client serves every guarded request for the lifetime
    // of the process.
    let identity = Arc::new(HttpIdentityClient::new()) as IdentityState;

    // 5. Unified State Assembly
    let app_state = AppState {
        identity,
        config: config.clone(),
    };

    // 6. Router and Server Startup
    // Standalone mode wraps the guard around the service's own operational
    // routes. A full deployment passes the documentation application's router
    // to `create_router` in place of `service_routes()`.
    let app = create_router(app_state, service_routes());

    let listener = TcpListener::bind(&config.bind_addr).await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.unwrap();
}

/// service_routes
///
/// The minimal inner application served in standalone mode.
fn service_routes() -> Router {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Not in the guarded set, so it passes the guard
        // without an identity lookup.
        .route("/health", get(|| async { "ok" }))
}
