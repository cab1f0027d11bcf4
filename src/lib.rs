use axum::{extract::FromRef, http::HeaderName, Router, middleware};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core guard components.
pub mod classifier;
pub mod config;
pub mod guard;
pub mod identity;
pub mod models;

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point
// (main.rs) and to hosting applications embedding the guard.
pub use config::AppConfig;
pub use identity::{HttpIdentityClient, IdentityService, IdentityState, MockIdentityService};
pub use models::{Classification, User, Verdict, VerificationOutcome};

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe,
/// and immutable container holding the guard's collaborators and configuration,
/// shared across all incoming requests. There is no per-request or cross-request
/// mutable state anywhere in the guard.
#[derive(Clone)]
pub struct AppState {
    /// Identity Layer: Abstracts the remote "who am I" lookup.
    pub identity: IdentityState,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow middleware and handlers to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Wraps the hosting application's router with the access guard and the
/// observability stack, and returns the assembled service.
///
/// `app` is the documentation application itself (route rendering, static
/// assets, the login page, the identity endpoint), an external collaborator as
/// far as the guard is concerned. Requests the guard passes through reach it
/// unmodified; requests it redirects or rejects never do.
pub fn create_router(state: AppState, app: Router) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Guard Layer
    // Every request entering the inner application crosses the guard first.
    // The bypass prefixes inside the classifier cover the framework asset
    // paths and the favicon, so applying the layer globally is safe.
    let guarded = app.layer(middleware::from_fn_with_state(state, guard::access_guard));

    // 3. Observability and Correlation Layers (Applied outermost/first)
    guarded
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: Generates a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: Wraps the entire request/response lifecycle in a
                // tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: Ensures the generated x-request-id header is
                // returned to the client and injected into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI, so every log
/// line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
