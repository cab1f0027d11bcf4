use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    routing::get,
};
use docs_guard::{
    AppConfig, AppState, MockIdentityService, User, VerificationOutcome, create_router,
    identity::IdentityState,
};
use std::sync::Arc;
use tower::util::ServiceExt;

// --- Test Harness ---

/// Builds the guarded router around a stand-in documentation application, with
/// the identity layer scripted to a fixed outcome. Returns the concrete mock
/// alongside so tests can assert how many identity lookups actually happened.
fn guarded_app(outcome: VerificationOutcome) -> (Router, Arc<MockIdentityService>) {
    let mock = Arc::new(MockIdentityService::new(outcome));
    let identity = mock.clone() as IdentityState;

    let state = AppState {
        identity,
        config: AppConfig::default(),
    };

    // The inner application: enough routes to observe pass-through verdicts.
    let app = Router::new()
        .route("/", get(|| async { "site root" }))
        .route("/docs/{*rest}", get(|| async { "docs content" }))
        .route("/about", get(|| async { "about page" }))
        .route("/admin/login", get(|| async { "login page" }));

    (create_router(state, app), mock)
}

fn request(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::HOST, "docs.test")
        .body(Body::empty())
        .unwrap()
}

fn authenticated(role: Option<&str>) -> VerificationOutcome {
    VerificationOutcome::Authenticated(User {
        id: "42".to_string(),
        role: role.map(str::to_owned),
    })
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- Bypass & Unguarded Paths ---

#[tokio::test]
async fn test_bypass_paths_skip_identity_entirely() {
    // Even with the identity layer scripted to fail, bypass paths pass
    // through and no lookup is performed.
    let (app, mock) = guarded_app(VerificationOutcome::TransportError);

    let response = app.oneshot(request("/admin/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "login page");
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_bypass_paths_without_inner_route_still_reach_the_app() {
    // The guard passes bypassed paths through unconditionally; whatever the
    // inner application answers (here: its 404 fallback) is the response.
    let (app, mock) = guarded_app(VerificationOutcome::Unauthenticated);

    let response = app.oneshot(request("/_next/static/chunk.js")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_unguarded_paths_are_allowed_without_lookup() {
    let (app, mock) = guarded_app(VerificationOutcome::Unauthenticated);

    let response = app.oneshot(request("/about")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "about page");
    assert_eq!(mock.call_count(), 0);
}

// --- Guarded Paths: Verdicts ---

#[tokio::test]
async fn test_unauthenticated_docs_request_redirects_to_login() {
    let (app, mock) = guarded_app(VerificationOutcome::Unauthenticated);

    let response = app.oneshot(request("/docs/intro")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login?redirect=%2Fdocs%2Fintro"
    );
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_admin_reaches_site_root() {
    let (app, mock) = guarded_app(authenticated(Some("admin")));

    let response = app.oneshot(request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "site root");
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_owner_reaches_docs() {
    let (app, _mock) = guarded_app(authenticated(Some("owner")));

    let response = app.oneshot(request("/docs/guides")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "docs content");
}

#[tokio::test]
async fn test_insufficient_role_is_forbidden() {
    let (app, _mock) = guarded_app(authenticated(Some("editor")));

    let response = app.oneshot(request("/docs/x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_text(response).await,
        "Forbidden: Admin or Owner access required"
    );
}

#[tokio::test]
async fn test_missing_role_is_forbidden() {
    let (app, _mock) = guarded_app(authenticated(None));

    let response = app.oneshot(request("/docs/x")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_transport_error_degrades_to_redirect() {
    // Fail-closed: an unreachable identity endpoint must never allow access.
    let (app, _mock) = guarded_app(VerificationOutcome::TransportError);

    let response = app.oneshot(request("/llms-full.txt")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login?redirect=%2Fllms-full.txt"
    );
}

#[tokio::test]
async fn test_malformed_response_degrades_to_redirect() {
    let (app, _mock) = guarded_app(VerificationOutcome::MalformedResponse);

    let response = app.oneshot(request("/docs-og/banner")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/login?redirect=%2Fdocs-og%2Fbanner"
    );
}

// --- Idempotence ---

#[tokio::test]
async fn test_same_request_twice_yields_the_same_verdict() {
    // No hidden state carries over between evaluations: the second pass makes
    // its own lookup and lands on the same verdict.
    let (app, mock) = guarded_app(authenticated(Some("editor")));

    for _ in 0..2 {
        let response = app.clone().oneshot(request("/docs/x")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_text(response).await,
            "Forbidden: Admin or Owner access required"
        );
    }

    assert_eq!(mock.call_count(), 2);
}
