use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use url::form_urlencoded;

use crate::{
    AppState,
    classifier::classify,
    config::AppConfig,
    models::{Classification, Verdict, VerificationOutcome},
};

/// Where unproven callers are sent. Lives under the `/admin` bypass prefix,
/// which is what keeps the redirect itself out of the guard's reach.
pub const LOGIN_PATH: &str = "/admin/login";

/// The fixed body of every 403 this guard produces.
pub const FORBIDDEN_MESSAGE: &str = "Forbidden: Admin or Owner access required";

// The only role values that may read guarded paths. Exact, case-sensitive
// match; no trimming or case-folding is applied.
const ALLOWED_ROLES: [&str; 2] = ["owner", "admin"];

/// access_guard
///
/// The middleware enforcing the access policy for the documentation site.
/// Every request traverses exactly one of three arms:
///
/// 1. `Bypass`/`Unguarded` paths pass straight through to the inner router.
///    No identity work happens and no outbound call is made.
/// 2. `Guarded` paths are held open while the identity endpoint is consulted,
///    then either passed through (admin/owner), redirected to the login page
///    (identity unproven for any reason), or rejected with 403 (verified user,
///    insufficient role).
///
/// The evaluation carries no state between requests; re-running the same
/// request always yields the same verdict.
pub async fn access_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    match classify(&path) {
        Classification::Bypass | Classification::Unguarded => next.run(request).await,
        Classification::Guarded => {
            let outcome = verify_request(&state, request.uri(), request.headers()).await;

            match decide(outcome, &path) {
                Verdict::Allow => next.run(request).await,
                Verdict::RedirectToLogin(target) => {
                    tracing::debug!(%path, %target, "identity unproven, redirecting to login");
                    Redirect::temporary(&target).into_response()
                }
                Verdict::Forbidden(message) => {
                    tracing::debug!(%path, "verified user lacks admin/owner role");
                    (StatusCode::FORBIDDEN, message).into_response()
                }
            }
        }
    }
}

/// verify_request
///
/// Gathers the pieces of the original request the identity call needs (origin
/// for the same-origin URL, cookie and user-agent for forwarding) and runs
/// the lookup. Header values that are not valid visible-ASCII are treated as
/// absent rather than rejected.
async fn verify_request(state: &AppState, uri: &Uri, headers: &HeaderMap) -> VerificationOutcome {
    let origin = request_origin(uri, headers, &state.config);

    let cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    state
        .identity
        .current_user(origin.as_deref(), cookie, user_agent)
        .await
}

/// request_origin
///
/// Reconstructs the scheme + authority of the inbound request so the identity
/// call stays same-origin. Absolute-form request URIs carry both directly;
/// the common origin-form case falls back to the `host` header, with the
/// scheme taken from `x-forwarded-proto` (set by the TLS-terminating proxy)
/// or the environment's default.
///
/// Returns `None` when no host can be determined; the identity client maps
/// that to a transport-level failure.
fn request_origin(uri: &Uri, headers: &HeaderMap, config: &AppConfig) -> Option<String> {
    if let (Some(scheme), Some(authority)) = (uri.scheme_str(), uri.authority()) {
        return Some(format!("{scheme}://{authority}"));
    }

    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or(&config.default_scheme);

    Some(format!("{scheme}://{host}"))
}

/// decide
///
/// The authorization decision: folds a `VerificationOutcome` and the original
/// request path into a terminal `Verdict`.
///
/// Fail-closed by construction: transport errors, bad statuses, malformed
/// bodies and missing identifiers all collapse to the login redirect. Only a
/// verified record whose role is exactly `"owner"` or `"admin"` reaches
/// `Allow`; any other role value (missing included) is a 403.
pub fn decide(outcome: VerificationOutcome, path: &str) -> Verdict {
    match outcome {
        VerificationOutcome::Authenticated(user) => {
            let role = user.role.as_deref().unwrap_or("");
            if ALLOWED_ROLES.contains(&role) {
                Verdict::Allow
            } else {
                Verdict::Forbidden(FORBIDDEN_MESSAGE)
            }
        }
        VerificationOutcome::TransportError
        | VerificationOutcome::Unauthenticated
        | VerificationOutcome::MalformedResponse => {
            Verdict::RedirectToLogin(login_redirect(path))
        }
    }
}

/// login_redirect
///
/// Builds the login target, recording the originally requested path in the
/// `redirect` query parameter (form-encoded, so `/docs/intro` becomes
/// `%2Fdocs%2Fintro`) for post-login return.
pub fn login_redirect(path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect={encoded}")
}
