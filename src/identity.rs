use async_trait::async_trait;
use reqwest::header;
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use url::Url;

use crate::models::{User, VerificationOutcome};

/// The fixed "current user" resource on the identity provider. The call is
/// always same-origin: only the path of the original request URL is replaced,
/// never the host, protocol, or port.
pub const IDENTITY_PATH: &str = "/api/users/me";

// 1. IdentityService Contract
/// IdentityService
///
/// Defines the abstract contract for the remote "who am I" lookup. This trait
/// allows us to swap the concrete implementation—from the real HTTP client
/// (HttpIdentityClient) in production to the scripted Mock
/// (MockIdentityService) during testing—without affecting the guard middleware.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves the caller's identity by consulting the identity endpoint.
    ///
    /// # Arguments
    /// * `origin`: scheme + authority of the original request (e.g.
    ///   `https://docs.example.com`), or `None` when the guard could not
    ///   derive one. Used only to keep the outbound call same-origin.
    /// * `cookie`: the original `cookie` header, forwarded verbatim when
    ///   present and omitted entirely when absent.
    /// * `user_agent`: the original `user-agent` header, empty string when absent.
    ///
    /// Exactly one outbound call is made per invocation; there are no retries.
    /// If the hosting runtime drops the request mid-flight, dropping this
    /// future aborts the outbound call.
    async fn current_user(
        &self,
        origin: Option<&str>,
        cookie: Option<&str>,
        user_agent: &str,
    ) -> VerificationOutcome;
}

// 2. The Real Implementation (reqwest)
/// HttpIdentityClient
///
/// The concrete implementation backed by a shared `reqwest::Client`. The
/// client is constructed once at startup and reused for every guarded
/// request, so connection pooling applies across evaluations even though each
/// evaluation is independent.
#[derive(Clone)]
pub struct HttpIdentityClient {
    http: reqwest::Client,
}

impl HttpIdentityClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpIdentityClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for HttpIdentityClient {
    /// current_user
    ///
    /// Issues the single `GET {origin}/api/users/me` call and folds every
    /// possible failure into a `VerificationOutcome`. The mapping is strictly
    /// fail-closed: nothing short of a clean JSON body with a usable record
    /// produces `Authenticated`.
    async fn current_user(
        &self,
        origin: Option<&str>,
        cookie: Option<&str>,
        user_agent: &str,
    ) -> VerificationOutcome {
        // A request we cannot even address is a transport-level failure.
        let Some(origin) = origin else {
            return VerificationOutcome::TransportError;
        };

        // Rebuild the original URL with only the path swapped out and the
        // query string cleared, keeping the call same-origin.
        let mut url = match Url::parse(origin) {
            Ok(url) => url,
            Err(_) => return VerificationOutcome::TransportError,
        };
        url.set_path(IDENTITY_PATH);
        url.set_query(None);

        let mut request = self.http.get(url).header(header::USER_AGENT, user_agent);
        // Forward the cookie verbatim if present; never send an empty cookie header.
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(%error, "identity endpoint unreachable");
                return VerificationOutcome::TransportError;
            }
        };

        // 401/403 are the expected "not logged in" answers; any other
        // non-success status is treated the same way.
        if !response.status().is_success() {
            return VerificationOutcome::Unauthenticated;
        }

        if !declares_json(&response) {
            return VerificationOutcome::MalformedResponse;
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(_) => return VerificationOutcome::MalformedResponse,
        };

        match normalize_identity(&body) {
            Some(user) => VerificationOutcome::Authenticated(user),
            None => VerificationOutcome::Unauthenticated,
        }
    }
}

/// declares_json
///
/// Checks the declared content type of the identity response. The body is
/// only parsed when the endpoint explicitly claims JSON; a success response
/// with any other media type (e.g. an HTML login page served by a
/// misconfigured proxy) is malformed, not authenticated.
fn declares_json(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

// --- Response Envelope Normalization ---

/// normalize_identity
///
/// Extracts the candidate user record from one of the identity endpoint's
/// known response envelopes and validates it into a `User`.
///
/// The envelope precedence is an explicit ordered check, not duck-typed
/// probing: a truthy `user` field wins, else the first element of a
/// non-empty `docs` array, else a truthy `doc` field, else the bare parsed
/// value itself. A present-but-falsy `user`/`doc` falls through to the next
/// rule, and so does an empty `docs` array.
///
/// Returns `None` (never panics) when the candidate is not a structured
/// record or its `id` field is missing or falsy.
pub fn normalize_identity(body: &Value) -> Option<User> {
    let candidate = unwrap_envelope(body);
    let record = candidate.as_object()?;

    let id = record.get("id").filter(|value| is_truthy(value))?;
    let id = match id {
        Value::String(id) => id.clone(),
        other => other.to_string(),
    };

    // The role attribute is optional and only meaningful as a string; any
    // other shape is treated as absent and fails the role check downstream.
    let role = record.get("role").and_then(Value::as_str).map(str::to_owned);

    Some(User { id, role })
}

fn unwrap_envelope(body: &Value) -> &Value {
    if let Some(user) = body.get("user") {
        if is_truthy(user) {
            return user;
        }
    }

    if let Some(docs) = body.get("docs").and_then(Value::as_array) {
        if let Some(first) = docs.first() {
            return first;
        }
    }

    if let Some(doc) = body.get("doc") {
        if is_truthy(doc) {
            return doc;
        }
    }

    body
}

// Truthiness as the identity provider's own runtime would apply it:
// null, false, 0 and "" are falsy; every object and array is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityService
///
/// A scripted implementation of `IdentityService` used exclusively in tests.
/// It returns a fixed outcome and counts invocations, which lets tests assert
/// that bypassed and unguarded paths never reach the identity layer at all.
pub struct MockIdentityService {
    outcome: VerificationOutcome,
    calls: AtomicUsize,
}

impl MockIdentityService {
    pub fn new(outcome: VerificationOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of identity lookups performed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn current_user(
        &self,
        _origin: Option<&str>,
        _cookie: Option<&str>,
        _user_agent: &str,
    ) -> VerificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

/// IdentityState
///
/// The concrete type used to share the identity service across the
/// application state.
pub type IdentityState = Arc<dyn IdentityService>;
