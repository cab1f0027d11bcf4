use serde::{Deserialize, Serialize};

// --- Core Guard Schemas ---

/// Classification
///
/// The outcome of inspecting a request path, before any identity work happens.
/// Exactly one variant applies to every possible path string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Reserved paths the guard must never intercept (admin UI, the service's
    /// own API surface, framework assets, favicon, the demo video). Checked
    /// first so the guard cannot redirect into itself.
    Bypass,
    /// Paths that require a verified admin/owner identity: the site root and
    /// the documentation tree, including the machine-readable exports.
    Guarded,
    /// Everything else. Implicitly allowed; no identity check is performed.
    Unguarded,
}

/// User
///
/// The normalized identity record extracted from the identity endpoint's
/// response, after envelope unwrapping. It exists only for the duration of a
/// single request evaluation and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct User {
    /// Any non-empty identifier. A candidate record without a usable `id`
    /// never becomes a `User`.
    pub id: String,
    /// The RBAC field. Only `"owner"` and `"admin"` grant access to guarded
    /// paths; comparison is exact and case-sensitive.
    #[serde(default)]
    pub role: Option<String>,
}

/// VerificationOutcome
///
/// The normalized result of one identity lookup. Every failure mode the
/// outbound call can hit is folded into one of the first three variants, so
/// the decision layer never sees a raw transport or parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The endpoint answered but could not prove an identity: non-success
    /// status (401/403 included), or a body without a usable user record.
    Unauthenticated,
    /// The endpoint answered successfully but with a non-JSON content type
    /// or an unparsable body.
    MalformedResponse,
    /// The call never produced an HTTP response: network failure, timeout,
    /// or a request URL that could not be constructed.
    TransportError,
    /// A structured record with a non-empty `id` was extracted.
    Authenticated(User),
}

/// Verdict
///
/// The final decision for one request, translated into an HTTP response by
/// the guard middleware. All variants are terminal; there is no retry or
/// revisit within a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Pass the request through to the inner application unmodified.
    Allow,
    /// 302-class redirect to the login page, carrying the originally
    /// requested path in the `redirect` query parameter for post-login return.
    RedirectToLogin(String),
    /// 403 with a fixed plain-text body. Produced only for a verified user
    /// whose role is not admin/owner.
    Forbidden(&'static str),
}
