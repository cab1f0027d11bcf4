use crate::models::Classification;

// --- Route Tables ---

// Prefixes excluded from all authorization logic. The login page lives under
// /admin, and the identity endpoint lives under /api, so both MUST short-circuit
// before the guarded-path check runs. Otherwise the guard would intercept its
// own redirect target and loop forever.
const BYPASS_PREFIXES: [&str; 5] = ["/admin", "/api", "/_next", "/favicon.ico", "/demo.mp4"];

// Prefixes reserved for the documentation tree and its machine-readable
// exports (plain-text/markdown mirrors and the OpenGraph image endpoint).
const GUARDED_PREFIXES: [&str; 5] = ["/docs", "/llms.txt", "/llms.mdx", "/llms-full.txt", "/docs-og"];

/// classify
///
/// Sorts a request path into exactly one `Classification`. This is the first
/// step of every evaluation and the only place route membership is defined.
///
/// Rules, in order:
/// 1. Bypass prefix match (unconditional short-circuit).
/// 2. Guarded: exact match on the site root `/`, or guarded prefix match.
/// 3. Everything else is `Unguarded`.
///
/// The function is pure and total over all path strings (empty strings and
/// trailing slashes included). It only ever sees the path component of the
/// URI; the query string is stripped by the routing layer before this runs.
/// Matching is case-sensitive plain prefix matching.
pub fn classify(path: &str) -> Classification {
    if BYPASS_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return Classification::Bypass;
    }

    if path == "/" || GUARDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return Classification::Guarded;
    }

    Classification::Unguarded
}
