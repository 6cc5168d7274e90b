//! Double-submit request-forgery guard
//!
//! The guard token travels twice: once in a non-httpOnly cookie set by the
//! issue endpoint, once in a request header set by the caller. A mutating
//! request passes when the two match. When enforcement is disabled the
//! guard always passes; that permissive default is unsafe for browser
//! deployments and exists for API-only and development setups.

use axum_extra::extract::cookie::CookieJar;
use http::HeaderMap;
use uuid::Uuid;

/// Cookie carrying the guard token (not httpOnly, the client reads it)
pub const CSRF_COOKIE: &str = "csrf";
/// Header the client echoes the guard token in
pub const CSRF_HEADER: &str = "x-csrf";
/// Guard token cookie lifetime
pub const CSRF_TTL: time::Duration = time::Duration::hours(1);

/// Mint a fresh guard token
pub fn issue() -> String {
    Uuid::new_v4().to_string()
}

/// Check the double-submit pair on a mutating request.
///
/// No-op (always passes) when `required` is false.
pub fn verify(required: bool, headers: &HeaderMap, jar: &CookieJar) -> bool {
    if !required {
        return true;
    }

    let header = headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value()).unwrap_or("");

    !header.is_empty() && header == cookie
}
