use axum::extract::Json;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::csrf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfResponse {
    pub csrf: String,
}

/// Issue a request-forgery guard token.
///
/// Double-submit pattern: the token goes out both in the response body and
/// in a cookie the client can read; mutating calls echo it in a header.
pub async fn handler(jar: CookieJar) -> impl IntoResponse {
    let token = csrf::issue();

    let cookie = Cookie::build((csrf::CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .max_age(csrf::CSRF_TTL)
        .build();

    (
        jar.add(cookie),
        Json(CsrfResponse { csrf: token }),
    )
        .into_response()
}
