use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use http::HeaderMap;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::csrf;
use crate::extract::Identity;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct RevokeRequest {
    /// The token to revoke
    #[arg(long)]
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevokeResponse {
    pub ok: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<RevokeRequest>,
) -> Result<impl IntoResponse, RevokeError> {
    if !csrf::verify(state.policy().require_csrf, &headers, &jar) {
        return Err(RevokeError::Csrf);
    }

    // ownership checked through the file record; unknown and not-yours are
    // the same not-found. Re-revoking is fine (one-way flag).
    let revoked = state
        .database()
        .revoke_token(&req.token, &owner.canonical())
        .await?;
    if !revoked {
        return Err(RevokeError::NotFound);
    }

    tracing::info!("access token revoked");

    Ok((http::StatusCode::OK, Json(RevokeResponse { ok: true })).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    #[error("Request-forgery check failed")]
    Csrf,
    #[error("Not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for RevokeError {
    fn into_response(self) -> Response {
        match self {
            RevokeError::Csrf => {
                (http::StatusCode::FORBIDDEN, "CSRF".to_string()).into_response()
            }
            RevokeError::NotFound => {
                (http::StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
            }
            RevokeError::Database(_) => {
                tracing::error!("TOKEN REVOKE ERROR: {:?}", self);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for RevokeRequest {
    type Response = RevokeResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/tokens/revoke").unwrap();
        client.post(full_url).json(&self)
    }
}
