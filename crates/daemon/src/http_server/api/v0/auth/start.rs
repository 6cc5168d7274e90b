use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::identity::{login_message, new_nonce};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// How long an issued challenge stays redeemable
pub const CHALLENGE_TTL: time::Duration = time::Duration::minutes(10);

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct StartRequest {
    /// Session-establishment context to scope the challenge to; a fresh
    /// one is minted when absent
    #[arg(long)]
    pub context: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub context: Uuid,
    pub nonce: String,
    pub message: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<StartRequest>,
) -> Result<impl IntoResponse, StartError> {
    let context = req.context.unwrap_or_else(Uuid::new_v4);
    let nonce = new_nonce();

    let now = OffsetDateTime::now_utc();
    // overwrites any pending challenge for this context
    state
        .database()
        .put_challenge(&context.to_string(), &nonce, now, now + CHALLENGE_TTL)
        .await?;

    tracing::debug!(%context, "issued login challenge");

    let message = login_message(&nonce);
    Ok((
        http::StatusCode::OK,
        Json(StartResponse {
            context,
            nonce,
            message,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for StartError {
    fn into_response(self) -> Response {
        tracing::error!("AUTH START ERROR: {:?}", self);
        (
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected error".to_string(),
        )
            .into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for StartRequest {
    type Response = StartResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/auth/start").unwrap();
        client.post(full_url).json(&self)
    }
}
