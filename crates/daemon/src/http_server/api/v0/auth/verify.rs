use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::identity::{login_message, recover_signer, Address};

use crate::http_server::api::client::ApiRequest;
use crate::session::SessionError;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct VerifyRequest {
    /// Context the challenge was issued under
    #[arg(long)]
    pub context: Uuid,

    /// Claimed wallet address (hex, any case)
    #[arg(long)]
    pub address: String,

    /// Signature over the issued login message (65-byte r||s||v hex)
    #[arg(long)]
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
    pub address: String,
    /// The session credential; the caller decides how to carry it
    pub session: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<VerifyRequest>,
) -> Result<impl IntoResponse, VerifyError> {
    let claimed =
        Address::from_hex(&req.address).map_err(|_| VerifyError::InvalidAddress(req.address))?;

    // Consume the challenge before anything else: every verification
    // attempt, successful or not, burns the nonce.
    let challenge = state
        .database()
        .take_challenge(&req.context.to_string())
        .await?
        .ok_or(VerifyError::MissingChallenge)?;

    if challenge.expires_at < OffsetDateTime::now_utc() {
        return Err(VerifyError::MissingChallenge);
    }

    let message = login_message(&challenge.nonce);
    let recovered =
        recover_signer(&message, &req.signature).map_err(|_| VerifyError::InvalidSignature)?;

    // byte-level compare, so presentation case never matters
    if recovered != claimed {
        tracing::warn!(%claimed, %recovered, "login address mismatch");
        return Err(VerifyError::AddressMismatch);
    }

    let session = state.sessions().mint(&claimed)?;
    tracing::info!(address = %claimed, "login verified");

    Ok((
        http::StatusCode::OK,
        Json(VerifyResponse {
            ok: true,
            address: claimed.to_string(),
            session,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Missing challenge")]
    MissingChallenge,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Address mismatch")]
    AddressMismatch,
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for VerifyError {
    fn into_response(self) -> Response {
        match self {
            VerifyError::InvalidAddress(addr) => (
                http::StatusCode::BAD_REQUEST,
                format!("Invalid address: {}", addr),
            )
                .into_response(),
            VerifyError::MissingChallenge => (
                http::StatusCode::BAD_REQUEST,
                "Missing challenge".to_string(),
            )
                .into_response(),
            VerifyError::InvalidSignature => (
                http::StatusCode::BAD_REQUEST,
                "Invalid signature".to_string(),
            )
                .into_response(),
            VerifyError::AddressMismatch => (
                http::StatusCode::UNAUTHORIZED,
                "Address mismatch".to_string(),
            )
                .into_response(),
            VerifyError::Session(_) | VerifyError::Database(_) => {
                tracing::error!("AUTH VERIFY ERROR: {:?}", self);
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
impl ApiRequest for VerifyRequest {
    type Response = VerifyResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/auth/verify").unwrap();
        client.post(full_url).json(&self)
    }
}
