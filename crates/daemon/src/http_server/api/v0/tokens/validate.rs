use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::crypto::{KeyMaterial, KeyMaterialWire};

use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ValidateRequest {
    /// The bearer token to redeem
    #[arg(long)]
    pub token: String,
}

/// The full redemption payload: everything a client needs to fetch and
/// decrypt, plus display metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub ok: bool,
    pub file_id: Uuid,
    pub cid: String,
    /// Content encryption IV (base64)
    pub iv: String,
    #[serde(flatten)]
    pub key_material: KeyMaterialWire,
    pub name: String,
    pub mime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,
}

/// Intentionally anonymous: the token itself is the credential here, and
/// the three failure modes are reported distinctly to the redeemer.
pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ValidateRequest>,
) -> Result<impl IntoResponse, ValidateError> {
    let row = state
        .database()
        .get_redemption(&req.token)
        .await?
        .ok_or(ValidateError::NotFound)?;

    if row.revoked {
        return Err(ValidateError::Revoked);
    }
    if row.expires_at < OffsetDateTime::now_utc() {
        return Err(ValidateError::Expired);
    }

    // a stored row that fails the union check is server-side corruption,
    // never the redeemer's fault
    let key_material = KeyMaterial::from_parts(row.salt, row.wrap_iv, row.wrapped_key, row.raw_key)
        .map_err(|e| ValidateError::CorruptRecord(e.to_string()))?;

    Ok((
        http::StatusCode::OK,
        Json(ValidateResponse {
            ok: true,
            file_id: row.file_id,
            cid: row.cid,
            iv: BASE64.encode(&row.iv),
            key_material: KeyMaterialWire::from(&key_material),
            name: row.name.unwrap_or_else(|| "file".to_string()),
            mime: row
                .mime
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: row.size_bytes,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("Not found")]
    NotFound,
    #[error("Revoked")]
    Revoked,
    #[error("Expired")]
    Expired,
    #[error("Corrupt file record: {0}")]
    CorruptRecord(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ValidateError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ValidateError::NotFound => (http::StatusCode::NOT_FOUND, "Not found"),
            ValidateError::Revoked => (http::StatusCode::FORBIDDEN, "Revoked"),
            ValidateError::Expired => (http::StatusCode::FORBIDDEN, "Expired"),
            ValidateError::CorruptRecord(_) | ValidateError::Database(_) => {
                tracing::error!("TOKEN VALIDATE ERROR: {:?}", self);
                (http::StatusCode::INTERNAL_SERVER_ERROR, "Unexpected error")
            }
        };

        (
            status,
            Json(serde_json::json!({ "ok": false, "error": error })),
        )
            .into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ValidateRequest {
    type Response = ValidateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/tokens/validate").unwrap();
        client.post(full_url).json(&self)
    }
}
