use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http::HeaderMap;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use common::crypto::{Iv, KeyMaterialError, KeyMaterialWire};
use content_store::ContentId;

use crate::csrf;
use crate::database::{NewFileRecord, NewToken};
use crate::extract::Identity;
use crate::http_server::api::client::ApiRequest;
use crate::http_server::api::v0::tokens::effective_ttl_minutes;
use crate::ServiceState;

/// Longest accepted title
pub const MAX_TITLE_CHARS: usize = 200;
/// Longest accepted display name
pub const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Content id of the already-uploaded ciphertext
    pub cid: String,
    pub file_name: Option<String>,
    pub mime: Option<String>,
    /// Declared plaintext size; advisory, but checked against the ceiling
    pub size_bytes: Option<i64>,
    /// Content encryption IV (base64, 12 bytes)
    pub iv: String,
    #[serde(flatten)]
    pub key_material: KeyMaterialWire,
    /// TTL for the default token issued with the record
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateResponse {
    pub file_id: Uuid,
    /// The record's first access token, issued as a side effect
    pub token: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, CreateError> {
    let policy = state.policy();

    if !csrf::verify(policy.require_csrf, &headers, &jar) {
        return Err(CreateError::Csrf);
    }

    let title = req.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if title.is_some_and(|t| t.chars().count() > MAX_TITLE_CHARS) {
        return Err(CreateError::InvalidField("title"));
    }
    if req
        .file_name
        .as_deref()
        .is_some_and(|n| n.chars().count() > MAX_NAME_CHARS)
    {
        return Err(CreateError::InvalidField("file_name"));
    }
    if req.size_bytes.is_some_and(|s| s < 0) {
        return Err(CreateError::InvalidField("size_bytes"));
    }
    // declared size is checked here regardless of what was actually uploaded
    if req
        .size_bytes
        .is_some_and(|s| s as u64 > policy.max_content_bytes)
    {
        return Err(CreateError::TooLarge);
    }

    let cid: ContentId = req
        .cid
        .parse()
        .map_err(|_| CreateError::InvalidField("cid"))?;

    let iv_bytes = BASE64
        .decode(&req.iv)
        .map_err(|_| CreateError::InvalidField("iv"))?;
    let iv = Iv::from_slice(&iv_bytes).map_err(|_| CreateError::InvalidField("iv"))?;

    let key_material = req.key_material.decode()?;
    if key_material.is_raw() && !policy.allow_raw_keys {
        return Err(CreateError::RawKeysNotAllowed);
    }

    let now = OffsetDateTime::now_utc();
    let file = NewFileRecord {
        id: Uuid::new_v4(),
        owner_address: owner.canonical(),
        title: title.map(str::to_string),
        description: req.description,
        cid: cid.to_string(),
        name: req.file_name,
        mime: req.mime,
        size_bytes: req.size_bytes,
        iv,
        key_material,
        created_at: now,
    };

    // default token issuance is part of record creation, one transaction
    let token = NewToken {
        token: Uuid::new_v4().to_string(),
        file_id: file.id,
        issued_to_address: None,
        expires_at: now + time::Duration::minutes(effective_ttl_minutes(req.ttl_minutes)),
        created_at: now,
    };

    state.database().insert_file_with_token(&file, &token).await?;

    tracing::info!(file_id = %file.id, owner = %owner, "file record created");

    Ok((
        http::StatusCode::CREATED,
        Json(CreateResponse {
            file_id: file.id,
            token: token.token,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Invalid {0}")]
    InvalidField(&'static str),
    #[error("Declared size exceeds the ceiling")]
    TooLarge,
    #[error("Request-forgery check failed")]
    Csrf,
    #[error("Raw key material is not enabled on this server")]
    RawKeysNotAllowed,
    #[error("Invalid key material: {0}")]
    KeyMaterial(#[from] KeyMaterialError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for CreateError {
    fn into_response(self) -> Response {
        match self {
            CreateError::InvalidField(field) => {
                (http::StatusCode::BAD_REQUEST, format!("Invalid {}", field)).into_response()
            }
            CreateError::TooLarge => (
                http::StatusCode::PAYLOAD_TOO_LARGE,
                "File too large".to_string(),
            )
                .into_response(),
            CreateError::Csrf => {
                (http::StatusCode::FORBIDDEN, "CSRF".to_string()).into_response()
            }
            CreateError::RawKeysNotAllowed => (
                http::StatusCode::BAD_REQUEST,
                "Raw key not allowed".to_string(),
            )
                .into_response(),
            CreateError::KeyMaterial(e) => {
                (http::StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            CreateError::Database(_) => {
                tracing::error!("FILE CREATE ERROR: {:?}", self);
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
impl ApiRequest for CreateRequest {
    type Response = CreateResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/files").unwrap();
        client.post(full_url).json(&self)
    }
}
