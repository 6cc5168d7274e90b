use axum::extract::{Json, Multipart, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

use content_store::ContentStoreError;

use crate::csrf;
use crate::extract::Identity;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub cid: String,
}

/// Accept a ciphertext blob (multipart field `file`, optional advisory
/// `name`) and store it content-addressed.
///
/// The store never sees metadata; the advisory name is only logged here and
/// otherwise lives in the file record the caller creates next.
pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
    jar: CookieJar,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let policy = state.policy();

    if !csrf::verify(policy.require_csrf, &headers, &jar) {
        return Err(UploadError::Csrf);
    }

    let mut data: Option<Bytes> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| UploadError::Malformed(e.to_string()))?,
                );
            }
            Some("name") => {
                name = field.text().await.ok();
            }
            _ => {}
        }
    }

    let data = data.ok_or(UploadError::MissingFile)?;
    if data.is_empty() {
        return Err(UploadError::EmptyFile);
    }
    if data.len() as u64 > policy.max_content_bytes {
        return Err(UploadError::TooLarge);
    }

    let cid = state.store().put(data).await?;
    tracing::info!(
        %cid,
        uploader = %owner,
        name = name.as_deref().unwrap_or("-"),
        "ciphertext stored"
    );

    Ok((
        http::StatusCode::OK,
        Json(UploadResponse {
            cid: cid.to_string(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Missing file")]
    MissingFile,
    #[error("Empty file")]
    EmptyFile,
    #[error("File too large")]
    TooLarge,
    #[error("Request-forgery check failed")]
    Csrf,
    #[error("Malformed upload: {0}")]
    Malformed(String),
    #[error("Store error: {0}")]
    Store(#[from] ContentStoreError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::MissingFile => {
                (http::StatusCode::BAD_REQUEST, "Missing file".to_string()).into_response()
            }
            UploadError::EmptyFile => {
                (http::StatusCode::BAD_REQUEST, "Empty file".to_string()).into_response()
            }
            UploadError::TooLarge => (
                http::StatusCode::PAYLOAD_TOO_LARGE,
                "File too large".to_string(),
            )
                .into_response(),
            UploadError::Csrf => {
                (http::StatusCode::FORBIDDEN, "CSRF".to_string()).into_response()
            }
            UploadError::Malformed(msg) => {
                (http::StatusCode::BAD_REQUEST, format!("Malformed upload: {}", msg))
                    .into_response()
            }
            UploadError::Store(_) => {
                tracing::error!("STORAGE UPLOAD ERROR: {:?}", self);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
