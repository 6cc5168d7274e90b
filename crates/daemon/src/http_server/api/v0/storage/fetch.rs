use axum::body::Body;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::header;

use content_store::{ContentId, ContentStoreError};

use crate::ServiceState;

/// Fetch a ciphertext blob by content id.
///
/// Anonymous by design: the bytes are ciphertext, and the content id only
/// circulates inside redemption payloads. Content-addressed blobs never
/// change, hence the immutable cache header.
pub async fn handler(
    State(state): State<ServiceState>,
    Path(cid): Path<String>,
) -> Result<impl IntoResponse, FetchError> {
    let cid: ContentId = cid.parse().map_err(|_| FetchError::InvalidContentId)?;

    let bytes = state
        .store()
        .get(&cid)
        .await?
        .ok_or(FetchError::NotFound)?;

    Ok(Response::builder()
        .status(http::StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(bytes))
        .expect("valid response"))
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid content id")]
    InvalidContentId,
    #[error("Not found")]
    NotFound,
    #[error("Store error: {0}")]
    Store(#[from] ContentStoreError),
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::InvalidContentId => (
                http::StatusCode::BAD_REQUEST,
                "Invalid content id".to_string(),
            )
                .into_response(),
            FetchError::NotFound => {
                (http::StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
            }
            FetchError::Store(_) => {
                tracing::error!("STORAGE FETCH ERROR: {:?}", self);
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected error".to_string(),
                )
                    .into_response()
            }
        }
    }
}
