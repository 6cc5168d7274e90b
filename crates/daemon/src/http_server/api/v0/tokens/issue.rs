use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use http::HeaderMap;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use common::identity::Address;

use crate::csrf;
use crate::database::NewToken;
use crate::extract::Identity;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct IssueRequest {
    /// File to grant access to (must be owned by the caller)
    #[arg(long)]
    pub file_id: Uuid,

    /// Token lifetime in minutes; absent or non-positive means the default
    #[arg(long)]
    pub ttl_minutes: Option<i64>,

    /// Address the token is intended for (informational)
    #[arg(long)]
    pub issued_to: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    pub ok: bool,
    pub token: String,
    pub expires_at: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<IssueRequest>,
) -> Result<impl IntoResponse, IssueError> {
    if !csrf::verify(state.policy().require_csrf, &headers, &jar) {
        return Err(IssueError::Csrf);
    }

    let issued_to = req
        .issued_to
        .as_deref()
        .map(|a| Address::from_hex(a).map(|a| a.canonical()))
        .transpose()
        .map_err(|_| IssueError::InvalidIssuedTo)?;

    // unknown file and someone else's file are deliberately the same error
    let owned = state
        .database()
        .file_exists_owned(&req.file_id, &owner.canonical())
        .await?;
    if !owned {
        return Err(IssueError::NotFound);
    }

    let now = OffsetDateTime::now_utc();
    let token = NewToken {
        token: Uuid::new_v4().to_string(),
        file_id: req.file_id,
        issued_to_address: issued_to,
        expires_at: now + time::Duration::minutes(super::effective_ttl_minutes(req.ttl_minutes)),
        created_at: now,
    };

    state.database().insert_token(&token).await?;

    tracing::info!(file_id = %req.file_id, "access token issued");

    Ok((
        http::StatusCode::OK,
        Json(IssueResponse {
            ok: true,
            token: token.token,
            expires_at: token
                .expires_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("Invalid issued_to")]
    InvalidIssuedTo,
    #[error("Request-forgery check failed")]
    Csrf,
    #[error("Not found")]
    NotFound,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for IssueError {
    fn into_response(self) -> Response {
        match self {
            IssueError::InvalidIssuedTo => (
                http::StatusCode::BAD_REQUEST,
                "Invalid issued_to".to_string(),
            )
                .into_response(),
            IssueError::Csrf => {
                (http::StatusCode::FORBIDDEN, "CSRF".to_string()).into_response()
            }
            IssueError::NotFound => {
                (http::StatusCode::NOT_FOUND, "Not found".to_string()).into_response()
            }
            IssueError::Database(_) => {
                tracing::error!("TOKEN ISSUE ERROR: {:?}", self);
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
impl ApiRequest for IssueRequest {
    type Response = IssueResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/tokens").unwrap();
        client.post(full_url).json(&self)
    }
}
