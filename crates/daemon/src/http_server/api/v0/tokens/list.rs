use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::database::TokenSummary;
use crate::extract::Identity;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub ok: bool,
    pub tokens: Vec<TokenEntry>,
}

/// Wire form of a token listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub file_id: Uuid,
    pub revoked: bool,
    pub expires_at: String,
    pub created_at: String,
    pub title: Option<String>,
    pub name: Option<String>,
    pub size_bytes: Option<i64>,
}

impl From<TokenSummary> for TokenEntry {
    fn from(summary: TokenSummary) -> Self {
        TokenEntry {
            token: summary.token,
            file_id: summary.file_id,
            revoked: summary.revoked,
            expires_at: summary
                .expires_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
            created_at: summary
                .created_at
                .format(&Rfc3339)
                .expect("formattable timestamp"),
            title: summary.title,
            name: summary.name,
            size_bytes: summary.size_bytes,
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
) -> Result<impl IntoResponse, ListError> {
    let tokens = state
        .database()
        .list_tokens_by_owner(&owner.canonical())
        .await?;

    Ok((
        http::StatusCode::OK,
        Json(ListResponse {
            ok: true,
            tokens: tokens.into_iter().map(Into::into).collect(),
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        tracing::error!("TOKEN LIST ERROR: {:?}", self);
        (
            http::StatusCode::INTERNAL_SERVER_ERROR,
            "Unexpected error".to_string(),
        )
            .into_response()
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ListRequest {
    type Response = ListResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/tokens/list").unwrap();
        client.get(full_url)
    }
}
