use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::database::FileSummary;
use crate::extract::Identity;
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub ok: bool,
    pub files: Vec<FileEntry>,
}

/// Wire form of a file listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub id: uuid::Uuid,
    pub title: Option<String>,
    pub name: Option<String>,
    pub size_bytes: Option<i64>,
    pub created_at: String,
}

impl From<FileSummary> for FileEntry {
    fn from(summary: FileSummary) -> Self {
        FileEntry {
            id: summary.id,
            title: summary.title,
            name: summary.name,
            size_bytes: summary.size_bytes,
            created_at: summary
                .created_at
                .format(&time::format_description::well_known::Rfc3339)
                .expect("formattable timestamp"),
        }
    }
}

pub async fn handler(
    State(state): State<ServiceState>,
    Identity(owner): Identity,
) -> Result<impl IntoResponse, ListError> {
    let files = state
        .database()
        .list_files_by_owner(&owner.canonical())
        .await?;

    Ok((
        http::StatusCode::OK,
        Json(ListResponse {
            ok: true,
            files: files.into_iter().map(Into::into).collect(),
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
        tracing::error!("FILE LIST ERROR: {:?}", self);
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
        let full_url = base_url.join("/api/v0/files/list").unwrap();
        client.get(full_url)
    }
}
