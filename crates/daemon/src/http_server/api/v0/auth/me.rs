use axum::extract::Json;
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::extract::MaybeIdentity;
use crate::http_server::api::client::ApiRequest;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct MeRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Session presence check; never fails, just reports.
pub async fn handler(MaybeIdentity(identity): MaybeIdentity) -> impl IntoResponse {
    let response = match identity {
        Some(address) => MeResponse {
            ok: true,
            address: Some(address.to_string()),
        },
        None => MeResponse {
            ok: false,
            address: None,
        },
    };

    (http::StatusCode::OK, Json(response)).into_response()
}

// Client implementation - builds request for this operation
impl ApiRequest for MeRequest {
    type Response = MeResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let full_url = base_url.join("/api/v0/auth/me").unwrap();
        client.get(full_url)
    }
}
