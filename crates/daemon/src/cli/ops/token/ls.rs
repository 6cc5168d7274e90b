use clap::Args;

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::tokens::list::{ListRequest, ListResponse};

/// List the access tokens for your files.
#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Session credential from `sealdrop login`
    #[arg(long)]
    pub session: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone().with_session(self.session.clone());
        let response: ListResponse = client.call(ListRequest).await?;

        if response.tokens.is_empty() {
            return Ok("no tokens".to_string());
        }

        let lines: Vec<String> = response
            .tokens
            .iter()
            .map(|t| {
                format!(
                    "{}  {}  {}  expires {}",
                    t.token,
                    if t.revoked { "revoked" } else { "active" },
                    t.title.as_deref().or(t.name.as_deref()).unwrap_or("-"),
                    t.expires_at,
                )
            })
            .collect();

        Ok(lines.join("\n"))
    }
}
