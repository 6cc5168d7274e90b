use clap::Args;

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::tokens::issue::{IssueRequest, IssueResponse};

/// Issue a fresh access token for a file you own.
#[derive(Args, Debug, Clone)]
pub struct Issue {
    /// Session credential from `sealdrop login`
    #[arg(long)]
    pub session: String,

    #[command(flatten)]
    pub request: IssueRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Issue {
    type Error = IssueError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone().with_session(self.session.clone());
        let response: IssueResponse = client.call(self.request.clone()).await?;

        Ok(format!(
            "token: {}\nexpires_at: {}",
            response.token, response.expires_at
        ))
    }
}
