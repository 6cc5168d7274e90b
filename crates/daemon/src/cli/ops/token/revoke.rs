use clap::Args;

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::tokens::revoke::{RevokeRequest, RevokeResponse};

/// Revoke an access token for a file you own. Safe to repeat.
#[derive(Args, Debug, Clone)]
pub struct Revoke {
    /// Session credential from `sealdrop login`
    #[arg(long)]
    pub session: String,

    #[command(flatten)]
    pub request: RevokeRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Revoke {
    type Error = RevokeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone().with_session(self.session.clone());
        let _: RevokeResponse = client.call(self.request.clone()).await?;

        Ok("revoked".to_string())
    }
}
