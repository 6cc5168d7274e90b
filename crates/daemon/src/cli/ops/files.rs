use clap::Args;

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::files::list::{ListRequest, ListResponse};

/// List your published file records.
#[derive(Args, Debug, Clone)]
pub struct Files {
    /// Session credential from `sealdrop login`
    #[arg(long)]
    pub session: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Files {
    type Error = FilesError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut client = ctx.client.clone().with_session(self.session.clone());
        let response: ListResponse = client.call(ListRequest).await?;

        if response.files.is_empty() {
            return Ok("no files".to_string());
        }

        let lines: Vec<String> = response
            .files
            .iter()
            .map(|f| {
                format!(
                    "{}  {}  {}  {}",
                    f.id,
                    f.title.as_deref().unwrap_or("-"),
                    f.name.as_deref().unwrap_or("-"),
                    f.size_bytes
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                )
            })
            .collect();

        Ok(lines.join("\n"))
    }
}
