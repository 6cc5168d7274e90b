use clap::Args;

use sealdrop_daemon::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::init(ctx.config_path.clone())?;

        Ok(format!(
            "Initialized {}\n  config:  {}\n  records: {}\n  storage: {}\n  api_port: {}",
            state.dir.display(),
            state.dir.join("config.toml").display(),
            state.db_path.display(),
            state.storage_path.display(),
            state.config.api_port,
        ))
    }
}
