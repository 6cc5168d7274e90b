use clap::Args;

use sealdrop_daemon::state::AppState;
use sealdrop_daemon::{spawn_service, StateError};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override API server port (default from config)
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.sealdrop)
        let state = AppState::load(ctx.config_path.clone())?;

        let config = state.service_config(self.api_port, self.log_dir.clone())?;

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
