use clap::Args;

use sealdrop_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Health check failed: {0}")]
    Failed(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = HealthError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = Vec::new();

        // 1. Check config directory
        lines.push("Config:".to_string());
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:   {}", state.dir.display()));
                lines.push("  config.toml: OK".to_string());
                lines.push(format!("  api_port:    {}", state.config.api_port));
                lines.push(format!("  csrf guard:  {}", state.config.require_csrf));
                lines.push(format!("  raw keys:    {}", state.config.allow_raw_keys));
            }
            Err(e) => {
                lines.push(format!("  error: {}", e));
            }
        }

        // 2. Check daemon liveness and readiness
        let base = ctx.client.base_url();
        let client = ctx.client.http_client();

        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for probe in ["livez", "readyz"] {
            let url = format!("{}/_status/{}", base.as_str().trim_end_matches('/'), probe);
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    lines.push(format!("  {}: OK", probe));
                }
                Ok(resp) => {
                    lines.push(format!("  {}: UNHEALTHY ({})", probe, resp.status()));
                }
                Err(_) => {
                    lines.push(format!("  {}: NOT REACHABLE", probe));
                }
            }
        }

        Ok(lines.join("\n"))
    }
}
