use std::str::FromStr;

use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use clap::Args;

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::auth::start::{StartRequest, StartResponse};
use sealdrop_daemon::http_server::api::v0::auth::verify::{VerifyRequest, VerifyResponse};

/// Prove control of a wallet key and obtain a session credential.
///
/// The whole challenge/response dance runs here, client-side: fetch a
/// nonce, sign the login message locally, send the signature back. The key
/// never leaves this process.
#[derive(Args, Debug, Clone)]
pub struct Login {
    /// Hex-encoded secp256k1 private key of the wallet
    #[arg(long)]
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("invalid private key")]
    InvalidKey,
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Login {
    type Error = LoginError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let signer = PrivateKeySigner::from_str(&self.key).map_err(|_| LoginError::InvalidKey)?;

        let mut client = ctx.client.clone();

        let start: StartResponse = client.call(StartRequest { context: None }).await?;

        let signature = signer
            .sign_message_sync(start.message.as_bytes())
            .map_err(|e| LoginError::Signing(e.to_string()))?;

        let verify: VerifyResponse = client
            .call(VerifyRequest {
                context: start.context,
                address: signer.address().to_string(),
                signature: hex::encode(signature.as_bytes()),
            })
            .await?;

        Ok(format!(
            "address: {}\nsession: {}",
            verify.address, verify.session
        ))
    }
}
