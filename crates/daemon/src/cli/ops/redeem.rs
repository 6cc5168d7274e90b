use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Args;

use common::crypto::{unwrap_key, Iv, KeyMaterial, KeyMaterialError, SecretError};

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::tokens::validate::{ValidateRequest, ValidateResponse};

/// Redeem an access token: validate, fetch ciphertext, decrypt locally.
///
/// The passphrase and every derived key stay in this process. A failed
/// decrypt is reported once and not retried; wrong passphrase and damaged
/// ciphertext are indistinguishable on purpose.
#[derive(Args, Debug, Clone)]
pub struct Redeem {
    /// The access token to redeem
    #[arg(long)]
    pub token: String,

    /// Passphrase to unwrap the content key (wrapped-mode records)
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Where to write the decrypted file
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("this file needs a passphrase to decrypt")]
    MissingPassphrase,
    #[error("malformed redemption payload: {0}")]
    Malformed(String),
    #[error("invalid key material: {0}")]
    KeyMaterial(#[from] KeyMaterialError),
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("fetch failed: {0}")]
    Failed(String),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

impl From<SecretError> for RedeemError {
    fn from(_: SecretError) -> Self {
        // conflate every crypto failure; callers learn nothing more
        RedeemError::DecryptionFailed
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Redeem {
    type Error = RedeemError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // 1. validate the token, collect the redemption payload
        let mut client = ctx.client.clone();
        let validation: ValidateResponse = client
            .call(ValidateRequest {
                token: self.token.clone(),
            })
            .await?;

        // 2. fetch the ciphertext (only knowable after validation)
        let fetch_url = ctx
            .client
            .base_url()
            .join(&format!("/api/v0/storage/{}", validation.cid))
            .expect("valid storage URL");
        let response = ctx
            .client
            .http_client()
            .get(fetch_url)
            .send()
            .await
            .map_err(|e| RedeemError::Failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(RedeemError::Failed(format!(
                "content fetch returned {}",
                response.status()
            )));
        }
        let ciphertext = response
            .bytes()
            .await
            .map_err(|e| RedeemError::Failed(e.to_string()))?;

        // 3. recover the content key
        let iv_bytes = BASE64
            .decode(&validation.iv)
            .map_err(|e| RedeemError::Malformed(e.to_string()))?;
        let iv = Iv::from_slice(&iv_bytes).map_err(|e| RedeemError::Malformed(e.to_string()))?;

        let secret = match validation.key_material.decode()? {
            KeyMaterial::Raw { key } => key,
            KeyMaterial::Wrapped {
                salt,
                wrap_iv,
                wrapped_key,
            } => {
                let passphrase = self
                    .passphrase
                    .as_deref()
                    .ok_or(RedeemError::MissingPassphrase)?;
                unwrap_key(&wrapped_key, passphrase, &salt, &wrap_iv)?
            }
        };

        // 4. decrypt locally and write out
        let plaintext = secret.decrypt(&iv, &ciphertext)?;
        tokio::fs::write(&self.out, &plaintext).await?;

        Ok(format!(
            "wrote {} bytes ({}) to {}",
            plaintext.len(),
            validation.name,
            self.out.display()
        ))
    }
}
