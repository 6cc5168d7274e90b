use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use clap::Args;

use common::crypto::{wrap_key, ContentSecret, Iv, KeyMaterial, KeyMaterialWire, Salt, SecretError};

use sealdrop_daemon::http_server::api::client::ApiError;
use sealdrop_daemon::http_server::api::v0::files::create::{CreateRequest, CreateResponse};
use sealdrop_daemon::http_server::api::v0::storage::upload::UploadResponse;

/// Encrypt a file locally and publish it.
///
/// Everything secret happens in this process: key generation, encryption,
/// and passphrase wrapping. The server receives ciphertext and (in the
/// default mode) a wrapped key it cannot open.
#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// Session credential from `sealdrop login`
    #[arg(long)]
    pub session: String,

    /// File to encrypt and publish
    #[arg(long)]
    pub file: PathBuf,

    /// Display title for the record
    #[arg(long)]
    pub title: Option<String>,

    /// Passphrase to wrap the content key under (required unless --raw)
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Store the raw content key server-side instead of wrapping it.
    /// Demo-only; the server refuses this unless explicitly configured.
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// TTL in minutes for the record's first access token
    #[arg(long)]
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("a passphrase is required unless --raw is set")]
    MissingPassphrase,
    #[error("crypto error: {0}")]
    Crypto(#[from] SecretError),
    #[error("upload failed: {0}")]
    Failed(String),
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Upload {
    type Error = UploadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let data = tokio::fs::read(&self.file).await?;
        let file_name = self
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        let mime = mime_guess::from_path(&self.file)
            .first_or_octet_stream()
            .to_string();

        // fresh key and IV per upload, encryption stays local
        let secret = ContentSecret::generate();
        let iv = Iv::generate();
        let ciphertext = secret.encrypt(&iv, &data)?;

        let key_material = if self.raw {
            KeyMaterial::Raw { key: secret }
        } else {
            let passphrase = self
                .passphrase
                .as_deref()
                .ok_or(UploadError::MissingPassphrase)?;
            let salt = Salt::generate();
            let wrap_iv = Iv::generate();
            let wrapped_key = wrap_key(&secret, passphrase, &salt, &wrap_iv)?;
            KeyMaterial::Wrapped {
                salt,
                wrap_iv,
                wrapped_key,
            }
        };

        // 1. push the ciphertext
        let storage_url = ctx
            .client
            .base_url()
            .join("/api/v0/storage")
            .expect("valid storage URL");
        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(ciphertext)
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")
                    .expect("valid mime"),
            )
            .text("name", file_name.clone());

        let response = ctx
            .client
            .http_client()
            .post(storage_url)
            .bearer_auth(&self.session)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(UploadError::Failed(format!(
                "storage upload returned {}",
                response.status()
            )));
        }
        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::Failed(e.to_string()))?;

        // 2. record the metadata and key material
        let mut client = ctx.client.clone().with_session(self.session.clone());
        let created: CreateResponse = client
            .call(CreateRequest {
                title: self.title.clone(),
                description: None,
                cid: uploaded.cid,
                file_name: Some(file_name),
                mime: Some(mime),
                size_bytes: Some(data.len() as i64),
                iv: BASE64.encode(iv.bytes()),
                key_material: KeyMaterialWire::from(&key_material),
                ttl_minutes: self.ttl_minutes,
            })
            .await?;

        Ok(format!(
            "file_id: {}\ntoken: {}",
            created.file_id, created.token
        ))
    }
}
