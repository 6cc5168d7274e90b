//! Content encryption using AES-256-GCM
//!
//! Each uploaded file is encrypted with its own `ContentSecret` and a random
//! `Iv`. The IV is carried in the file record rather than prepended to the
//! ciphertext, so the stored blob is exactly `ciphertext || auth tag` and its
//! digest depends only on the encrypted payload.

use std::ops::Deref;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of an AES-GCM IV in bytes (96 bits)
pub const IV_SIZE: usize = 12;
/// Size of a content encryption key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("secret error: {0}")]
    Default(#[from] anyhow::Error),
    /// Deliberately generic: a wrong key, a wrong passphrase, and a tampered
    /// ciphertext are indistinguishable behind the AEAD integrity check, and
    /// callers must not be able to tell them apart.
    #[error("decryption failed")]
    DecryptionFailed,
}

/// A 96-bit initialization vector for AES-GCM
///
/// Fresh for every encryption operation; stored beside the file record (for
/// content encryption) or the wrapped key (for key wrapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iv([u8; IV_SIZE]);

impl Deref for Iv {
    type Target = [u8; IV_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; IV_SIZE]> for Iv {
    fn from(bytes: [u8; IV_SIZE]) -> Self {
        Iv(bytes)
    }
}

impl Iv {
    /// Generate a random IV using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; IV_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create an IV from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `IV_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != IV_SIZE {
            return Err(anyhow::anyhow!(
                "invalid IV size, expected {}, got {}",
                IV_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; IV_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the IV bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// A 256-bit symmetric key for content encryption
///
/// Each file gets a fresh `ContentSecret`. Wrapping keys derived from a
/// passphrase reuse this type since they drive the same cipher.
///
/// The ciphertext layout is `encrypted(plaintext) || auth_tag (16 bytes)`,
/// with the IV held externally.
///
/// # Examples
///
/// ```ignore
/// let secret = ContentSecret::generate();
/// let iv = Iv::generate();
///
/// let ciphertext = secret.encrypt(&iv, b"sensitive data")?;
/// let recovered = secret.decrypt(&iv, &ciphertext)?;
/// assert_eq!(&recovered, b"sensitive data");
/// ```
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ContentSecret([u8; SECRET_SIZE]);

impl Deref for ContentSecret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for ContentSecret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        ContentSecret(bytes)
    }
}

impl ContentSecret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(anyhow::anyhow!(
                "invalid secret size, expected {}, got {}",
                SECRET_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Export the raw key bytes
    pub fn to_bytes(&self) -> [u8; SECRET_SIZE] {
        self.0
    }

    /// Encrypt data under this key with the given IV
    ///
    /// The output is `ciphertext || auth_tag (16 bytes)`. The IV is not
    /// embedded; the caller is responsible for carrying it.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails (should be rare, only on cipher
    /// initialization failure).
    pub fn encrypt(&self, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let key = Key::<Aes256Gcm>::from_slice(self.bytes());
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(iv.bytes());

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        Ok(ciphertext)
    }

    /// Decrypt data under this key with the given IV
    ///
    /// Expects input in the format produced by [`encrypt`](Self::encrypt):
    /// `ciphertext || auth_tag (16 bytes)`.
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::DecryptionFailed`] whenever the authentication
    /// tag does not verify. The wrong key and tampered data are intentionally
    /// not distinguished.
    pub fn decrypt(&self, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, SecretError> {
        let key = Key::<Aes256Gcm>::from_slice(self.bytes());
        let cipher = Aes256Gcm::new(key);
        let nonce = Nonce::from_slice(iv.bytes());

        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SecretError::DecryptionFailed)
    }
}
