//! Passphrase-based key wrapping
//!
//! This module implements the wrapped key-material mode: the content key is
//! encrypted (wrapped) under a key derived from a user passphrase, so the
//! server can store key material without ever being able to use it.
//!
//! # Protocol
//!
//! To wrap a content key:
//! 1. **Generate a salt**: a random 16-byte value, stored with the record
//! 2. **Derive the wrapping key**: PBKDF2-HMAC-SHA256 over the passphrase
//!    with the salt at [`PBKDF2_ITERATIONS`]
//! 3. **Wrap**: AES-256-GCM-encrypt the exported content key under the
//!    wrapping key with a fresh 96-bit wrap IV
//!
//! Unwrapping re-derives the wrapping key from the redeemer's passphrase and
//! decrypts. The work factor is fixed and part of the wire contract: both
//! sides must derive with the same parameters or the unwrap fails.

use std::ops::Deref;

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::secret::{ContentSecret, Iv, SecretError, SECRET_SIZE};

/// Size of the key-derivation salt in bytes
pub const SALT_SIZE: usize = 16;
/// Fixed PBKDF2 work factor
///
/// Changing this breaks every previously wrapped key, so it is a protocol
/// constant rather than configuration.
pub const PBKDF2_ITERATIONS: u32 = 200_000;

/// A 16-byte random salt for passphrase key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salt([u8; SALT_SIZE]);

impl Deref for Salt {
    type Target = [u8; SALT_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SALT_SIZE]> for Salt {
    fn from(bytes: [u8; SALT_SIZE]) -> Self {
        Salt(bytes)
    }
}

impl Salt {
    /// Generate a random salt using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SALT_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a salt from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SALT_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SALT_SIZE {
            return Err(anyhow::anyhow!(
                "invalid salt size, expected {}, got {}",
                SALT_SIZE,
                data.len()
            )
            .into());
        }
        let mut buff = [0; SALT_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the salt bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// Derive a wrapping key from a passphrase and salt
///
/// PBKDF2-HMAC-SHA256 at the fixed work factor, producing a 256-bit AES key.
/// This is CPU-bound on purpose; callers with a UI thread should run it off
/// that thread.
pub fn derive_wrapping_key(passphrase: &str, salt: &Salt) -> ContentSecret {
    let mut key = [0u8; SECRET_SIZE];
    pbkdf2_hmac::<Sha256>(
        passphrase.as_bytes(),
        salt.bytes(),
        PBKDF2_ITERATIONS,
        &mut key,
    );
    key.into()
}

/// Wrap a content key under a passphrase-derived key
///
/// Returns the wrapped key bytes (`encrypted key || auth tag`, 48 bytes).
///
/// # Errors
///
/// Returns an error only on cipher failure; derivation itself cannot fail.
pub fn wrap_key(
    secret: &ContentSecret,
    passphrase: &str,
    salt: &Salt,
    wrap_iv: &Iv,
) -> Result<Vec<u8>, SecretError> {
    let wrapping_key = derive_wrapping_key(passphrase, salt);
    wrapping_key.encrypt(wrap_iv, secret.bytes())
}

/// Unwrap a content key with a passphrase
///
/// # Errors
///
/// Returns [`SecretError::DecryptionFailed`] for a wrong passphrase and for
/// tampered wrapped bytes alike; the two are indistinguishable by design.
pub fn unwrap_key(
    wrapped: &[u8],
    passphrase: &str,
    salt: &Salt,
    wrap_iv: &Iv,
) -> Result<ContentSecret, SecretError> {
    let wrapping_key = derive_wrapping_key(passphrase, salt);
    let raw = wrapping_key.decrypt(wrap_iv, wrapped)?;
    ContentSecret::from_slice(&raw)
}
