//! Cryptographic primitives for Sealdrop
//!
//! This module provides the cryptographic foundation for Sealdrop's security model:
//!
//! - **Content Encryption**: AES-256-GCM for file encryption with per-file secrets
//! - **Key Wrapping**: passphrase-derived wrapping keys (PBKDF2) for at-rest
//!   protection of content keys
//! - **Key Material**: the two shapes a file record may carry (wrapped or raw)
//!
//! # Security Model
//!
//! ## Content Encryption
//! Every uploaded file is encrypted in the client with its own AES-256-GCM
//! `ContentSecret` and a random 96-bit IV. The IV is stored beside the file
//! record, never inside the ciphertext, so the blob store holds nothing but
//! opaque bytes.
//!
//! ## Key Wrapping Protocol
//! To publish a file without the server ever learning the key:
//! 1. Generate a fresh `ContentSecret` and IV, encrypt the file locally
//! 2. Generate a random 16-byte salt and a random 96-bit wrap IV
//! 3. Derive a wrapping key from the uploader's passphrase with
//!    PBKDF2-HMAC-SHA256 at a fixed work factor
//! 4. Encrypt (wrap) the exported content key under the wrapping key
//! 5. Hand the server only: ciphertext, IV, salt, wrap IV, wrapped key
//!
//! A redeemer re-derives the wrapping key from the same passphrase, unwraps
//! the content key, and decrypts locally. The passphrase, the derived key,
//! and the unwrapped content key never leave the client.
//!
//! All of this code runs in the untrusted client (the CLI here); the server
//! only ever validates shapes and sizes.

mod key_material;
mod passphrase;
mod secret;

pub use key_material::{KeyMaterial, KeyMaterialError, KeyMaterialWire, WRAPPED_KEY_SIZE};
pub use passphrase::{derive_wrapping_key, unwrap_key, wrap_key, Salt, PBKDF2_ITERATIONS, SALT_SIZE};
pub use secret::{ContentSecret, Iv, SecretError, IV_SIZE, SECRET_SIZE};
