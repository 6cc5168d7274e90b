//! The two key material shapes a file record may carry
//!
//! A record stores either a passphrase-wrapped content key (the normal mode)
//! or the raw content key itself (a demo-only trust reduction that servers
//! refuse unless explicitly configured to allow it). The shapes are mutually
//! exclusive and validated exhaustively at the boundary; a record with a
//! partial field set is never written.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::passphrase::Salt;
use super::secret::{ContentSecret, Iv, SECRET_SIZE};

/// Size of a wrapped content key in bytes: the 32-byte key plus the GCM tag
pub const WRAPPED_KEY_SIZE: usize = SECRET_SIZE + 16;

/// Errors produced while validating key material at the boundary
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum KeyMaterialError {
    #[error("invalid {0}")]
    InvalidField(&'static str),
    #[error("missing key material")]
    Missing,
    #[error("incomplete wrapped key material: missing {0}")]
    PartialWrapped(&'static str),
    #[error("conflicting key material: both wrapped and raw fields present")]
    ConflictingModes,
}

/// Key material associated with a file record
///
/// Exactly one variant holds for any record. Servers persist the fields of
/// whichever variant is present and reconstruct the variant on read; the
/// reconstruction re-validates, so a corrupted row surfaces as an error
/// instead of a half-shaped record.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyMaterial {
    /// Content key wrapped under a passphrase-derived key
    Wrapped {
        salt: Salt,
        wrap_iv: Iv,
        wrapped_key: Vec<u8>,
    },
    /// Raw content key stored server-side in the clear (demo-only, gated)
    Raw { key: ContentSecret },
}

impl KeyMaterial {
    /// Assemble key material from optional decoded parts
    ///
    /// This is the single write-time validator for the union: exactly one
    /// complete field set must be present and every field must have its
    /// exact documented size.
    ///
    /// # Errors
    ///
    /// - [`KeyMaterialError::Missing`] when neither mode is present
    /// - [`KeyMaterialError::PartialWrapped`] when only some wrapped-mode
    ///   fields are present
    /// - [`KeyMaterialError::ConflictingModes`] when both modes are present
    /// - [`KeyMaterialError::InvalidField`] on a wrong-sized field
    pub fn from_parts(
        salt: Option<Vec<u8>>,
        wrap_iv: Option<Vec<u8>>,
        wrapped_key: Option<Vec<u8>>,
        raw_key: Option<Vec<u8>>,
    ) -> Result<Self, KeyMaterialError> {
        let any_wrapped = salt.is_some() || wrap_iv.is_some() || wrapped_key.is_some();

        if any_wrapped && raw_key.is_some() {
            return Err(KeyMaterialError::ConflictingModes);
        }

        if any_wrapped {
            let salt = salt.ok_or(KeyMaterialError::PartialWrapped("salt"))?;
            let wrap_iv = wrap_iv.ok_or(KeyMaterialError::PartialWrapped("wrap_iv"))?;
            let wrapped_key = wrapped_key.ok_or(KeyMaterialError::PartialWrapped("wrapped_key"))?;

            let salt =
                Salt::from_slice(&salt).map_err(|_| KeyMaterialError::InvalidField("salt"))?;
            let wrap_iv =
                Iv::from_slice(&wrap_iv).map_err(|_| KeyMaterialError::InvalidField("wrap_iv"))?;
            if wrapped_key.len() != WRAPPED_KEY_SIZE {
                return Err(KeyMaterialError::InvalidField("wrapped_key"));
            }

            return Ok(KeyMaterial::Wrapped {
                salt,
                wrap_iv,
                wrapped_key,
            });
        }

        match raw_key {
            Some(raw) => {
                let key = ContentSecret::from_slice(&raw)
                    .map_err(|_| KeyMaterialError::InvalidField("raw_key"))?;
                Ok(KeyMaterial::Raw { key })
            }
            None => Err(KeyMaterialError::Missing),
        }
    }

    /// Whether this is the raw (demo-only) mode
    pub fn is_raw(&self) -> bool {
        matches!(self, KeyMaterial::Raw { .. })
    }

    pub fn salt(&self) -> Option<&Salt> {
        match self {
            KeyMaterial::Wrapped { salt, .. } => Some(salt),
            KeyMaterial::Raw { .. } => None,
        }
    }

    pub fn wrap_iv(&self) -> Option<&Iv> {
        match self {
            KeyMaterial::Wrapped { wrap_iv, .. } => Some(wrap_iv),
            KeyMaterial::Raw { .. } => None,
        }
    }

    pub fn wrapped_key(&self) -> Option<&[u8]> {
        match self {
            KeyMaterial::Wrapped { wrapped_key, .. } => Some(wrapped_key),
            KeyMaterial::Raw { .. } => None,
        }
    }

    pub fn raw_key(&self) -> Option<&ContentSecret> {
        match self {
            KeyMaterial::Wrapped { .. } => None,
            KeyMaterial::Raw { key } => Some(key),
        }
    }
}

/// Base64 wire form of key material, as carried in JSON bodies
///
/// All fields optional; [`decode`](Self::decode) enforces the union rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyMaterialWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_iv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_key: Option<String>,
}

fn decode_field(
    value: &Option<String>,
    field: &'static str,
) -> Result<Option<Vec<u8>>, KeyMaterialError> {
    value
        .as_deref()
        .map(|v| {
            BASE64
                .decode(v)
                .map_err(|_| KeyMaterialError::InvalidField(field))
        })
        .transpose()
}

impl KeyMaterialWire {
    /// Decode and validate into a [`KeyMaterial`]
    ///
    /// # Errors
    ///
    /// Base64 failures surface as [`KeyMaterialError::InvalidField`] naming
    /// the offending field; the union rules are those of
    /// [`KeyMaterial::from_parts`].
    pub fn decode(&self) -> Result<KeyMaterial, KeyMaterialError> {
        KeyMaterial::from_parts(
            decode_field(&self.salt, "salt")?,
            decode_field(&self.wrap_iv, "wrap_iv")?,
            decode_field(&self.wrapped_key, "wrapped_key")?,
            decode_field(&self.raw_key, "raw_key")?,
        )
    }
}

impl From<&KeyMaterial> for KeyMaterialWire {
    fn from(material: &KeyMaterial) -> Self {
        match material {
            KeyMaterial::Wrapped {
                salt,
                wrap_iv,
                wrapped_key,
            } => KeyMaterialWire {
                salt: Some(BASE64.encode(salt.bytes())),
                wrap_iv: Some(BASE64.encode(wrap_iv.bytes())),
                wrapped_key: Some(BASE64.encode(wrapped_key)),
                raw_key: None,
            },
            KeyMaterial::Raw { key } => KeyMaterialWire {
                salt: None,
                wrap_iv: None,
                wrapped_key: None,
                raw_key: Some(BASE64.encode(key.bytes())),
            },
        }
    }
}
