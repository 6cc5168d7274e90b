//! Signed session credentials
//!
//! A session is an HS256-signed claim set `{address, iat, exp}`. Resolution
//! is pure verification: no server-side session store exists, so validity is
//! fully determined by the signature and the expiry. The accepted trade-off
//! is that only secret rotation revokes sessions before they expire.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use common::identity::Address;

/// Errors that can occur resolving a session credential
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session expired")]
    Expired,
    #[error("invalid session")]
    Invalid,
    #[error("session signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    address: String,
    iat: u64,
    exp: u64,
}

/// Mints and resolves session credentials
///
/// Holds the signing secret as an explicitly constructed value so every
/// test (and every deployment) gets its own; there is no process-global
/// secret anywhere.
#[derive(Clone)]
pub struct Sessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl Sessions {
    pub fn new(secret: &[u8], ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_minutes,
        }
    }

    /// Mint a credential for a verified identity.
    pub fn mint(&self, address: &Address) -> Result<String, SessionError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let exp = now + self.ttl_minutes * 60;
        let claims = Claims {
            address: address.canonical(),
            iat: now.max(0) as u64,
            exp: exp.max(0) as u64,
        };

        encode(&Header::default(), &claims, &self.encoding).map_err(SessionError::Signing)
    }

    /// Resolve a credential back to its identity.
    ///
    /// # Errors
    ///
    /// [`SessionError::Expired`] when `exp` has passed;
    /// [`SessionError::Invalid`] on a bad signature, a malformed payload,
    /// or a claim set whose address does not parse.
    pub fn resolve(&self, credential: &str) -> Result<Address, SessionError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let data =
            decode::<Claims>(credential, &self.decoding, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                    _ => SessionError::Invalid,
                }
            })?;

        Address::from_hex(&data.claims.address).map_err(|_| SessionError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::from_hex("0xd8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap()
    }

    #[test]
    fn test_mint_resolve_round_trip() {
        let sessions = Sessions::new(b"test-secret", 60);
        let credential = sessions.mint(&address()).unwrap();

        let resolved = sessions.resolve(&credential).unwrap();
        assert_eq!(resolved, address());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let sessions = Sessions::new(b"secret-one", 60);
        let credential = sessions.mint(&address()).unwrap();

        let other = Sessions::new(b"secret-two", 60);
        assert!(matches!(
            other.resolve(&credential),
            Err(SessionError::Invalid)
        ));
    }

    #[test]
    fn test_expired_is_distinct() {
        // already expired at mint time
        let sessions = Sessions::new(b"test-secret", -5);
        let credential = sessions.mint(&address()).unwrap();

        assert!(matches!(
            sessions.resolve(&credential),
            Err(SessionError::Expired)
        ));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let sessions = Sessions::new(b"test-secret", 60);
        assert!(matches!(
            sessions.resolve("not.a.jwt"),
            Err(SessionError::Invalid)
        ));
        assert!(matches!(sessions.resolve(""), Err(SessionError::Invalid)));
    }
}
