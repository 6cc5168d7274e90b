//! Nonce-bound login messages and signature recovery
//!
//! The login message format is a wire contract: the signer must reproduce it
//! byte-for-byte, so it is a fixed literal prefix followed by the nonce and
//! nothing else.

use alloy_primitives::Signature;
use uuid::Uuid;

use super::address::{Address, IdentityError};

/// Literal prefix of the login message
pub const LOGIN_MESSAGE_PREFIX: &str = "Sign this nonce to login: ";

/// Generate a fresh random nonce for a login challenge
pub fn new_nonce() -> String {
    Uuid::new_v4().to_string()
}

/// Build the exact message a wallet must sign for the given nonce
pub fn login_message(nonce: &str) -> String {
    format!("{}{}", LOGIN_MESSAGE_PREFIX, nonce)
}

/// Recover the signer's address from a signature over a message
///
/// The signature is a 65-byte `r || s || v` hex string (with or without a
/// "0x" prefix), produced by an EIP-191 personal-message signature over the
/// message bytes.
///
/// # Errors
///
/// Returns [`IdentityError::InvalidSignature`] on malformed hex, a wrong
/// length, or failed point recovery. Callers compare the result against a
/// claimed address; that comparison is theirs, not this function's.
pub fn recover_signer(message: &str, signature: &str) -> Result<Address, IdentityError> {
    let raw = signature.strip_prefix("0x").unwrap_or(signature);
    let bytes = hex::decode(raw).map_err(|_| IdentityError::InvalidSignature)?;

    let signature =
        Signature::try_from(bytes.as_slice()).map_err(|_| IdentityError::InvalidSignature)?;

    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|_| IdentityError::InvalidSignature)?;

    Ok(recovered.into())
}

#[cfg(test)]
mod test {
    use super::*;

    use alloy_signer::SignerSync;
    use alloy_signer_local::PrivateKeySigner;

    #[test]
    fn test_message_format_is_fixed() {
        assert_eq!(
            login_message("abc123"),
            "Sign this nonce to login: abc123"
        );
    }

    #[test]
    fn test_nonces_are_unique() {
        assert_ne!(new_nonce(), new_nonce());
    }

    #[test]
    fn test_recover_round_trip() {
        let signer = PrivateKeySigner::random();
        let message = login_message(&new_nonce());

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let signature_hex = hex::encode(signature.as_bytes());

        let recovered = recover_signer(&message, &signature_hex).unwrap();
        assert_eq!(recovered, signer.address().into());
    }

    #[test]
    fn test_recover_accepts_0x_prefix() {
        let signer = PrivateKeySigner::random();
        let message = login_message("prefix-check");

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let signature_hex = format!("0x{}", hex::encode(signature.as_bytes()));

        let recovered = recover_signer(&message, &signature_hex).unwrap();
        assert_eq!(recovered, signer.address().into());
    }

    #[test]
    fn test_wrong_message_recovers_different_address() {
        let signer = PrivateKeySigner::random();
        let message = login_message("nonce-one");

        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        let signature_hex = hex::encode(signature.as_bytes());

        // Recovery over different bytes yields some address, just not ours
        let recovered = recover_signer(&login_message("nonce-two"), &signature_hex).unwrap();
        assert_ne!(recovered, signer.address().into());
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let message = login_message("whatever");
        assert!(recover_signer(&message, "zz").is_err());
        assert!(recover_signer(&message, "0x1234").is_err());
        assert!(recover_signer(&message, "").is_err());
    }
}
