//! Wallet-based identity
//!
//! The system's sole principal type is an Ethereum-style address recovered
//! from a secp256k1 signature over a nonce-bound login message. There are no
//! passwords and no stored credentials: proving control of the signing key
//! at login time is the whole of authentication.
//!
//! # Login Protocol
//!
//! 1. The server issues a random single-use nonce and the fixed-format
//!    message embedding it
//! 2. The wallet signs the message bytes (EIP-191 personal message)
//! 3. The server recovers the signer's address from the signature and
//!    compares it to the claimed address, case-insensitively
//!
//! Address comparison happens on parsed 20-byte values, so mixed-case and
//! lowercase presentations of the same address always match.

mod address;
mod challenge;

pub use address::{Address, IdentityError};
pub use challenge::{login_message, new_nonce, recover_signer, LOGIN_MESSAGE_PREFIX};
