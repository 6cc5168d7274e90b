use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use alloy_primitives::Address as WalletAddress;
use serde::{Deserialize, Serialize};

/// Errors that can occur during identity operations
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("invalid signature")]
    InvalidSignature,
}

/// A wallet address, the system's only principal
///
/// A thin wrapper around a 20-byte Ethereum-style address. Equality is over
/// the raw bytes, which makes comparison case-insensitive with respect to
/// the hex presentation; display is EIP-55 checksummed.
///
/// # Examples
///
/// ```ignore
/// let a = Address::from_hex("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")?;
/// let b = Address::from_hex("0xd8da6bf26964af9d7eed9e03e53415d37aa96045")?;
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(WalletAddress);

impl Deref for Address {
    type Target = WalletAddress;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<WalletAddress> for Address {
    fn from(address: WalletAddress) -> Self {
        Address(address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // checksummed, 0x-prefixed
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = IdentityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Address {
    /// Parse an address from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex, in any case. No
    /// checksum validation is performed; presentation case carries no
    /// meaning here.
    pub fn from_hex(hex: &str) -> Result<Self, IdentityError> {
        WalletAddress::from_str(hex)
            .map(Address)
            .map_err(|_| IdentityError::InvalidAddress(hex.to_string()))
    }

    /// The canonical (checksummed) string form, used for storage keys
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}
