/**
 * Cryptographic types and operations.
 *  - Content encryption secrets and IVs
 *  - Passphrase-based key wrapping
 *  - The two supported key material shapes
 */
pub mod crypto;
/**
 * Wallet-based identity.
 *  Addresses recovered from signatures over
 *  nonce-bound login messages; no passwords
 *  anywhere in the system.
 */
pub mod identity;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{ContentSecret, Iv, KeyMaterial, Salt, SecretError};
    pub use crate::identity::{login_message, Address, IdentityError};
    pub use crate::version::build_info;
}
