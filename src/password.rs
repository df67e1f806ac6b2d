// SPDX-License-Identifier: AGPL-3.0-or-later

use subtle::ConstantTimeEq;
use thiserror::Error;

/// Errors returned when verifying a password against a stored hash.
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("malformed password hash: {0}")]
    MalformedHash(String),
}

/// Seam towards the password hashing primitive.
///
/// Hashing itself happens on the command side before a `MemberPasswordSet`
/// event reaches this projection; the read side only needs to check a
/// cleartext password against the stored hash during authentication.
pub trait PasswordVerifier: Send + Sync {
    /// Returns whether `password` matches the stored `hash`. Implementations
    /// must not return early on mismatching prefixes.
    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError>;
}

/// Default verifier: hex-encoded blake3 digest of the password, compared in
/// constant time.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Verifier;

impl Blake3Verifier {
    /// Hash a cleartext password into the stored representation.
    pub fn hash(password: &str) -> String {
        hex::encode(blake3::hash(password.as_bytes()).as_bytes())
    }
}

impl PasswordVerifier for Blake3Verifier {
    fn verify(&self, hash: &str, password: &str) -> Result<bool, PasswordError> {
        let stored = hex::decode(hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
        let computed = blake3::hash(password.as_bytes());

        // Constant-time comparison to prevent timing attacks.
        Ok(stored.ct_eq(computed.as_bytes()).unwrap_u8() == 1)
    }
}
