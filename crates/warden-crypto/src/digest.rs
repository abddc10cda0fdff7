//! SHA-256 digests.
//!
//! Every encrypted column is stored next to the digest of its plaintext. The
//! digest authenticates the decrypted value and doubles as an exact-match
//! lookup key (e.g. email uniqueness per org).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hex-encoded SHA-256 of `plaintext`.
pub fn sha256_hex(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Constant-time comparison of two hex digests.
pub fn digest_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
