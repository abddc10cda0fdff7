//! ChaCha20-Poly1305 field encryption (RFC 8439).
//!
//! Used for the encrypted user columns (api secret, display name, email).
//! Stored form is `hex(nonce || ciphertext || tag)`. A fresh random nonce is
//! drawn for every call, so encrypting the same plaintext twice yields two
//! different strings.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::digest::{digest_eq, sha256_hex};
use crate::{CryptoError, Result};

/// Nonce size for ChaCha20-Poly1305 (96 bits = 12 bytes).
pub const NONCE_SIZE: usize = 12;

/// Key size for ChaCha20-Poly1305 (256 bits = 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Authentication tag size (128 bits = 16 bytes).
pub const TAG_SIZE: usize = 16;

/// A symmetric key. Zeroized on drop; `Debug` never prints the bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(<redacted>)")
    }
}

/// Derive a key from a passphrase.
///
/// The key is the leading [`KEY_SIZE`] bytes of the passphrase's hex SHA-256
/// digest.
pub fn derive_key(passphrase: &str) -> Result<Key> {
    let digest = sha256_hex(passphrase);
    let bytes = digest.as_bytes().get(..KEY_SIZE).unwrap_or_default();
    Key::from_slice(bytes)
}

/// Encrypt `plaintext`, returning hex-encoded `nonce || ciphertext || tag`.
pub fn encrypt(plaintext: &str, key: &Key) -> Result<String> {
    let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| CryptoError::Aead)?;

    let mut out = Vec::with_capacity(NONCE_SIZE + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(hex::encode(out))
}

/// Decrypt the output of [`encrypt`] and check it against `expected_digest`.
///
/// Fails with [`CryptoError::DigestMismatch`] when authenticated decryption
/// succeeds but the plaintext does not hash to the stored digest.
pub fn decrypt(ciphertext_hex: &str, expected_digest: &str, key: &Key) -> Result<String> {
    let raw = hex::decode(ciphertext_hex)?;
    if raw.len() < NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidInput(format!(
            "ciphertext too short: {} bytes",
            raw.len()
        )));
    }
    let (nonce, sealed) = raw.split_at(NONCE_SIZE);

    let cipher = ChaCha20Poly1305::new(chacha20poly1305::Key::from_slice(key.as_bytes()));
    let opened = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Aead)?;

    let plaintext = String::from_utf8(opened)
        .map_err(|e| CryptoError::InvalidInput(format!("plaintext is not utf-8: {e}")))?;

    if !digest_eq(&sha256_hex(&plaintext), expected_digest) {
        return Err(CryptoError::DigestMismatch);
    }
    Ok(plaintext)
}
