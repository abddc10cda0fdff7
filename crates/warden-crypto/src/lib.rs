//! # warden-crypto
//!
//! Cryptographic primitives for the Warden administration core.
//!
//! The suite is fixed: there is no algorithm negotiation and no per-row
//! algorithm tag.
//!
//! ## Modules
//!
//! - [`digest`] - SHA-256 hex digests (integrity checks and searchable proxies)
//! - [`aead`] - ChaCha20-Poly1305 field encryption with digest verification
//! - [`password`] - Argon2id password derivation and verification

pub mod aead;
pub mod digest;
pub mod password;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// AEAD encryption or decryption failed (authentication tag mismatch).
    #[error("AEAD operation failed")]
    Aead,

    /// Decryption succeeded but the plaintext does not match its stored digest.
    #[error("digest mismatch after decryption")]
    DigestMismatch,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Hex decoding failed.
    #[error("hex decoding failed: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Argon2id hashing failed, or an encoded hash is malformed.
    #[error("argon2id error: {0}")]
    Argon2(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
