//! Argon2id password derivation.
//!
//! Derived passwords are PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`),
//! so verification needs nothing but the stored string. Derivation is
//! deliberately slow; callers run it on a blocking worker.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::{CryptoError, Result};

/// Default memory cost in KiB (19 MiB).
pub const DEFAULT_M_COST: u32 = 19_456;
/// Default iteration count.
pub const DEFAULT_T_COST: u32 = 2;
/// Default parallelism lanes.
pub const DEFAULT_P_COST: u32 = 1;

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Iterations.
    pub t_cost: u32,
    /// Parallelism.
    pub p_cost: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            m_cost: DEFAULT_M_COST,
            t_cost: DEFAULT_T_COST,
            p_cost: DEFAULT_P_COST,
        }
    }
}

impl PasswordParams {
    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, None)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Derive an encoded Argon2id hash of `cleartext` with a fresh random salt.
pub fn derive(cleartext: &str, params: &PasswordParams) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .hasher()?
        .hash_password(cleartext.as_bytes(), &salt)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    Ok(hash.to_string())
}

/// Check `candidate` against an encoded hash produced by [`derive`].
///
/// Returns `Ok(false)` on mismatch; errors only when `encoded` is malformed.
pub fn verify(candidate: &str, encoded: &str) -> Result<bool> {
    let parsed = PasswordHash::new(encoded)
        .map_err(|e| CryptoError::Argon2(format!("invalid hash format: {e}")))?;

    // Params and salt come from the encoded string, not from this instance.
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::Argon2(format!("verify error: {e}"))),
    }
}
