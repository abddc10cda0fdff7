//! Error type returned by controllers and session derivation.

use std::time::Duration;

use warden_crypto::CryptoError;
use warden_db::DbError;
use warden_types::commands::CommandError;

use crate::session::AuthError;

/// Inner errors pass through unchanged; only the wrapper is added.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// A blocking worker panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, AdminError>;
