//! Integration tests for the Warden identity core.
//!
//! The library half holds shared fixtures; the flows themselves live under
//! `tests/` and drive the public controller, session and token APIs the way
//! a request layer would.
//!
//! ```sh
//! cargo test -p warden-integration-tests
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use warden_admin::config::{AdminConfig, Secrets, IN_MEMORY};
use warden_admin::{AppState, RootCredentials};

/// Config with cheap password parameters, backed by `database_path`.
pub fn config_at(database_path: &str) -> AdminConfig {
    let mut config = AdminConfig::default();
    config.storage.database_path = database_path.to_string();
    config.security.m_cost = 1024;
    config.security.t_cost = 1;
    config.security.p_cost = 1;
    config
}

pub fn secrets() -> Secrets {
    Secrets::from_passphrases("integration db key", "integration token key").expect("secrets")
}

/// A fresh in-memory store with its root credentials.
pub fn fresh() -> (Arc<AppState>, RootCredentials) {
    let (state, root) = bootstrap(&config_at(IN_MEMORY));
    (state, root.expect("an empty store creates the root org"))
}

/// Bootstrap against an explicit config.
pub fn bootstrap(config: &AdminConfig) -> (Arc<AppState>, Option<RootCredentials>) {
    let (state, root) = AppState::bootstrap(config, secrets()).expect("bootstrap");
    (Arc::new(state), root)
}

/// A database path inside a fresh temp directory.
pub fn temp_db(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("warden-it-{}-{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("temp dir");
    dir.join("warden.db")
}
