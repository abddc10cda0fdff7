//! warden-admin: tenancy administration for the Warden identity core.
//!
//! Owns the process state ([`AppState`]), turns a caller id into a
//! [`session::Session`], issues and validates bearer tokens, and exposes
//! the org and user controllers. Transport is left to the embedding
//! service; header names live next to the code that reads them.

pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod state;
pub mod token;

pub use error::{AdminError, Result};
pub use state::{AppState, RootCredentials};
