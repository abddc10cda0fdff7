//! Controllers: the entry points the request layer calls.
//!
//! Each takes the resolved [`Session`](crate::session::Session) and a
//! validated command, checks the caller's tier, then runs password
//! derivation and store calls on blocking workers, bounded by the request
//! timeout. Errors from the layers below are returned unchanged.

pub mod org;
pub mod user;
