//! Infrastructure layer for Outreach.
//!
//! Contains implementations of the traits defined in `outreach-core`:
//! SQLite run storage and the HTTP/fixture capability backends, plus
//! config file loading.

pub mod capability;
pub mod config;
pub mod sqlite;
