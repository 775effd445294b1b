//! Shared domain types for Outreach.
//!
//! This crate contains the core domain types used across the Outreach
//! pipeline: the shared run state, run records, capability data shapes,
//! configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod run;
pub mod state;
