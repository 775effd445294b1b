//! Core pipeline logic for Outreach.
//!
//! Defines the capability and repository traits (implemented by
//! outreach-infra) and the pipeline engine that drives a run through its
//! stages, suspending at the approval gate and resuming from a durable
//! checkpoint.

pub mod capability;
pub mod pipeline;
pub mod repository;
