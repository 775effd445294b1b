//! Pipeline engine core: stage execution, routing, approval, and durable
//! checkpointing.
//!
//! This module contains the "brain" of the outreach pipeline:
//! - `stage` -- per-stage execution against a capability provider
//! - `router` -- the fixed stage chain and the approval branch
//! - `approval` -- resume token interpretation (default reject)
//! - `checkpoint` -- durable checkpoint manager over the run repository
//! - `engine` -- the run driver: start, suspend, resume, terminate

pub mod approval;
pub mod checkpoint;
pub mod engine;
pub mod router;
pub mod stage;
