//! REST API handlers.

pub mod run;
