//! Observability for Outreach: tracing subscriber setup and optional
//! OpenTelemetry trace export.

pub mod tracing_setup;
