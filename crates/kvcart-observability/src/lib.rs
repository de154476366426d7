//! Observability infrastructure for kvcart services.
//!
//! This crate provides:
//! - `LogConfig` - Level and output format for structured logs
//! - `init` - Installs the global `tracing` subscriber

mod logging;

pub use logging::*;
