//! Shared error categories.
//!
//! Each pluggable subsystem defines its own leaf error enum; this module only
//! holds the categories that cut across subsystems: driver-init failures and
//! lifecycle failures are both "fatal at the process boundary", so the
//! binary decides whether to exit — library code never calls `process::exit`
//! itself.

use thiserror::Error;

/// A driver's `register()` failed during startup (category 2).
#[derive(Debug, Error)]
#[error("driver '{driver}' failed to register: {source}")]
pub struct DriverInitError {
    pub driver: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// An `Application` phase (`register`/`router`/`when_ready`) failed (category 3).
#[derive(Debug, Error)]
#[error("application '{app}' failed during {phase}: {source}")]
pub struct LifecycleError {
    pub app: String,
    pub phase: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// A capability the backing driver does not support (category 5). Non-fatal:
/// callers must treat this as "feature unavailable", never as a crash.
#[derive(Debug, Error)]
#[error("operation '{op}' is not supported by driver '{driver}'")]
pub struct UnsupportedError {
    pub driver: String,
    pub op: &'static str,
}
