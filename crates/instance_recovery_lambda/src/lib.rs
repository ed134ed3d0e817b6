//! AWS-oriented adapters and the Lambda handler for cross-account instance
//! recovery.
//!
//! This crate owns runtime integration details (the recovery handler, its
//! adapter traits, and log wiring). Event filtering, configuration, and
//! remote-call contracts live in `instance_recovery_core`.

pub mod adapters;
pub mod handlers;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
