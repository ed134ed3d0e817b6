//! Shared cross-account instance recovery domain primitives.
//!
//! This crate owns event filtering, recovery configuration, credential
//! handling, and the remote-call result contracts. It intentionally excludes
//! AWS SDK and Lambda runtime concerns; those live in
//! `instance_recovery_lambda`.

pub mod config;
pub mod credentials;
pub mod event;
pub mod remote;
