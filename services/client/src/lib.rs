//! services/client/src/lib.rs
//!
//! Library surface of the `client` service: adapters for the core ports,
//! configuration, errors, and the session orchestration layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod session;
