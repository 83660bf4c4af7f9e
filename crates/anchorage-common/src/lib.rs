//! # anchorage-common
//!
//! Shared types, error definitions, constants, and the cancellation token
//! used across the entire Anchorage workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the foundational primitives that all other
//! crates build upon.

pub mod cancel;
pub mod constants;
pub mod error;
pub mod types;
