//! # anchorage-build
//!
//! Capability contracts consumed by the resolution pipeline: a [`Builder`]
//! turns a reference into a content-addressed artifact, a [`Publisher`]
//! turns an artifact into a digest-pinned destination name.
//!
//! The pipeline depends only on the traits; concrete backends are injected
//! by the caller. This crate ships two local collaborators
//! ([`HashBuilder`], [`NamingPublisher`]) and deterministic doubles for
//! tests ([`fixed`]).

pub mod artifact;
pub mod builder;
pub mod fixed;
pub mod publisher;

pub use artifact::{Artifact, DigestArtifact, PublishedRef, destination_name};
pub use builder::{Builder, HashBuilder};
pub use publisher::{NamingPublisher, Publisher};
