//! # anchorage-resolve
//!
//! The core resolution pipeline. Given a multi-document YAML stream, it
//! splits the stream into documents, filters them by label selector,
//! discovers `anc://` reference scalars, builds and publishes each unique
//! reference exactly once under a bounded-concurrency pool, rewrites every
//! occurrence to its digest-pinned destination name, and reassembles the
//! retained documents with their original formatting intact.

pub mod document;
pub mod pipeline;
pub mod scan;
pub mod selector;

mod rewrite;

pub use document::{Document, split_documents};
pub use pipeline::{ResolveOptions, Resolver};
pub use scan::{Occurrence, scan_references};
pub use selector::Selector;
