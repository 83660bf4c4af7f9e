//! Build artifacts and published destination names.

use std::fmt;

use anchorage_common::types::{Digest, Reference};

/// Opaque result of building one reference.
///
/// The pipeline only ever asks an artifact for its content digest; anything
/// else (layers, payload bytes, local paths) is private to the backend that
/// produced it.
pub trait Artifact: Send + Sync {
    /// Returns the content digest of the built artifact.
    fn digest(&self) -> &Digest;
}

/// Minimal artifact carrying nothing but its digest.
#[derive(Debug, Clone)]
pub struct DigestArtifact {
    digest: Digest,
}

impl DigestArtifact {
    /// Creates an artifact from a precomputed digest.
    #[must_use]
    pub const fn new(digest: Digest) -> Self {
        Self { digest }
    }
}

impl Artifact for DigestArtifact {
    fn digest(&self) -> &Digest {
        &self.digest
    }
}

/// Digest-qualified destination name produced by a publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRef {
    name: String,
    reference: Reference,
}

impl PublishedRef {
    /// Creates a published reference from its destination name and the
    /// reference it originated from.
    #[must_use]
    pub const fn new(name: String, reference: Reference) -> Self {
        Self { name, reference }
    }

    /// Returns the registry-qualified, digest-pinned name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the reference this artifact originated from.
    #[must_use]
    pub const fn reference(&self) -> &Reference {
        &self.reference
    }
}

impl fmt::Display for PublishedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Formats the destination name for an import path under a repository base.
///
/// The import path is lowercased (registry repository components must be
/// lowercase) and the digest is appended in `@sha256:<hex>` form. The
/// result is deterministic given (repository base, import path, digest).
#[must_use]
pub fn destination_name(repo: &str, import_path: &str, digest: &Digest) -> String {
    format!(
        "{}/{}@{digest}",
        repo.trim_end_matches('/'),
        import_path.to_lowercase()
    )
}
