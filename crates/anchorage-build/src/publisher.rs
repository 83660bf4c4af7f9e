//! The publisher capability and a local naming implementation.

use std::sync::atomic::{AtomicUsize, Ordering};

use anchorage_common::error::BoxError;
use anchorage_common::types::Reference;

use crate::artifact::{Artifact, PublishedRef, destination_name};

/// Capability: publish a build artifact and name its destination.
///
/// Implementations must be safe for concurrent invocation and idempotent
/// for the same (artifact, reference) pair. [`Publisher::close`] is called
/// exactly once after all publishes of a run are issued.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes one artifact and returns its digest-pinned destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be published.
    async fn publish(
        &self,
        artifact: &dyn Artifact,
        reference: &Reference,
    ) -> Result<PublishedRef, BoxError>;

    /// Flushes any batched state after all publishes of a run complete.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails; the run surfaces it even
    /// though individual publishes already succeeded.
    async fn close(&self) -> Result<(), BoxError>;
}

/// Publisher that only computes destination names.
///
/// Transport to a registry is a concern of external backends; this
/// collaborator produces the deterministic
/// `<repo>/<lowercased-import-path>@sha256:<hex>` name the pipeline needs
/// for rewriting.
#[derive(Debug)]
pub struct NamingPublisher {
    repo: String,
    published: AtomicUsize,
}

impl NamingPublisher {
    /// Creates a publisher naming artifacts under the given repository base.
    #[must_use]
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            published: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Publisher for NamingPublisher {
    async fn publish(
        &self,
        artifact: &dyn Artifact,
        reference: &Reference,
    ) -> Result<PublishedRef, BoxError> {
        let name = destination_name(&self.repo, reference.import_path(), artifact.digest());
        let _ = self.published.fetch_add(1, Ordering::Relaxed);
        tracing::info!(reference = %reference, destination = %name, "published");
        Ok(PublishedRef::new(name, reference.clone()))
    }

    async fn close(&self) -> Result<(), BoxError> {
        tracing::info!(
            count = self.published.load(Ordering::Relaxed),
            repo = %self.repo,
            "publisher closed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anchorage_common::types::Digest;

    use super::*;
    use crate::artifact::DigestArtifact;

    fn reference(s: &str) -> Reference {
        Reference::recognize(s).expect("valid reference")
    }

    #[tokio::test]
    async fn publish_names_under_repo_base() {
        let publisher = NamingPublisher::new("registry.example.com/repository");
        let artifact = DigestArtifact::new(Digest::from_bytes(b"payload"));
        let published = publisher
            .publish(&artifact, &reference("anc://Example.com/App"))
            .await
            .expect("publish failed");
        assert!(
            published
                .name()
                .starts_with("registry.example.com/repository/example.com/app@sha256:")
        );
    }

    #[tokio::test]
    async fn publish_is_idempotent_for_same_pair() {
        let publisher = NamingPublisher::new("gcr.io/base");
        let artifact = DigestArtifact::new(Digest::from_bytes(b"payload"));
        let r = reference("anc://app");
        let first = publisher.publish(&artifact, &r).await.expect("publish failed");
        let second = publisher.publish(&artifact, &r).await.expect("publish failed");
        assert_eq!(first.name(), second.name());
    }

    #[tokio::test]
    async fn close_succeeds() {
        let publisher = NamingPublisher::new("gcr.io/base");
        publisher.close().await.expect("close failed");
    }
}
