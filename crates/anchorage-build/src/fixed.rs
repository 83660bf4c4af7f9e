//! Deterministic builder/publisher doubles backed by preset digests.
//!
//! Used by the pipeline tests: results are fixed up front, invocations are
//! counted so exactly-once-build and concurrency-bound properties can be
//! asserted, and an optional delay forces builds to overlap.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anchorage_common::error::BoxError;
use anchorage_common::types::{Digest, Reference};

use crate::artifact::{Artifact, DigestArtifact, PublishedRef, destination_name};
use crate::builder::Builder;
use crate::publisher::Publisher;

/// Builder returning preset digests and counting its invocations.
#[derive(Debug)]
pub struct FixedBuilder {
    digests: HashMap<String, Digest>,
    delay: Option<Duration>,
    builds: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FixedBuilder {
    /// Creates a builder serving the given reference → digest table.
    #[must_use]
    pub fn new(digests: HashMap<String, Digest>) -> Self {
        Self {
            digests,
            delay: None,
            builds: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Makes every build sleep for `delay`, forcing concurrent overlap.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns how many times `reference` was built.
    #[must_use]
    pub fn build_count(&self, reference: &str) -> usize {
        self.builds
            .lock()
            .map(|builds| builds.get(reference).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Returns the highest number of builds observed in flight at once.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Builder for FixedBuilder {
    async fn build(&self, reference: &Reference) -> Result<Box<dyn Artifact>, BoxError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Ok(mut builds) = self.builds.lock() {
            *builds.entry(reference.as_str().to_string()).or_insert(0) += 1;
        }
        let _ = self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.digests.get(reference.as_str()).map_or_else(
            || Err(format!("no fixed artifact for {reference}").into()),
            |digest| {
                Ok(Box::new(DigestArtifact::new(digest.clone())) as Box<dyn Artifact>)
            },
        )
    }
}

/// Publisher naming artifacts under a fixed repository base.
#[derive(Debug)]
pub struct FixedPublisher {
    repo: String,
    fail_close: bool,
    closed: AtomicBool,
}

impl FixedPublisher {
    /// Creates a publisher naming artifacts under `repo`.
    #[must_use]
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            fail_close: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Makes [`Publisher::close`] fail, for finalization-error tests.
    #[must_use]
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Returns whether [`Publisher::close`] has been called.
    #[must_use]
    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Publisher for FixedPublisher {
    async fn publish(
        &self,
        artifact: &dyn Artifact,
        reference: &Reference,
    ) -> Result<PublishedRef, BoxError> {
        let name = destination_name(&self.repo, reference.import_path(), artifact.digest());
        Ok(PublishedRef::new(name, reference.clone()))
    }

    async fn close(&self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        if self.fail_close {
            return Err("index flush failed".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(s: &str) -> Reference {
        Reference::recognize(s).expect("valid reference")
    }

    fn table() -> HashMap<String, Digest> {
        HashMap::from([("anc://example.com/foo".to_string(), Digest::from_bytes(b"foo"))])
    }

    #[tokio::test]
    async fn fixed_builder_serves_preset_digest() {
        let builder = FixedBuilder::new(table());
        let artifact = builder
            .build(&reference("anc://example.com/foo"))
            .await
            .expect("build failed");
        assert_eq!(artifact.digest(), &Digest::from_bytes(b"foo"));
    }

    #[tokio::test]
    async fn fixed_builder_counts_invocations() {
        let builder = FixedBuilder::new(table());
        let r = reference("anc://example.com/foo");
        let _ = builder.build(&r).await.expect("build failed");
        let _ = builder.build(&r).await.expect("build failed");
        assert_eq!(builder.build_count("anc://example.com/foo"), 2);
    }

    #[tokio::test]
    async fn fixed_builder_fails_for_unknown_reference() {
        let builder = FixedBuilder::new(table());
        assert!(builder.build(&reference("anc://unknown")).await.is_err());
    }

    #[tokio::test]
    async fn fixed_publisher_failing_close_errors() {
        let publisher = FixedPublisher::new("gcr.io/base").failing_close();
        assert!(publisher.close().await.is_err());
        assert!(publisher.was_closed());
    }
}
