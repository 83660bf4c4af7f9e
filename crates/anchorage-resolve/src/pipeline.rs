//! The resolution pipeline orchestrator.
//!
//! One run moves through six phases: split, filter, scan, concurrent
//! build+publish, rewrite, serialize. Builds are deduplicated by exact
//! reference string and bounded by the configured concurrency limit; the
//! rewrite and serialize phases run single-threaded after every job joins,
//! so output is deterministic regardless of completion order.

use std::collections::HashMap;
use std::sync::Arc;

use anchorage_build::{Builder, PublishedRef, Publisher};
use anchorage_common::cancel::CancelToken;
use anchorage_common::constants::default_concurrent_builds;
use anchorage_common::error::{AnchorageError, Result};
use anchorage_common::types::Reference;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::document::{Document, join_documents, split_documents};
use crate::rewrite::substitute_scalar;
use crate::scan::scan_references;
use crate::selector::Selector;

/// Per-run configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Label selector; `None` keeps every document.
    pub selector: Option<Selector>,
    /// Maximum number of builds in flight at once.
    pub concurrent_builds: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            selector: None,
            concurrent_builds: default_concurrent_builds(),
        }
    }
}

/// Resolves reference scalars in a YAML stream to digest-pinned names.
///
/// The resolver depends only on the [`Builder`] and [`Publisher`]
/// capability traits; concrete backends are injected at construction.
pub struct Resolver {
    builder: Arc<dyn Builder>,
    publisher: Arc<dyn Publisher>,
}

impl Resolver {
    /// Creates a resolver over the given backends.
    #[must_use]
    pub fn new(builder: Arc<dyn Builder>, publisher: Arc<dyn Publisher>) -> Self {
        Self { builder, publisher }
    }

    /// Resolves one input stream.
    ///
    /// On success the output contains exactly the retained documents in
    /// input order, each reference scalar replaced in place and every
    /// other byte unchanged. On failure no output is produced.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the run: parse, build, publish,
    /// rewrite, finalization, or cancellation.
    pub async fn resolve(
        &self,
        input: &str,
        options: &ResolveOptions,
        cancel: &CancelToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(AnchorageError::Cancelled {
                reason: "cancelled before resolution started".into(),
            });
        }

        let documents = split_documents(input)?;
        let total = documents.len();

        let mut retained: Vec<Document> = match &options.selector {
            None => documents,
            Some(selector) => documents
                .into_iter()
                .filter(|document| {
                    let keep = selector.matches(&document.labels());
                    if !keep {
                        tracing::debug!(
                            index = document.index(),
                            selector = %selector,
                            "document filtered out"
                        );
                    }
                    keep
                })
                .collect(),
        };
        tracing::debug!(total, retained = retained.len(), "documents split");

        // Occurrence counts per document, unique references in first-seen
        // order across the whole input.
        let mut per_document: Vec<HashMap<Reference, usize>> = Vec::with_capacity(retained.len());
        let mut unique: Vec<Reference> = Vec::new();
        for document in &retained {
            let mut counts: HashMap<Reference, usize> = HashMap::new();
            for occurrence in scan_references(document.node()) {
                if !unique.contains(&occurrence.reference) {
                    unique.push(occurrence.reference.clone());
                }
                *counts.entry(occurrence.reference).or_insert(0) += 1;
            }
            per_document.push(counts);
        }
        tracing::info!(references = unique.len(), "references discovered");

        let resolved = if unique.is_empty() {
            HashMap::new()
        } else {
            self.build_and_publish(unique, options.concurrent_builds, cancel)
                .await?
        };

        // A cancellation that lands while every job is already in flight
        // produces no job error; the run still must not emit output.
        if cancel.is_cancelled() {
            return Err(AnchorageError::Cancelled {
                reason: "cancelled before output was produced".into(),
            });
        }

        self.publisher
            .close()
            .await
            .map_err(|source| AnchorageError::Finalize { source })?;

        for (document, counts) in retained.iter_mut().zip(&per_document) {
            let mut raw = document.raw().to_string();
            for (reference, expected) in counts {
                let Some(published) = resolved.get(reference) else {
                    // Every scanned reference has a result cell by now.
                    return Err(AnchorageError::Rewrite {
                        reference: reference.to_string(),
                        index: document.index(),
                        message: "no published result for reference".into(),
                    });
                };
                let (rewritten, replaced) = substitute_scalar(&raw, reference.as_str(), published.name());
                if replaced != *expected {
                    return Err(AnchorageError::Rewrite {
                        reference: reference.to_string(),
                        index: document.index(),
                        message: format!(
                            "found {replaced} textual occurrences, expected {expected} \
                             (anchors and aliases make the rewrite ambiguous)"
                        ),
                    });
                }
                raw = rewritten;
            }
            document.set_raw(raw);
        }

        Ok(join_documents(&retained))
    }

    /// Builds and publishes every unique reference exactly once.
    ///
    /// Jobs run under a semaphore with `limit` permits. The first failure
    /// cancels jobs still waiting for a permit; in-flight jobs finish but
    /// their results are discarded along with the run.
    async fn build_and_publish(
        &self,
        references: Vec<Reference>,
        limit: usize,
        cancel: &CancelToken,
    ) -> Result<HashMap<Reference, PublishedRef>> {
        let semaphore = Arc::new(Semaphore::new(limit.max(1)));
        let failed = CancelToken::new();
        let mut jobs: JoinSet<Result<(Reference, PublishedRef)>> = JoinSet::new();

        for reference in references {
            let builder = Arc::clone(&self.builder);
            let publisher = Arc::clone(&self.publisher);
            let semaphore = Arc::clone(&semaphore);
            let caller = cancel.clone();
            let failed = failed.clone();

            let _abort_handle = jobs.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    () = caller.cancelled() => {
                        return Err(AnchorageError::Cancelled {
                            reason: format!("cancelled before building {reference}"),
                        });
                    }
                    () = failed.cancelled() => {
                        return Err(AnchorageError::Cancelled {
                            reason: format!("aborted before building {reference}"),
                        });
                    }
                    permit = semaphore.acquire_owned() => {
                        permit.map_err(|_| AnchorageError::Cancelled {
                            reason: "worker pool closed".into(),
                        })?
                    }
                };

                tracing::debug!(reference = %reference, "build started");
                let artifact = builder.build(&reference).await.map_err(|source| {
                    AnchorageError::Build {
                        reference: reference.to_string(),
                        source,
                    }
                })?;
                let published = publisher
                    .publish(artifact.as_ref(), &reference)
                    .await
                    .map_err(|source| AnchorageError::Publish {
                        reference: reference.to_string(),
                        source,
                    })?;
                tracing::info!(reference = %reference, destination = %published.name(), "resolved");

                drop(permit);
                Ok((reference, published))
            });
        }

        let mut results = HashMap::new();
        let mut first_error: Option<AnchorageError> = None;
        while let Some(joined) = jobs.join_next().await {
            let outcome = joined.unwrap_or_else(|join_error| {
                Err(AnchorageError::Worker {
                    source: Box::new(join_error),
                })
            });
            match outcome {
                Ok((reference, published)) => {
                    // Each cell is written exactly once; duplicates were
                    // deduplicated before submission.
                    let _ = results.insert(reference, published);
                }
                Err(error) => {
                    failed.cancel();
                    record_error(&mut first_error, error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }
}

/// Keeps the most diagnostic error: a real build/publish failure beats the
/// cancellation errors reported by siblings aborted while waiting.
fn record_error(cell: &mut Option<AnchorageError>, error: AnchorageError) {
    let replace = match cell.as_ref() {
        None => true,
        Some(held) => held.is_cancellation() && !error.is_cancellation(),
    };
    if replace {
        *cell = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_error_keeps_first() {
        let mut cell = None;
        record_error(
            &mut cell,
            AnchorageError::Build {
                reference: "anc://a".into(),
                source: "boom".into(),
            },
        );
        record_error(
            &mut cell,
            AnchorageError::Build {
                reference: "anc://b".into(),
                source: "boom".into(),
            },
        );
        assert!(matches!(cell, Some(AnchorageError::Build { reference, .. }) if reference == "anc://a"));
    }

    #[test]
    fn record_error_prefers_real_failure_over_cancellation() {
        let mut cell = Some(AnchorageError::Cancelled {
            reason: "aborted".into(),
        });
        record_error(
            &mut cell,
            AnchorageError::Build {
                reference: "anc://a".into(),
                source: "boom".into(),
            },
        );
        assert!(matches!(cell, Some(AnchorageError::Build { .. })));
    }

    #[test]
    fn record_error_keeps_failure_over_later_cancellation() {
        let mut cell = Some(AnchorageError::Build {
            reference: "anc://a".into(),
            source: "boom".into(),
        });
        record_error(
            &mut cell,
            AnchorageError::Cancelled {
                reason: "aborted".into(),
            },
        );
        assert!(matches!(cell, Some(AnchorageError::Build { .. })));
    }

    #[test]
    fn default_options_keep_everything() {
        let options = ResolveOptions::default();
        assert!(options.selector.is_none());
        assert!(options.concurrent_builds >= 1);
    }
}
