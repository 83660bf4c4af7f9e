//! The builder capability and a local content-hashing implementation.

use std::path::{Path, PathBuf};

use anchorage_common::error::BoxError;
use anchorage_common::types::{Digest, Reference};
use sha2::{Digest as _, Sha256};

use crate::artifact::{Artifact, DigestArtifact};

/// Capability: turn a reference into a build artifact.
///
/// Implementations must be safe for concurrent invocation with distinct
/// references and referentially transparent for a given reference within
/// one run (repeatable digest).
#[async_trait::async_trait]
pub trait Builder: Send + Sync {
    /// Builds the artifact for one reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the importable location cannot be built.
    async fn build(&self, reference: &Reference) -> Result<Box<dyn Artifact>, BoxError>;
}

/// Local builder that content-addresses the importable location on disk.
///
/// The import path is resolved relative to a workspace root; files are
/// hashed directly, directories hash the sorted stream of relative paths
/// and file contents. Actual compilation is a concern of external
/// backends; this collaborator gives the pipeline a deterministic digest
/// without one.
#[derive(Debug, Clone)]
pub struct HashBuilder {
    root: PathBuf,
}

impl HashBuilder {
    /// Creates a builder resolving import paths under the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn digest_path(path: &Path) -> std::io::Result<Digest> {
        if path.is_dir() {
            let mut hasher = Sha256::new();
            Self::digest_dir(path, path, &mut hasher)?;
            Ok(Digest::from_bytes(&hasher.finalize()))
        } else {
            let bytes = std::fs::read(path)?;
            Ok(Digest::from_bytes(&bytes))
        }
    }

    fn digest_dir(root: &Path, dir: &Path, hasher: &mut Sha256) -> std::io::Result<()> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();
        for path in entries {
            if path.is_dir() {
                Self::digest_dir(root, &path, hasher)?;
            } else {
                let relative = path.strip_prefix(root).unwrap_or(&path);
                hasher.update(relative.to_string_lossy().as_bytes());
                hasher.update(std::fs::read(&path)?);
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Builder for HashBuilder {
    async fn build(&self, reference: &Reference) -> Result<Box<dyn Artifact>, BoxError> {
        let target = self.root.join(reference.import_path());
        tracing::debug!(reference = %reference, path = %target.display(), "hashing build input");

        let digest = tokio::task::spawn_blocking(move || Self::digest_path(&target))
            .await
            .map_err(BoxError::from)??;

        tracing::info!(reference = %reference, digest = %digest, "build complete");
        Ok(Box::new(DigestArtifact::new(digest)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(s: &str) -> Reference {
        Reference::recognize(s).expect("valid reference")
    }

    #[tokio::test]
    async fn build_hashes_file_contents() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        std::fs::write(dir.path().join("app"), b"binary bits").expect("write failed");

        let builder = HashBuilder::new(dir.path());
        let artifact = builder.build(&reference("anc://app")).await.expect("build failed");
        assert_eq!(artifact.digest(), &Digest::from_bytes(b"binary bits"));
    }

    #[tokio::test]
    async fn build_is_repeatable_for_same_reference() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        std::fs::write(dir.path().join("app"), b"binary bits").expect("write failed");

        let builder = HashBuilder::new(dir.path());
        let first = builder.build(&reference("anc://app")).await.expect("build failed");
        let second = builder.build(&reference("anc://app")).await.expect("build failed");
        assert_eq!(first.digest(), second.digest());
    }

    #[tokio::test]
    async fn build_directory_digest_depends_on_contents() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let pkg = dir.path().join("pkg");
        std::fs::create_dir(&pkg).expect("mkdir failed");
        std::fs::write(pkg.join("main"), b"v1").expect("write failed");

        let builder = HashBuilder::new(dir.path());
        let before = builder.build(&reference("anc://pkg")).await.expect("build failed");

        std::fs::write(pkg.join("main"), b"v2").expect("write failed");
        let after = builder.build(&reference("anc://pkg")).await.expect("build failed");
        assert_ne!(before.digest(), after.digest());
    }

    #[tokio::test]
    async fn build_missing_path_fails() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let builder = HashBuilder::new(dir.path());
        assert!(builder.build(&reference("anc://nonexistent")).await.is_err());
    }
}
