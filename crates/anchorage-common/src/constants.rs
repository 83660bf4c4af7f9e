//! System-wide constants and defaults.

/// Reserved scheme prefix identifying a buildable reference scalar.
pub const SCHEME_PREFIX: &str = "anc://";

/// Digest algorithm used for content-addressed artifact names.
pub const DIGEST_ALGORITHM: &str = "sha256";

/// SHA-256 digest length in hex characters.
pub const SHA256_HEX_LENGTH: usize = 64;

/// YAML document-start marker separating documents in a stream.
pub const DOCUMENT_SEPARATOR: &str = "---";

/// Conventional location of the label mapping inside a document.
pub const LABELS_PATH: &str = "metadata.labels";

/// Application name used in CLI output.
pub const APP_NAME: &str = "anchorage";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "anc";

/// Returns the default number of concurrent build jobs (one per CPU).
#[must_use]
pub fn default_concurrent_builds() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
