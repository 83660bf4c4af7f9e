//! Domain primitive types used across the Anchorage workspace.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::constants::{DIGEST_ALGORITHM, SCHEME_PREFIX, SHA256_HEX_LENGTH};

/// A buildable reference: the reserved scheme prefix plus a non-empty
/// importable location.
///
/// Identity is exact string equality; two occurrences with the same raw
/// text are the same reference and must resolve to the same output string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference(String);

impl Reference {
    /// Recognizes a scalar as a reference.
    ///
    /// Returns `None` unless the full text is the scheme prefix followed by
    /// a non-empty remainder. Recognition is exact-match on the whole
    /// scalar, never substring search.
    #[must_use]
    pub fn recognize(scalar: &str) -> Option<Self> {
        let location = scalar.strip_prefix(SCHEME_PREFIX)?;
        if location.is_empty() {
            return None;
        }
        Some(Self(scalar.to_string()))
    }

    /// Returns the full reference string including the scheme prefix.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the importable location with the scheme prefix stripped.
    #[must_use]
    pub fn import_path(&self) -> &str {
        self.0
            .strip_prefix(SCHEME_PREFIX)
            .unwrap_or(self.0.as_str())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA-256 content digest identifying a built artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(String);

impl Digest {
    /// Creates a digest from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid 64-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> crate::error::Result<Self> {
        let hex = hex.into();
        if hex.len() != SHA256_HEX_LENGTH || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(crate::error::AnchorageError::Config {
                message: format!("invalid SHA-256 hex string: {hex}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Computes the digest of a byte slice.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut hex = String::with_capacity(SHA256_HEX_LENGTH);
        for byte in hash {
            hex.push_str(&format!("{byte:02x}"));
        }
        Self(hex)
    }

    /// Returns the hex-encoded digest string.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{DIGEST_ALGORITHM}:{}", self.0)
    }
}
