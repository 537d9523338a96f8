//! Checksum utilities for staged schema content

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SHA256 checksum of a staged file or of a whole schema bundle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Fold an ordered sequence of labelled checksums into one.
    ///
    /// Labels are hashed alongside the digests so that renaming a file changes
    /// the result even when its content does not.
    pub fn combine<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Checksum)>,
    {
        let mut hasher = Sha256::new();
        for (label, checksum) in parts {
            hasher.update(label.as_bytes());
            hasher.update([0u8]);
            hasher.update(checksum.0.as_bytes());
            hasher.update([b'\n']);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
