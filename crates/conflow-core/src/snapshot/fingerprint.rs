//! Content fingerprints used as the optimistic-concurrency token.
//!
//! A fingerprint is derived from the persisted *text*, never from the parsed
//! or effective tree, so identical bytes on disk always produce identical
//! fingerprints and reformatting produces a different one.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Snapshot;

/// Opaque, comparable content hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fingerprint of raw document text.
    pub fn of_text(raw: &str) -> Self {
        Self(hash_text(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for log lines
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the concurrency token for a snapshot.
///
/// Uses the provider's hash when it supplied a non-empty one, otherwise
/// hashes the raw text. `None` means no token can be derived; callers must
/// not attempt a CAS write against such a snapshot.
pub fn fingerprint(snapshot: &Snapshot) -> Option<Fingerprint> {
    if let Some(hash) = snapshot.hash.as_ref().filter(|h| !h.as_str().trim().is_empty()) {
        return Some(hash.clone());
    }
    snapshot.raw.as_deref().map(Fingerprint::of_text)
}

/// Hex-encoded SHA-256 of `input`.
pub fn hash_text(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
