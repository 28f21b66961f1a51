//! Entity tags: content-derived version tokens.
//!
//! An [`ETag`] is the hex-encoded SHA-256 digest of an entity's canonical JSON
//! serialization. It is recomputed from the current state every time it is
//! needed and never stored alongside the entity.
//!
//! ## Determinism Guarantees
//!
//! - Same state → same tag (struct fields serialize in declaration order)
//! - Any observable field change → different tag (collision-resistant digest)
//! - Timestamps are part of the state, so an accepted write always moves the tag

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{DomainError, DomainResult};

/// Length of a rendered tag (SHA-256, hex).
pub const ETAG_LEN: usize = 64;

/// Opaque version token for an entity's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag(String);

impl ETag {
    /// Compute the tag of `value`'s current observable state.
    ///
    /// ## Errors
    ///
    /// Returns `DomainError::Internal` if the value cannot be serialized. For
    /// well-formed entities this never happens.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> DomainResult<Self> {
        let canonical = serde_json::to_vec(value)
            .map_err(|e| DomainError::internal(format!("entity serialization failed: {e}")))?;
        Ok(Self(hash_bytes(&canonical)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Exact byte-for-byte comparison against a caller-supplied token.
    ///
    /// An absent or empty token never matches.
    pub fn matches(&self, supplied: Option<&str>) -> bool {
        match supplied {
            Some(s) if !s.is_empty() => s.as_bytes() == self.0.as_bytes(),
            _ => false,
        }
    }

    /// Like [`ETag::matches`], but returns a `VersionConflict` on mismatch.
    pub fn check(&self, supplied: Option<&str>) -> DomainResult<()> {
        if self.matches(supplied) {
            Ok(())
        } else {
            Err(DomainError::version_conflict(
                supplied.unwrap_or_default(),
                self.0.clone(),
            ))
        }
    }
}

impl core::fmt::Display for ETag {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Free-function form of [`ETag::of`].
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> DomainResult<ETag> {
    ETag::of(value)
}

fn hash_bytes(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}
