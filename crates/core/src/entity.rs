//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A record kept in a record store and guarded by an entity tag.
///
/// Everything `Serialize` emits is the record's observable state, so it is
/// exactly what the fingerprint covers. Implementations must serialize
/// deterministically (structs with fixed field order, no hash maps).
pub trait Entity: Clone + Serialize + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Clone
        + Eq
        + Ord
        + core::hash::Hash
        + core::fmt::Debug
        + core::fmt::Display
        + Send
        + Sync
        + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// When the entity was created. Never changes.
    fn created_at(&self) -> DateTime<Utc>;

    /// When the entity last accepted a write.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Record that a write was accepted at `at`.
    fn touch(&mut self, at: DateTime<Utc>);
}

/// A validated set of field replacements for an entity.
///
/// Applying changes must never touch the identifier or the creation timestamp.
pub trait Changes<E: Entity> {
    fn apply_to(&self, entity: &mut E);
}
