//! Keyed record storage with copy-in/copy-out semantics.
//!
//! A record store owns the canonical copy of every entity. Nothing it hands out
//! aliases its internal state: `put` stores a clone of the argument, and
//! `get`/`list_all`/`modify` return clones. Callers may freely mutate what they
//! get back without affecting the store, and later writes to the store never
//! reach a copy a caller already holds.

pub mod in_memory;

use std::sync::Arc;

use petstore_core::{DomainResult, Entity};

pub use in_memory::InMemoryRecordStore;

/// Concurrency-safe keyed container for entities.
///
/// All methods may be called from many threads at once without external
/// locking.
pub trait RecordStore<E: Entity>: Send + Sync {
    /// All records, ordered by creation time ascending (ties by identifier).
    fn list_all(&self) -> DomainResult<Vec<E>>;

    /// Copy of the record stored under `id`, or `DomainError::NotFound`.
    fn get(&self, id: &E::Id) -> DomainResult<E>;

    /// Insert, or fully replace, the record under `entity.id()`.
    fn put(&self, entity: &E) -> DomainResult<()>;

    /// Remove the record if present. Returns whether anything was removed;
    /// removing an absent identifier is not an error.
    fn delete(&self, id: &E::Id) -> DomainResult<bool>;

    /// Compare-and-write under the store's write lock.
    ///
    /// `f` receives a copy of the current record and returns its replacement.
    /// The replacement is stored only if `f` returns `Ok`; on `Err` the stored
    /// record is left untouched and the error is returned as-is. No other write
    /// to the store can interleave between reading the current record and
    /// storing the replacement.
    fn modify(&self, id: &E::Id, f: &mut dyn FnMut(E) -> DomainResult<E>) -> DomainResult<E>;
}

impl<E, S> RecordStore<E> for Arc<S>
where
    E: Entity,
    S: RecordStore<E> + ?Sized,
{
    fn list_all(&self) -> DomainResult<Vec<E>> {
        (**self).list_all()
    }

    fn get(&self, id: &E::Id) -> DomainResult<E> {
        (**self).get(id)
    }

    fn put(&self, entity: &E) -> DomainResult<()> {
        (**self).put(entity)
    }

    fn delete(&self, id: &E::Id) -> DomainResult<bool> {
        (**self).delete(id)
    }

    fn modify(&self, id: &E::Id, f: &mut dyn FnMut(E) -> DomainResult<E>) -> DomainResult<E> {
        (**self).modify(id, f)
    }
}
