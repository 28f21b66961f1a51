use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use petstore_core::{DomainError, DomainResult, Entity};

use super::RecordStore;

/// In-memory record store.
///
/// One `RwLock` guards the whole map. Every operation holds it only for the
/// map access itself; `modify` is the one operation whose critical section
/// also covers the caller's comparison.
///
/// A panic while the write lock is held (for example inside a `modify`
/// closure) poisons the store. The map may be half-written at that point, so
/// every later operation fails with `DomainError::Internal` instead of
/// serving it.
#[derive(Debug)]
pub struct InMemoryRecordStore<E: Entity> {
    inner: RwLock<HashMap<E::Id, E>>,
}

impl<E: Entity> InMemoryRecordStore<E> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored records.
    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::internal("record store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, HashMap<E::Id, E>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::internal("record store lock poisoned"))
    }
}

impl<E: Entity> Default for InMemoryRecordStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> RecordStore<E> for InMemoryRecordStore<E> {
    fn list_all(&self) -> DomainResult<Vec<E>> {
        let mut all: Vec<E> = {
            let map = self.read()?;
            map.values().cloned().collect()
        };

        all.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(all)
    }

    fn get(&self, id: &E::Id) -> DomainResult<E> {
        let map = self.read()?;
        map.get(id).cloned().ok_or(DomainError::NotFound)
    }

    fn put(&self, entity: &E) -> DomainResult<()> {
        let copy = entity.clone();
        let mut map = self.write()?;
        map.insert(copy.id().clone(), copy);
        Ok(())
    }

    fn delete(&self, id: &E::Id) -> DomainResult<bool> {
        let mut map = self.write()?;
        Ok(map.remove(id).is_some())
    }

    fn modify(&self, id: &E::Id, f: &mut dyn FnMut(E) -> DomainResult<E>) -> DomainResult<E> {
        let mut map = self.write()?;
        let current = map.get(id).cloned().ok_or(DomainError::NotFound)?;

        let next = f(current)?;
        if next.id() != id {
            return Err(DomainError::internal(format!(
                "modify attempted to change identifier {id} to {}",
                next.id()
            )));
        }

        map.insert(id.clone(), next.clone());
        Ok(next)
    }
}
