//! Conditional-update protocol over a record store.
//!
//! `VersionedRecords` pairs every record it hands out with the record's current
//! entity tag, and accepts a write only when the caller echoes back the tag of
//! the state that is stored *right now*.
//!
//! ```text
//! read(id)                      -> (entity, tag)
//! update(id, changes, tag, now)
//!   ↓  (store write lock held from here)
//! 1. load current copy           NotFound if absent
//! 2. recompute current tag
//! 3. compare with supplied tag   VersionConflict on mismatch, nothing written
//! 4. apply changes, touch, store
//!   ↓  (lock released)
//! 5. tag the stored copy         -> (entity, new tag)
//! ```
//!
//! Steps 2–4 run inside [`RecordStore::modify`], so two writers holding the
//! same tag can never both commit: whichever takes the lock second sees the
//! first writer's state, computes a different tag and is rejected.
//!
//! Deletes are not tag-guarded. Any caller that can name an existing record may
//! delete it; exactly one of several racing deletes succeeds.

use std::marker::PhantomData;

use chrono::{DateTime, Duration, Utc};
use petstore_core::{fingerprint, Changes, DomainError, DomainResult, ETag, Entity};

use crate::record_store::RecordStore;

/// An entity together with the tag of the state it was copied from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<E> {
    pub entity: E,
    pub etag: ETag,
}

impl<E: Entity> Versioned<E> {
    fn tag(entity: E) -> DomainResult<Self> {
        let etag = fingerprint(&entity)?;
        Ok(Self { entity, etag })
    }
}

/// Optimistic-concurrency front end for a [`RecordStore`].
#[derive(Debug)]
pub struct VersionedRecords<S, E> {
    store: S,
    _entity: PhantomData<fn() -> E>,
}

impl<S, E> VersionedRecords<S, E> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S, E> VersionedRecords<S, E>
where
    S: RecordStore<E>,
    E: Entity,
{
    /// Store a freshly created entity and return it with its initial tag.
    pub fn create(&self, entity: E) -> DomainResult<Versioned<E>> {
        let versioned = Versioned::tag(entity)?;
        self.store.put(&versioned.entity)?;
        tracing::info!(id = %versioned.entity.id(), "record created");
        Ok(versioned)
    }

    /// All records, oldest first.
    pub fn list(&self) -> DomainResult<Vec<E>> {
        self.store.list_all()
    }

    /// Read a record together with its current tag.
    pub fn read(&self, id: &E::Id) -> DomainResult<Versioned<E>> {
        let entity = self.store.get(id)?;
        Versioned::tag(entity)
    }

    /// Apply `changes` only if `supplied` is the tag of the current state.
    ///
    /// An absent or empty `supplied` tag is always rejected. On any error the
    /// stored record is left exactly as it was.
    ///
    /// `updated_at` strictly increases on every accepted write: a `now` at or
    /// before the stored value is bumped to one nanosecond past it, so a
    /// record never returns to an earlier state (and an earlier tag).
    pub fn update<C>(
        &self,
        id: &E::Id,
        changes: &C,
        supplied: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<Versioned<E>>
    where
        C: Changes<E>,
    {
        let result = self.store.modify(id, &mut |current: E| -> DomainResult<E> {
            let current_tag = fingerprint(&current)?;
            tracing::debug!(
                id = %id,
                if_match = supplied.unwrap_or_default(),
                etag = %current_tag,
                "comparing entity tags"
            );
            current_tag.check(supplied)?;

            let floor = current.updated_at() + Duration::nanoseconds(1);
            let mut updated = current;
            changes.apply_to(&mut updated);
            updated.touch(now.max(floor));
            Ok(updated)
        });

        match result {
            Ok(updated) => {
                let versioned = Versioned::tag(updated)?;
                tracing::info!(id = %id, etag = %versioned.etag, "record updated");
                Ok(versioned)
            }
            Err(e @ DomainError::VersionConflict { .. }) => {
                tracing::warn!(id = %id, "rejected update with stale entity tag");
                Err(e)
            }
            Err(e @ DomainError::Internal(_)) => {
                tracing::error!(id = %id, error = %e, "update failed");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a record. `NotFound` if it does not exist, including when a
    /// concurrent delete removed it first.
    pub fn delete(&self, id: &E::Id) -> DomainResult<()> {
        if !self.store.delete(id)? {
            return Err(DomainError::NotFound);
        }
        tracing::info!(id = %id, "record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};

    use chrono::TimeZone;
    use serde::{Serialize, Serializer};
    use petstore_pets::{Pet, PetChanges, PetId};

    use super::*;
    use crate::record_store::InMemoryRecordStore;

    type Pets = VersionedRecords<Arc<InMemoryRecordStore<Pet>>, Pet>;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    fn setup() -> Pets {
        VersionedRecords::new(Arc::new(InMemoryRecordStore::new()))
    }

    fn create(pets: &Pets, name: &str, at: DateTime<Utc>) -> Versioned<Pet> {
        pets.create(Pet::create(PetId::generate(), name, at).unwrap())
            .unwrap()
    }

    fn rename(name: &str) -> PetChanges {
        PetChanges::new(name).unwrap()
    }

    #[test]
    fn create_returns_tag_of_stored_state() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let read = pets.read(created.entity.id()).unwrap();
        assert_eq!(read, created);
    }

    #[test]
    fn read_is_stable_while_nothing_changes() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        let a = pets.read(&id).unwrap();
        let b = pets.read(&id).unwrap();
        assert_eq!(a.etag, b.etag);
    }

    #[test]
    fn read_missing_is_not_found() {
        let pets = setup();
        assert_eq!(pets.read(&PetId::generate()), Err(DomainError::NotFound));
    }

    #[test]
    fn happy_path_update_issues_new_tag() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        let t0_tag = pets.read(&id).unwrap().etag;
        let later = t0() + Duration::seconds(5);
        let updated = pets
            .update(&id, &rename("Max"), Some(t0_tag.as_str()), later)
            .unwrap();

        assert_ne!(updated.etag, t0_tag);
        assert_eq!(updated.entity.name(), "Max");
        assert_eq!(updated.entity.created_at(), t0());
        assert_eq!(updated.entity.updated_at(), later);
        assert!(updated.entity.updated_at() > created.entity.updated_at());
        assert_eq!(pets.read(&id).unwrap(), updated);
    }

    #[test]
    fn stale_tag_is_rejected_and_state_is_kept() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();
        let t0_tag = created.etag.clone();

        let after_t1 = pets
            .update(&id, &rename("Max"), Some(t0_tag.as_str()), t0() + Duration::seconds(1))
            .unwrap();

        let err = pets
            .update(&id, &rename("Fido"), Some(t0_tag.as_str()), t0() + Duration::seconds(2))
            .unwrap_err();

        match err {
            DomainError::VersionConflict { supplied, current } => {
                assert_eq!(supplied, t0_tag.as_str());
                assert_eq!(current, after_t1.etag.as_str());
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }
        assert_eq!(pets.read(&id).unwrap(), after_t1);
    }

    #[test]
    fn absent_and_empty_tags_are_rejected() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        for supplied in [None, Some("")] {
            let err = pets.update(&id, &rename("Max"), supplied, t0()).unwrap_err();
            assert!(matches!(err, DomainError::VersionConflict { .. }));
        }
        assert_eq!(pets.read(&id).unwrap(), created);
    }

    #[test]
    fn tag_prefix_is_rejected() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        let prefix = &created.etag.as_str()[..32];
        let err = pets.update(&id, &rename("Max"), Some(prefix), t0()).unwrap_err();
        assert!(matches!(err, DomainError::VersionConflict { .. }));
    }

    #[test]
    fn update_missing_is_not_found() {
        let pets = setup();
        let err = pets
            .update(&PetId::generate(), &rename("Max"), Some("whatever"), t0())
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn delete_then_access_is_not_found() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        pets.delete(&id).unwrap();

        assert_eq!(pets.read(&id), Err(DomainError::NotFound));
        assert_eq!(pets.delete(&id), Err(DomainError::NotFound));
        assert_eq!(
            pets.update(&id, &rename("Max"), Some(created.etag.as_str()), t0()),
            Err(DomainError::NotFound)
        );
        // the store itself treats a repeated delete as a no-op
        assert_eq!(pets.store().delete(&id), Ok(false));
    }

    #[test]
    fn delete_ignores_tags() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();
        pets.update(&id, &rename("Max"), Some(created.etag.as_str()), t0() + Duration::seconds(1))
            .unwrap();

        assert!(pets.delete(&id).is_ok());
    }

    #[test]
    fn list_returns_creation_order() {
        let pets = setup();
        let c = create(&pets, "C", t0() + Duration::seconds(2));
        let a = create(&pets, "A", t0());
        let b = create(&pets, "B", t0() + Duration::seconds(1));

        let listed = pets.list().unwrap();
        assert_eq!(listed, vec![a.entity, b.entity, c.entity]);
    }

    #[test]
    fn concurrent_writers_with_same_tag_exactly_one_wins() {
        let pets = Arc::new(setup());
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();
        let tag = created.etag.into_string();

        let writers = 8;
        let barrier = Arc::new(Barrier::new(writers));
        let handles: Vec<_> = (0..writers)
            .map(|i| {
                let pets = pets.clone();
                let barrier = barrier.clone();
                let tag = tag.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    pets.update(
                        &id,
                        &rename(&format!("writer-{i}")),
                        Some(&tag),
                        t0() + Duration::seconds(1),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::VersionConflict { .. })))
            .count();

        assert_eq!(winners.len(), 1);
        assert_eq!(conflicts, writers - 1);
        assert_eq!(&pets.read(&id).unwrap(), winners[0]);
    }

    #[test]
    fn retry_after_conflict_with_fresh_tag_succeeds() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        pets.update(&id, &rename("Max"), Some(created.etag.as_str()), t0() + Duration::seconds(1))
            .unwrap();
        assert!(pets
            .update(&id, &rename("Fido"), Some(created.etag.as_str()), t0() + Duration::seconds(2))
            .is_err());

        let fresh = pets.read(&id).unwrap().etag;
        let updated = pets
            .update(&id, &rename("Fido"), Some(fresh.as_str()), t0() + Duration::seconds(3))
            .unwrap();
        assert_eq!(updated.entity.name(), "Fido");
    }

    #[test]
    fn update_never_moves_updated_at_backwards() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        let earlier = t0() - Duration::seconds(10);
        let updated = pets
            .update(&id, &rename("Max"), Some(created.etag.as_str()), earlier)
            .unwrap();

        assert!(updated.entity.updated_at() > created.entity.updated_at());
        assert!(updated.entity.updated_at() >= updated.entity.created_at());
    }

    #[test]
    fn reverting_fields_at_same_instant_does_not_revive_old_tag() {
        let pets = setup();
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();
        let original = created.etag.clone();

        let max = pets
            .update(&id, &rename("Max"), Some(original.as_str()), t0())
            .unwrap();
        let back = pets
            .update(&id, &rename("Rex"), Some(max.etag.as_str()), t0())
            .unwrap();

        assert_eq!(back.entity.name(), "Rex");
        assert_ne!(back.etag, original);
        assert!(back.entity.updated_at() > max.entity.updated_at());

        let err = pets
            .update(&id, &rename("Fido"), Some(original.as_str()), t0())
            .unwrap_err();
        assert!(matches!(err, DomainError::VersionConflict { .. }));
        assert_eq!(pets.read(&id).unwrap(), back);
    }

    #[test]
    fn racing_deletes_exactly_one_succeeds() {
        let pets = Arc::new(setup());
        let created = create(&pets, "Rex", t0());
        let id = *created.entity.id();

        let deleters = 8;
        let barrier = Arc::new(Barrier::new(deleters));
        let handles: Vec<_> = (0..deleters)
            .map(|_| {
                let pets = pets.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    pets.delete(&id)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| **r == Err(DomainError::NotFound))
                .count(),
            deleters - 1
        );
    }

    /// Entity whose serialization fails on demand.
    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Unserializable {
        id: PetId,
        at: DateTime<Utc>,
    }

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("cannot serialize"))
        }
    }

    impl Entity for Unserializable {
        type Id = PetId;

        fn id(&self) -> &PetId {
            &self.id
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.at
        }

        fn updated_at(&self) -> DateTime<Utc> {
            self.at
        }

        fn touch(&mut self, at: DateTime<Utc>) {
            self.at = at;
        }
    }

    #[test]
    fn create_that_cannot_be_tagged_stores_nothing() {
        let records: VersionedRecords<InMemoryRecordStore<Unserializable>, Unserializable> =
            VersionedRecords::new(InMemoryRecordStore::new());
        let entity = Unserializable {
            id: PetId::generate(),
            at: t0(),
        };

        let err = records.create(entity.clone()).unwrap_err();

        assert!(matches!(err, DomainError::Internal(_)));
        assert_eq!(records.store().get(&entity.id), Err(DomainError::NotFound));
        assert!(records.store().is_empty().unwrap());
    }
}
