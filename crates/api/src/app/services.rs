use std::sync::Arc;

use petstore_infra::{InMemoryRecordStore, VersionedRecords};
use petstore_pets::Pet;

/// Pet records guarded by entity tags, backed by the in-memory store.
pub type PetRecords = VersionedRecords<Arc<InMemoryRecordStore<Pet>>, Pet>;

/// Everything request handlers need, constructed once per process.
#[derive(Debug)]
pub struct AppServices {
    pub pets: PetRecords,
}

impl AppServices {
    pub fn new(store: Arc<InMemoryRecordStore<Pet>>) -> Self {
        Self {
            pets: VersionedRecords::new(store),
        }
    }
}

pub fn build_services() -> AppServices {
    AppServices::new(Arc::new(InMemoryRecordStore::new()))
}
