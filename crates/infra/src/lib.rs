//! Infrastructure layer: record storage and the conditional-update protocol.

pub mod record_store;
pub mod versioned;

pub use record_store::{InMemoryRecordStore, RecordStore};
pub use versioned::{Versioned, VersionedRecords};
