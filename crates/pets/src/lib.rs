//! Pets domain module.
//!
//! Business rules for pet records, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod pet;

pub use pet::{Pet, PetChanges, PetId};
