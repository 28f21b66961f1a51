//! `petstore-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, typed identifiers, the entity contract, and entity tags.

pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod id;

pub use entity::{Changes, Entity};
pub use error::{DomainError, DomainResult};
pub use fingerprint::{fingerprint, ETag, ETAG_LEN};
pub use id::RecordId;
