use chrono::{DateTime, Utc};
use serde::Serialize;

use petstore_core::{Changes, DomainError, DomainResult, Entity, RecordId};

/// Pet identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PetId(pub RecordId);

impl PetId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }

    /// Draw a fresh, globally unique identifier.
    pub fn generate() -> Self {
        Self(RecordId::new())
    }
}

impl core::fmt::Display for PetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for PetId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A pet record.
///
/// Field order is the serialization order and therefore part of the entity
/// tag; do not reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pet {
    id: PetId,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Pet {
    /// Create a new pet; both timestamps are set to `now`.
    pub fn create(id: PetId, name: impl Into<String>, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = validate_name(name.into())?;
        Ok(Self {
            id,
            name,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the name on this copy only (does not bump `updated_at`).
    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        self.name = validate_name(name.into())?;
        Ok(())
    }
}

impl Entity for Pet {
    type Id = PetId;

    fn id(&self) -> &PetId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Full replacement of a pet's mutable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetChanges {
    name: String,
}

impl PetChanges {
    pub fn new(name: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(name.into())?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Changes<Pet> for PetChanges {
    fn apply_to(&self, pet: &mut Pet) {
        pet.name = self.name.clone();
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name)
}
