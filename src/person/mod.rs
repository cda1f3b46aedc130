//! The person record and the rules the store enforces on it

mod schema;

pub use schema::{PersonSchema, ValidationError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::store::StoreError;

/// Store-assigned identifier of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(Uuid);

impl PersonId {
    /// Generate a fresh identifier for a new record
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a path parameter into an id.
    ///
    /// A string that is not a UUID is a cast failure, which is distinct from
    /// a well-formed id that simply has no record behind it.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        raw.parse()
    }
}

impl FromStr for PersonId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| StoreError::Cast {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A stored phonebook entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub number: String,
}

/// Fields for a record that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub number: String,
}

impl NewPerson {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
        }
    }

    /// Check the store rules and assign an id
    pub fn into_person(self, schema: &PersonSchema) -> Result<Person, StoreError> {
        let person = Person {
            id: PersonId::generate(),
            name: self.name,
            number: self.number,
        };
        schema.validate(&person)?;
        Ok(person)
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub number: Option<String>,
}

impl PersonPatch {
    /// Merge the patch over `current` and validate the result.
    ///
    /// Rules are checked against the merged record, never the stored one.
    pub fn apply(&self, current: &Person, schema: &PersonSchema) -> Result<Person, StoreError> {
        let updated = Person {
            id: current.id,
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            number: self.number.clone().unwrap_or_else(|| current.number.clone()),
        };
        schema.validate(&updated)?;
        Ok(updated)
    }
}
