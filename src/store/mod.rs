//! Persistence for person records
//!
//! A [`PersonStore`] owns the durable representation. [`PersonGateway`] is the
//! only thing the HTTP layer talks to: it turns raw path parameters into ids
//! and delegates to whichever backend the connection string selected.

mod gateway;
mod memory;
mod sqlite;

pub use gateway::PersonGateway;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::person::{NewPerson, Person, PersonId, PersonPatch, ValidationError};

/// Failures surfaced by the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier is not structurally valid
    #[error("Cast to PersonId failed for value \"{value}\"")]
    Cast { value: String },

    /// Field values were rejected by the store rules
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The connection string could not be understood
    #[error("invalid store uri '{uri}': {message}")]
    InvalidUri { uri: String, message: String },

    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("database query failed: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored row could not be decoded back into a person
    #[error("corrupt record {id}: {message}")]
    Corrupt { id: String, message: String },

    #[error("row count {0} out of range")]
    InvalidCount(i64),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("store connection lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Backend operations over the single person collection.
///
/// Implementations must validate `insert` and the merged record of `update`
/// against the schema, and must apply an update atomically per record.
#[async_trait]
pub trait PersonStore: Send + Sync + fmt::Debug {
    /// Short backend name for logs
    fn backend(&self) -> &'static str;

    /// All records in insertion order
    async fn list(&self) -> Result<Vec<Person>>;

    async fn count(&self) -> Result<usize>;

    async fn find(&self, id: PersonId) -> Result<Option<Person>>;

    async fn insert(&self, person: NewPerson) -> Result<Person>;

    /// Returns `None` when no record has this id
    async fn update(&self, id: PersonId, patch: PersonPatch) -> Result<Option<Person>>;

    /// Returns whether a record was removed
    async fn delete(&self, id: PersonId) -> Result<bool>;
}

/// Parsed store connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    /// `memory:`
    Memory,
    /// `sqlite::memory:`
    SqliteInMemory,
    /// `sqlite:<path>` or `sqlite://<path>`
    SqliteFile(PathBuf),
}

impl StoreUri {
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = |message: &str| StoreError::InvalidUri {
            uri: uri.to_string(),
            message: message.to_string(),
        };

        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(invalid("connection string is empty"));
        }

        let (scheme, rest) = trimmed
            .split_once(':')
            .ok_or_else(|| invalid("missing scheme, expected memory: or sqlite:"))?;

        match scheme {
            "memory" => {
                if rest.is_empty() || rest == "//" {
                    Ok(StoreUri::Memory)
                } else {
                    Err(invalid("memory store takes no path"))
                }
            }
            "sqlite" => {
                if rest == ":memory:" {
                    return Ok(StoreUri::SqliteInMemory);
                }
                let path = rest.strip_prefix("//").unwrap_or(rest);
                if path.is_empty() {
                    Err(invalid("sqlite store needs a database path"))
                } else {
                    Ok(StoreUri::SqliteFile(PathBuf::from(path)))
                }
            }
            other => Err(invalid(&format!("unsupported scheme '{}'", other))),
        }
    }

    /// Open the backend this connection string names
    pub fn open(&self) -> Result<Arc<dyn PersonStore>> {
        let store: Arc<dyn PersonStore> = match self {
            StoreUri::Memory => Arc::new(MemoryStore::new()),
            StoreUri::SqliteInMemory => Arc::new(SqliteStore::open_in_memory()?),
            StoreUri::SqliteFile(path) => Arc::new(SqliteStore::open(path)?),
        };
        info!("Opened {} store ({})", store.backend(), self);
        Ok(store)
    }
}

impl fmt::Display for StoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUri::Memory => write!(f, "memory:"),
            StoreUri::SqliteInMemory => write!(f, "sqlite::memory:"),
            StoreUri::SqliteFile(path) => write!(f, "sqlite://{}", path.display()),
        }
    }
}
