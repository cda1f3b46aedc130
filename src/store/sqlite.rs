//! `SQLite` backend for person records.
//!
//! One connection is shared behind a mutex and every call runs on the
//! blocking pool. Holding the lock for a whole operation gives updates
//! per-record atomicity.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::{PersonStore, Result, StoreError};
use crate::person::{NewPerson, Person, PersonId, PersonPatch, PersonSchema};

const CREATE_PERSONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS persons (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    number TEXT NOT NULL
)
";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    schema: PersonSchema,
}

impl SqliteStore {
    /// Open or create the database file, creating parent directories as needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| StoreError::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(CREATE_PERSONS_TABLE)?;

        info!("Database ready at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        conn.execute_batch(CREATE_PERSONS_TABLE)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            schema: PersonSchema,
        }
    }

    /// Run `f` with exclusive access to the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &PersonSchema) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let schema = self.schema.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn, &schema)
        })
        .await?
    }
}

fn row_to_person(row: &rusqlite::Row) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode((id, name, number): (String, String, String)) -> Result<Person> {
    let id = id.parse::<PersonId>().map_err(|_| StoreError::Corrupt {
        id: id.clone(),
        message: "stored id is not a uuid".to_string(),
    })?;
    Ok(Person { id, name, number })
}

fn row_count(count: i64) -> Result<usize> {
    usize::try_from(count).map_err(|_| StoreError::InvalidCount(count))
}

fn select_one(conn: &Connection, id: PersonId) -> Result<Option<Person>> {
    conn.query_row(
        "SELECT id, name, number FROM persons WHERE id = ?1",
        [id.to_string()],
        row_to_person,
    )
    .optional()?
    .map(decode)
    .transpose()
}

#[async_trait]
impl PersonStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self) -> Result<Vec<Person>> {
        self.with_conn(|conn, _| {
            let mut stmt = conn.prepare("SELECT id, name, number FROM persons ORDER BY seq")?;
            let rows = stmt
                .query_map([], row_to_person)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(decode).collect()
        })
        .await
    }

    async fn count(&self) -> Result<usize> {
        self.with_conn(|conn, _| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))?;
            row_count(count)
        })
        .await
    }

    async fn find(&self, id: PersonId) -> Result<Option<Person>> {
        self.with_conn(move |conn, _| select_one(conn, id)).await
    }

    async fn insert(&self, person: NewPerson) -> Result<Person> {
        self.with_conn(move |conn, schema| {
            let person = person.into_person(schema)?;
            conn.execute(
                "INSERT INTO persons (id, name, number) VALUES (?1, ?2, ?3)",
                params![person.id.to_string(), person.name, person.number],
            )?;
            Ok(person)
        })
        .await
    }

    async fn update(&self, id: PersonId, patch: PersonPatch) -> Result<Option<Person>> {
        self.with_conn(move |conn, schema| {
            let tx = conn.transaction()?;
            let Some(current) = select_one(&tx, id)? else {
                return Ok(None);
            };
            let updated = patch.apply(&current, schema)?;
            tx.execute(
                "UPDATE persons SET name = ?1, number = ?2 WHERE id = ?3",
                params![updated.name, updated.number, id.to_string()],
            )?;
            tx.commit()?;
            Ok(Some(updated))
        })
        .await
    }

    async fn delete(&self, id: PersonId) -> Result<bool> {
        self.with_conn(move |conn, _| {
            let removed = conn.execute("DELETE FROM persons WHERE id = ?1", [id.to_string()])?;
            Ok(removed > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_in_memory() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[test]
    fn test_row_count_out_of_range() {
        assert_eq!(row_count(3).unwrap(), 3);
        assert!(matches!(row_count(-1), Err(StoreError::InvalidCount(-1))));
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store
            .insert(NewPerson::new("Mary Poppendieck", "39-23-6423122"))
            .await
            .unwrap();
        assert_eq!(store.find(created.id).await.unwrap(), Some(created.clone()));

        let patch = PersonPatch {
            name: None,
            number: Some("39-23-0000000".to_string()),
        };
        let updated = store.update(created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "Mary Poppendieck");
        assert_eq!(updated.number, "39-23-0000000");

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
        assert_eq!(store.find(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store
            .update(PersonId::generate(), PersonPatch::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_invalid_update_is_not_written() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store
            .insert(NewPerson::new("Mary Poppendieck", "39-23-6423122"))
            .await
            .unwrap();

        let patch = PersonPatch {
            name: Some("   ".to_string()),
            number: None,
        };
        let err = store.update(created.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.find(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("phonebook.db");

        let created = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(NewPerson::new("Arto Hellas", "040-123456")).await.unwrap();
            store.insert(NewPerson::new("Ada Lovelace", "39-44-5323523")).await.unwrap()
        };

        let reopened = SqliteStore::open(&path).unwrap();
        let persons = reopened.list().await.unwrap();
        assert_eq!(persons.len(), 2);
        assert_eq!(persons[0].name, "Arto Hellas");
        assert_eq!(persons[1], created);
    }
}
