use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PersonStore, Result};
use crate::person::{NewPerson, Person, PersonId, PersonPatch, PersonSchema};

/// Non-durable store kept in process memory, in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    persons: RwLock<Vec<Person>>,
    schema: PersonSchema,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersonStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn list(&self) -> Result<Vec<Person>> {
        let persons = self.persons.read().await;
        Ok(persons.clone())
    }

    async fn count(&self) -> Result<usize> {
        let persons = self.persons.read().await;
        Ok(persons.len())
    }

    async fn find(&self, id: PersonId) -> Result<Option<Person>> {
        let persons = self.persons.read().await;
        Ok(persons.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, person: NewPerson) -> Result<Person> {
        let person = person.into_person(&self.schema)?;
        let mut persons = self.persons.write().await;
        persons.push(person.clone());
        Ok(person)
    }

    async fn update(&self, id: PersonId, patch: PersonPatch) -> Result<Option<Person>> {
        // Held across merge and validation so concurrent updates serialize
        let mut persons = self.persons.write().await;
        let Some(slot) = persons.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let updated = patch.apply(slot, &self.schema)?;
        *slot = updated.clone();
        Ok(Some(updated))
    }

    async fn delete(&self, id: PersonId) -> Result<bool> {
        let mut persons = self.persons.write().await;
        let before = persons.len();
        persons.retain(|p| p.id != id);
        Ok(persons.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;

    #[tokio::test]
    async fn test_list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for name in ["Arto Hellas", "Ada Lovelace", "Dan Abramov"] {
            store.insert(NewPerson::new(name, "040-123456")).await.unwrap();
        }

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Arto Hellas", "Ada Lovelace", "Dan Abramov"]);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_fields() {
        let store = MemoryStore::new();
        let err = store.insert(NewPerson::new("", "040-123456")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_preserves_id() {
        let store = MemoryStore::new();
        let created = store
            .insert(NewPerson::new("Arto Hellas", "040-123456"))
            .await
            .unwrap();

        let patch = PersonPatch {
            name: Some("Arto Järvinen".to_string()),
            number: Some("040-654321".to_string()),
        };
        let updated = store.update(created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Arto Järvinen");
        assert_eq!(store.find(created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_failed_update_leaves_record_unchanged() {
        let store = MemoryStore::new();
        let created = store
            .insert(NewPerson::new("Arto Hellas", "040-123456"))
            .await
            .unwrap();

        let patch = PersonPatch {
            name: None,
            number: Some(String::new()),
        };
        assert!(store.update(created.id, patch).await.is_err());
        assert_eq!(store.find(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_removed() {
        let store = MemoryStore::new();
        let created = store
            .insert(NewPerson::new("Arto Hellas", "040-123456"))
            .await
            .unwrap();

        assert!(store.delete(created.id).await.unwrap());
        assert!(!store.delete(created.id).await.unwrap());
    }
}
