use std::sync::Arc;
use tracing::debug;

use super::{PersonStore, Result};
use crate::person::{NewPerson, Person, PersonId, PersonPatch};

/// Entry point for handlers into the person collection.
///
/// Ids arrive as raw strings; a malformed one fails with a cast error before
/// the backend is touched.
#[derive(Debug, Clone)]
pub struct PersonGateway {
    store: Arc<dyn PersonStore>,
}

impl PersonGateway {
    pub fn new(store: Arc<dyn PersonStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn list_all(&self) -> Result<Vec<Person>> {
        self.store.list().await
    }

    pub async fn count(&self) -> Result<usize> {
        self.store.count().await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Person>> {
        let id = PersonId::parse(id)?;
        self.store.find(id).await
    }

    pub async fn create(&self, name: String, number: String) -> Result<Person> {
        let person = self.store.insert(NewPerson::new(name, number)).await?;
        debug!("Created person {}", person.id);
        Ok(person)
    }

    pub async fn update_by_id(&self, id: &str, patch: PersonPatch) -> Result<Option<Person>> {
        let id = PersonId::parse(id)?;
        self.store.update(id, patch).await
    }

    /// Removing an id with no record is a no-op
    pub async fn delete_by_id(&self, id: &str) -> Result<()> {
        let id = PersonId::parse(id)?;
        if !self.store.delete(id).await? {
            debug!("Delete of {} matched no record", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError};

    fn gateway() -> PersonGateway {
        PersonGateway::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected_on_every_lookup() {
        let gateway = gateway();

        assert!(matches!(
            gateway.find_by_id("123").await,
            Err(StoreError::Cast { .. })
        ));
        assert!(matches!(
            gateway.update_by_id("123", PersonPatch::default()).await,
            Err(StoreError::Cast { .. })
        ));
        assert!(matches!(
            gateway.delete_by_id("123").await,
            Err(StoreError::Cast { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let gateway = gateway();
        let created = gateway
            .create("Ada Lovelace".to_string(), "39-44-5323523".to_string())
            .await
            .unwrap();

        let found = gateway
            .find_by_id(&created.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(gateway.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let gateway = gateway();
        let created = gateway
            .create("Ada Lovelace".to_string(), "39-44-5323523".to_string())
            .await
            .unwrap();
        let id = created.id.to_string();

        gateway.delete_by_id(&id).await.unwrap();
        gateway.delete_by_id(&id).await.unwrap();
        assert!(gateway.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_creates_nothing() {
        let gateway = gateway();
        let patch = PersonPatch {
            name: Some("Ghost".to_string()),
            number: Some("000".to_string()),
        };
        let result = gateway
            .update_by_id(&PersonId::generate().to_string(), patch)
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(gateway.count().await.unwrap(), 0);
    }
}
