//! In-process store used by tests and local runs without a database.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Environment, EnvironmentChanges, EnvironmentStore, MachineStore, NewEnvironment, StoreError,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Machine {
    pub id: Uuid,
    pub environment_id: Uuid,
}

#[derive(Debug, Default)]
struct Records {
    // Insertion order is storage order.
    environments: Vec<Environment>,
    machines: Vec<Machine>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a machine to an environment and return the machine id.
    pub async fn add_machine(&self, environment_id: Uuid) -> Uuid {
        let id = Uuid::new_v4();
        self.records.write().await.machines.push(Machine { id, environment_id });
        id
    }

    pub async fn remove_machine(&self, id: Uuid) -> bool {
        let mut records = self.records.write().await;
        let before = records.machines.len();
        records.machines.retain(|machine| machine.id != id);
        records.machines.len() != before
    }

    pub async fn count_by_code(&self, code: &str) -> usize {
        self.records
            .read()
            .await
            .environments
            .iter()
            .filter(|env| env.environment_code == code)
            .count()
    }
}

#[async_trait]
impl EnvironmentStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Environment>, StoreError> {
        let records = self.records.read().await;
        Ok(records.environments.iter().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Environment>, StoreError> {
        let records = self.records.read().await;
        Ok(records.environments.iter().find(|env| env.id == id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Environment>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .environments
            .iter()
            .find(|env| env.environment_code == code)
            .cloned())
    }

    async fn insert(&self, new: NewEnvironment) -> Result<Environment, StoreError> {
        let mut records = self.records.write().await;
        if records
            .environments
            .iter()
            .any(|env| env.environment_code == new.environment_code)
        {
            return Err(StoreError::Duplicate);
        }

        let now = Utc::now();
        let environment = Environment {
            id: Uuid::new_v4(),
            environment_code: new.environment_code,
            name: new.name,
            in_charge: new.in_charge,
            environment_photo: new.photo,
            created_at: now,
            updated_at: now,
        };
        records.environments.push(environment.clone());
        Ok(environment)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: EnvironmentChanges,
    ) -> Result<Option<Environment>, StoreError> {
        let mut records = self.records.write().await;
        if records
            .environments
            .iter()
            .any(|env| env.id != id && env.environment_code == changes.environment_code)
        {
            return Err(StoreError::Duplicate);
        }

        let Some(environment) = records.environments.iter_mut().find(|env| env.id == id) else {
            return Ok(None);
        };
        environment.environment_code = changes.environment_code;
        environment.name = changes.name;
        environment.in_charge = changes.in_charge;
        if let Some(photo) = changes.photo {
            environment.environment_photo = photo;
        }
        environment.updated_at = Utc::now();
        Ok(Some(environment.clone()))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        if records.machines.iter().any(|machine| machine.environment_id == id) {
            return Err(StoreError::InUse);
        }
        let before = records.environments.len();
        records.environments.retain(|env| env.id != id);
        Ok(records.environments.len() != before)
    }
}

#[async_trait]
impl MachineStore for MemoryStore {
    async fn any_for_environment(&self, environment_id: Uuid) -> Result<bool, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .machines
            .iter()
            .any(|machine| machine.environment_id == environment_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::photos::PhotoRef;

    fn new_env(code: &str) -> NewEnvironment {
        NewEnvironment {
            environment_code: code.to_string(),
            name: format!("Room {code}"),
            in_charge: "U1".to_string(),
            photo: PhotoRef::new(format!("{code}.png")),
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = MemoryStore::new();
        store.insert(new_env("A")).await.unwrap();
        store.insert(new_env("B")).await.unwrap();
        store.insert(new_env("C")).await.unwrap();

        let codes: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|env| env.environment_code)
            .collect();
        assert_eq!(codes, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_code() {
        let store = MemoryStore::new();
        store.insert(new_env("LAB-01")).await.unwrap();
        let result = store.insert(new_env("LAB-01")).await;
        assert!(matches!(result, Err(StoreError::Duplicate)));
        assert_eq!(store.count_by_code("LAB-01").await, 1);
    }

    #[tokio::test]
    async fn update_keeps_own_code_and_rejects_taken_code() {
        let store = MemoryStore::new();
        let first = store.insert(new_env("A")).await.unwrap();
        store.insert(new_env("B")).await.unwrap();

        let same_code = EnvironmentChanges {
            environment_code: "A".to_string(),
            name: "Renamed".to_string(),
            in_charge: "U2".to_string(),
            photo: None,
        };
        let updated = store.update(first.id, same_code).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.environment_photo, first.environment_photo);

        let taken = EnvironmentChanges {
            environment_code: "B".to_string(),
            name: "X".to_string(),
            in_charge: "U2".to_string(),
            photo: None,
        };
        assert!(matches!(
            store.update(first.id, taken).await,
            Err(StoreError::Duplicate)
        ));
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let store = MemoryStore::new();
        let changes = EnvironmentChanges {
            environment_code: "A".to_string(),
            name: "A".to_string(),
            in_charge: "U1".to_string(),
            photo: None,
        };
        assert!(store.update(Uuid::new_v4(), changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_refuses_referenced_environment() {
        let store = MemoryStore::new();
        let env = store.insert(new_env("A")).await.unwrap();
        let machine = store.add_machine(env.id).await;

        assert!(store.any_for_environment(env.id).await.unwrap());
        assert!(matches!(store.remove(env.id).await, Err(StoreError::InUse)));

        assert!(store.remove_machine(machine).await);
        assert!(store.remove(env.id).await.unwrap());
        assert!(store.find_by_id(env.id).await.unwrap().is_none());
        assert!(!store.remove(env.id).await.unwrap());
    }
}
