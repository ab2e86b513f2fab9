use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use super::{Dependency, Ledger, NewSchema, SchemaStore};
use crate::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::error::{Result, SchemaError};
use crate::schema::SchemaEntry;

/// Process-local store, mostly for tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryStore {
    ledger: RwLock<Ledger>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.ledger
            .read()
            .map_err(|_| SchemaError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.ledger
            .write()
            .map_err(|_| SchemaError::Storage("in-memory store lock poisoned".to_string()))
    }
}

impl SchemaStore for InMemoryStore {
    fn find_all(&self) -> Result<Vec<SchemaEntry>> {
        Ok(self.read()?.newest_first())
    }

    fn create(&self, schema: NewSchema) -> Result<SchemaEntry> {
        let mut ledger = self.write()?;
        let entry = ledger.entry_for(schema);
        debug!(id = entry.id, identity = %entry.identity(), "Stored schema version in memory");
        ledger.entries.push(entry.clone());
        Ok(entry)
    }

    fn upsert_dependency(&self, dependency: Dependency) -> Result<Dependency> {
        self.write()?.upsert_dependency(&dependency);
        Ok(dependency)
    }

    fn find_dependencies(&self) -> Result<Vec<Dependency>> {
        Ok(self.read()?.dependencies.clone())
    }

    fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment> {
        let mut ledger = self.write()?;
        let deployment = ledger.deployment_for(deployment);
        ledger.deployments.push(deployment.clone());
        Ok(deployment)
    }

    fn update_deployment_status(&self, id: u64, status: DeploymentStatus) -> Result<Deployment> {
        self.write()?.set_deployment_status(id, status)
    }

    fn find_deployments(&self) -> Result<Vec<Deployment>> {
        Ok(self.read()?.deployments_newest_first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_increase() {
        let store = InMemoryStore::new();
        let first = store
            .create(NewSchema {
                name: "User".to_string(),
                version: "1".to_string(),
                service_name: "svc".to_string(),
                content: json!({}),
            })
            .unwrap();
        let second = store
            .create(NewSchema {
                name: "User".to_string(),
                version: "1".to_string(),
                service_name: "svc".to_string(),
                content: json!({}),
            })
            .unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_dependency_upsert_is_idempotent() {
        let store = InMemoryStore::new();
        let dep = Dependency::new("a", "b", "S");
        store.upsert_dependency(dep.clone()).unwrap();
        store.upsert_dependency(dep).unwrap();
        assert_eq!(store.find_dependencies().unwrap().len(), 1);
    }
}
