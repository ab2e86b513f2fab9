//! Persistence collaborators
//!
//! The registry only sequences lookups and appends; where versions,
//! dependency rows and deployments live is up to a [`SchemaStore`]. Two
//! stores ship with the crate: [`InMemoryStore`] and the JSON-file backed
//! [`FileStore`].

mod file;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::error::{Lookup, Result, SchemaError};
use crate::schema::SchemaEntry;

pub use file::FileStore;
pub use memory::InMemoryStore;

/// A schema version about to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSchema {
    pub name: String,
    pub version: String,
    pub service_name: String,
    pub content: Value,
}

/// A consumer's dependency on a schema published by a producer service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub producer_service: String,
    pub consumer_service: String,
    pub schema_name: String,
}

impl Dependency {
    pub fn new(
        producer_service: impl Into<String>,
        consumer_service: impl Into<String>,
        schema_name: impl Into<String>,
    ) -> Self {
        Self {
            producer_service: producer_service.into(),
            consumer_service: consumer_service.into(),
            schema_name: schema_name.into(),
        }
    }
}

/// Append-only storage of schema versions and dependency rows
///
/// Listings are ordered most recent first. Implementations must hand out
/// strictly increasing ids so that insertion order is recoverable.
pub trait SchemaStore: Send + Sync {
    /// Every stored version, most recent first
    fn find_all(&self) -> Result<Vec<SchemaEntry>>;

    /// Append a new version
    fn create(&self, schema: NewSchema) -> Result<SchemaEntry>;

    /// Insert a dependency row, replacing an identical one
    fn upsert_dependency(&self, dependency: Dependency) -> Result<Dependency>;

    fn find_dependencies(&self) -> Result<Vec<Dependency>>;

    /// Record a deployment; it starts out pending
    fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment>;

    /// Fails with [`SchemaError::NotFound`] if no deployment has this id
    fn update_deployment_status(&self, id: u64, status: DeploymentStatus) -> Result<Deployment>;

    /// Every deployment, most recent first
    fn find_deployments(&self) -> Result<Vec<Deployment>>;

    fn find_deployments_by_service(&self, service_name: &str) -> Result<Vec<Deployment>> {
        Ok(self
            .find_deployments()?
            .into_iter()
            .filter(|deployment| deployment.service_name == service_name)
            .collect())
    }

    fn find_by_id(&self, id: u64) -> Result<Option<SchemaEntry>> {
        Ok(self.find_all()?.into_iter().find(|entry| entry.id == id))
    }

    fn find_by_service(&self, service_name: &str) -> Result<Vec<SchemaEntry>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|entry| entry.service_name == service_name)
            .collect())
    }

    /// All versions of one identity, most recent first
    fn find_by_name_and_service(&self, name: &str, service_name: &str) -> Result<Vec<SchemaEntry>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|entry| entry.name == name && entry.service_name == service_name)
            .collect())
    }
}

macro_rules! forward_store {
    ($($ptr:ident)::+) => {
        impl<T: SchemaStore + ?Sized> SchemaStore for $($ptr)::+<T> {
            fn find_all(&self) -> Result<Vec<SchemaEntry>> {
                (**self).find_all()
            }

            fn create(&self, schema: NewSchema) -> Result<SchemaEntry> {
                (**self).create(schema)
            }

            fn upsert_dependency(&self, dependency: Dependency) -> Result<Dependency> {
                (**self).upsert_dependency(dependency)
            }

            fn find_dependencies(&self) -> Result<Vec<Dependency>> {
                (**self).find_dependencies()
            }

            fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment> {
                (**self).create_deployment(deployment)
            }

            fn update_deployment_status(&self, id: u64, status: DeploymentStatus) -> Result<Deployment> {
                (**self).update_deployment_status(id, status)
            }

            fn find_deployments(&self) -> Result<Vec<Deployment>> {
                (**self).find_deployments()
            }

            fn find_deployments_by_service(&self, service_name: &str) -> Result<Vec<Deployment>> {
                (**self).find_deployments_by_service(service_name)
            }

            fn find_by_id(&self, id: u64) -> Result<Option<SchemaEntry>> {
                (**self).find_by_id(id)
            }

            fn find_by_service(&self, service_name: &str) -> Result<Vec<SchemaEntry>> {
                (**self).find_by_service(service_name)
            }

            fn find_by_name_and_service(&self, name: &str, service_name: &str) -> Result<Vec<SchemaEntry>> {
                (**self).find_by_name_and_service(name, service_name)
            }
        }
    };
}

forward_store!(Box);
forward_store!(std::sync::Arc);

/// Shared in-memory bookkeeping for both stores
#[derive(Debug, Default)]
struct Ledger {
    entries: Vec<SchemaEntry>,
    dependencies: Vec<Dependency>,
    deployments: Vec<Deployment>,
}

impl Ledger {
    fn next_id(&self) -> u64 {
        self.entries.iter().map(|entry| entry.id).max().unwrap_or(0) + 1
    }

    fn entry_for(&self, schema: NewSchema) -> SchemaEntry {
        SchemaEntry::new(
            self.next_id(),
            schema.name,
            schema.version,
            schema.service_name,
            schema.content,
        )
    }

    fn newest_first(&self) -> Vec<SchemaEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries
    }

    fn deployment_for(&self, deployment: NewDeployment) -> Deployment {
        let id = self.deployments.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        Deployment::new(id, deployment)
    }

    fn set_deployment_status(&mut self, id: u64, status: DeploymentStatus) -> Result<Deployment> {
        let deployment = self
            .deployments
            .iter_mut()
            .find(|deployment| deployment.id == id)
            .ok_or(SchemaError::NotFound(Lookup::Deployment(id)))?;
        deployment.status = status;
        Ok(deployment.clone())
    }

    fn deployments_newest_first(&self) -> Vec<Deployment> {
        let mut deployments = self.deployments.clone();
        deployments.sort_by(|a, b| b.id.cmp(&a.id));
        deployments
    }

    /// Returns true if the row was new
    fn upsert_dependency(&mut self, dependency: &Dependency) -> bool {
        if self.dependencies.contains(dependency) {
            false
        } else {
            self.dependencies.push(dependency.clone());
            true
        }
    }
}
