//! JSON-file backed store
//!
//! Layout under the store root:
//!
//! ```text
//! records/
//! ├── 00000001.json
//! ├── 00000002.json
//! └── ...
//! dependencies.json
//! deployments.json
//! ```
//!
//! Each record file holds one [`SchemaEntry`] including the checksum of its
//! content. Records are written once and never rewritten. Every file is
//! written to a `.tmp` sibling first and renamed into place, so a crash
//! mid-write never leaves a truncated `.json` behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Dependency, Ledger, NewSchema, SchemaStore};
use crate::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::error::{Result, SchemaError};
use crate::schema::SchemaEntry;

const RECORDS_DIR: &str = "records";
const DEPENDENCIES_FILE: &str = "dependencies.json";
const DEPLOYMENTS_FILE: &str = "deployments.json";

/// Store persisting every version as its own JSON file
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    ledger: RwLock<Ledger>,
}

impl FileStore {
    /// Open an existing store or create a new one
    ///
    /// Fails with [`SchemaError::ChecksumMismatch`] if any persisted record
    /// was modified after it was written.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(root.join(RECORDS_DIR))?;

        let entries = load_records(&root)?;
        let dependencies = load_list(&root.join(DEPENDENCIES_FILE))?;
        let deployments: Vec<Deployment> = load_list(&root.join(DEPLOYMENTS_FILE))?;

        info!(
            root = %root.display(),
            versions = entries.len(),
            deployments = deployments.len(),
            "Opened schema store"
        );

        Ok(Self {
            root,
            ledger: RwLock::new(Ledger {
                entries,
                dependencies,
                deployments,
            }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-read every record from disk and check its checksum
    pub fn verify(&self) -> Result<bool> {
        match load_records(&self.root) {
            Ok(_) => Ok(true),
            Err(SchemaError::ChecksumMismatch { id, .. }) => {
                warn!(id, "Checksum verification failed");
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.root.join(RECORDS_DIR).join(format!("{:08}.json", id))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.ledger
            .read()
            .map_err(|_| SchemaError::Storage("file store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.ledger
            .write()
            .map_err(|_| SchemaError::Storage("file store lock poisoned".to_string()))
    }
}

fn load_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if path.exists() {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    } else {
        Ok(Vec::new())
    }
}

/// Write `value` as pretty JSON to a temporary sibling, then rename it over `path`
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(serde_json::to_string_pretty(value)?.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn load_records(root: &Path) -> Result<Vec<SchemaEntry>> {
    let mut entries = Vec::new();

    for item in WalkDir::new(root.join(RECORDS_DIR)).min_depth(1).max_depth(1) {
        let item = item.map_err(|e| SchemaError::Storage(e.to_string()))?;
        let path = item.path();
        if !item.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let entry: SchemaEntry = serde_json::from_str(&fs::read_to_string(path)?)?;
        if !entry.verify_checksum() {
            return Err(SchemaError::ChecksumMismatch {
                id: entry.id,
                expected: entry.checksum.to_string(),
                actual: crate::checksum::Checksum::from_json(&entry.content).to_string(),
            });
        }
        entries.push(entry);
    }

    debug!(count = entries.len(), "Loaded schema records");
    Ok(entries)
}

impl SchemaStore for FileStore {
    fn find_all(&self) -> Result<Vec<SchemaEntry>> {
        Ok(self.read()?.newest_first())
    }

    fn create(&self, schema: NewSchema) -> Result<SchemaEntry> {
        let mut ledger = self.write()?;
        let entry = ledger.entry_for(schema);

        let path = self.record_path(entry.id);
        if path.exists() {
            return Err(SchemaError::ImmutabilityViolation { id: entry.id });
        }
        write_json_atomic(&path, &entry)?;

        info!(
            id = entry.id,
            identity = %entry.identity(),
            version = %entry.version,
            "Appended schema version"
        );
        ledger.entries.push(entry.clone());
        Ok(entry)
    }

    fn upsert_dependency(&self, dependency: Dependency) -> Result<Dependency> {
        let mut ledger = self.write()?;
        if ledger.upsert_dependency(&dependency) {
            write_json_atomic(&self.root.join(DEPENDENCIES_FILE), &ledger.dependencies)?;
            debug!(
                producer = %dependency.producer_service,
                consumer = %dependency.consumer_service,
                schema = %dependency.schema_name,
                "Recorded dependency"
            );
        }
        Ok(dependency)
    }

    fn find_dependencies(&self) -> Result<Vec<Dependency>> {
        Ok(self.read()?.dependencies.clone())
    }

    fn create_deployment(&self, deployment: NewDeployment) -> Result<Deployment> {
        let mut ledger = self.write()?;
        let deployment = ledger.deployment_for(deployment);

        let mut deployments = ledger.deployments.clone();
        deployments.push(deployment.clone());
        write_json_atomic(&self.root.join(DEPLOYMENTS_FILE), &deployments)?;
        ledger.deployments = deployments;

        info!(
            id = deployment.id,
            schema_id = deployment.schema_id,
            environment = %deployment.environment,
            "Recorded deployment"
        );
        Ok(deployment)
    }

    fn update_deployment_status(&self, id: u64, status: DeploymentStatus) -> Result<Deployment> {
        let mut ledger = self.write()?;
        let previous = ledger.deployments.clone();
        let updated = ledger.set_deployment_status(id, status)?;

        if let Err(e) = write_json_atomic(&self.root.join(DEPLOYMENTS_FILE), &ledger.deployments) {
            ledger.deployments = previous;
            return Err(e);
        }

        info!(id, status = %status, "Updated deployment status");
        Ok(updated)
    }

    fn find_deployments(&self) -> Result<Vec<Deployment>> {
        Ok(self.read()?.deployments_newest_first())
    }
}
