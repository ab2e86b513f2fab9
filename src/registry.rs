//! Schema Registry
//!
//! Sequences a registration: resolve the latest stored version of the same
//! `(name, service_name)` identity, compare it with the candidate, append
//! the candidate. The registry holds no state of its own beyond its store
//! handle and comparator settings; construct one per process and share it.
//!
//! Lookup and append are not serialized per identity. Two concurrent
//! registrations of the same identity may both compare against the same
//! previous version; the later append simply becomes the newest.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::compatibility::{Comparator, ComparisonReport};
use crate::deployment::{Deployment, DeploymentStatus, NewDeployment};
use crate::error::{Lookup, Result, SchemaError};
use crate::impact::{analyze_impact, ImpactReport};
use crate::schema::{SchemaDocument, SchemaEntry};
use crate::store::{Dependency, NewSchema, SchemaStore};

/// A candidate schema version as submitted by a caller
///
/// Every field is optional on the wire so that a missing one can be reported
/// by name instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub service_name: Option<String>,
}

impl SchemaRecord {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        service_name: impl Into<String>,
        content: Value,
    ) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            content: Some(content),
            service_name: Some(service_name.into()),
        }
    }
}

/// Outcome of a registration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    /// The newly stored version
    pub schema: SchemaEntry,
    /// Version label of the version compared against
    pub previous_version: Option<String>,
    /// Comparison against the previous version; `None` for a first version
    pub analysis: Option<ComparisonReport>,
    pub is_first_version: bool,
}

/// The schema registry service
pub struct SchemaRegistry<S> {
    store: S,
    comparator: Comparator,
}

impl<S: SchemaStore> SchemaRegistry<S> {
    pub fn new(store: S) -> Self {
        Self::with_comparator(store, Comparator::new())
    }

    pub fn with_comparator(store: S, comparator: Comparator) -> Self {
        Self { store, comparator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a new version of a schema
    pub fn register_schema(&self, record: SchemaRecord) -> Result<RegistrationResult> {
        match self.register(record) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(error = %e, "Error registering schema");
                Err(e)
            }
        }
    }

    fn register(&self, record: SchemaRecord) -> Result<RegistrationResult> {
        let candidate = Self::validate_schema_data(record)?;

        let existing = match self
            .store
            .find_by_name_and_service(&candidate.name, &candidate.service_name)
        {
            Ok(entries) => entries,
            Err(SchemaError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let (previous_version, analysis) = match existing.first() {
            Some(latest) => {
                debug!(
                    name = %candidate.name,
                    service = %candidate.service_name,
                    previous = %latest.version,
                    "Comparing against previous version"
                );
                let report = self
                    .comparator
                    .compare(&latest.document(), &SchemaDocument::from_value(&candidate.content));
                (Some(latest.version.clone()), Some(report))
            }
            None => (None, None),
        };

        let schema = self.store.create(candidate)?;

        match &analysis {
            Some(report) if report.has_breaking_changes => warn!(
                identity = %schema.identity(),
                version = %schema.version,
                breaking = report.summary.breaking_changes_count,
                "Registered schema version with breaking changes"
            ),
            _ => info!(
                identity = %schema.identity(),
                version = %schema.version,
                first = analysis.is_none(),
                "Registered schema version"
            ),
        }

        Ok(RegistrationResult {
            schema,
            is_first_version: previous_version.is_none(),
            previous_version,
            analysis,
        })
    }

    /// Check that the identity and content fields are present, in the order
    /// `name`, `version`, `content`, `service_name`
    pub fn validate_schema_data(record: SchemaRecord) -> Result<NewSchema> {
        let SchemaRecord {
            name,
            version,
            content,
            service_name,
        } = record;

        let name = non_empty(name).ok_or_else(|| SchemaError::missing_field("name"))?;
        let version = non_empty(version).ok_or_else(|| SchemaError::missing_field("version"))?;
        let content = content
            .filter(|content| !content.is_null())
            .ok_or_else(|| SchemaError::missing_field("content"))?;
        let service_name =
            non_empty(service_name).ok_or_else(|| SchemaError::missing_field("service_name"))?;

        Ok(NewSchema {
            name,
            version,
            service_name,
            content,
        })
    }

    pub fn get_all_schemas(&self) -> Result<Vec<SchemaEntry>> {
        self.store.find_all()
    }

    pub fn get_schemas_by_service(&self, service_name: &str) -> Result<Vec<SchemaEntry>> {
        self.store.find_by_service(service_name)
    }

    /// All versions of one identity, most recent first
    pub fn get_schema_history(&self, name: &str, service_name: &str) -> Result<Vec<SchemaEntry>> {
        self.store.find_by_name_and_service(name, service_name)
    }

    /// Services affected by a change to `schema_name` published by `service_name`
    pub fn get_impacted_services(&self, service_name: &str, schema_name: &str) -> Result<ImpactReport> {
        let dependencies = self.store.find_dependencies()?;
        Ok(analyze_impact(&dependencies, service_name, schema_name))
    }

    pub fn add_dependency(&self, dependency: Dependency) -> Result<Dependency> {
        self.store.upsert_dependency(dependency)
    }

    /// Record that the stored version `schema_id` was rolled out to `environment`
    pub fn register_deployment(&self, schema_id: u64, environment: &str) -> Result<Deployment> {
        if environment.is_empty() {
            return Err(SchemaError::missing_field("environment"));
        }
        let schema = self
            .store
            .find_by_id(schema_id)?
            .ok_or(SchemaError::NotFound(Lookup::SchemaId(schema_id)))?;

        let deployment = self
            .store
            .create_deployment(NewDeployment::of(&schema, environment))?;
        info!(
            id = deployment.id,
            identity = %schema.identity(),
            version = %schema.version,
            environment,
            "Registered deployment"
        );
        Ok(deployment)
    }

    pub fn update_deployment_status(&self, id: u64, status: DeploymentStatus) -> Result<Deployment> {
        self.store.update_deployment_status(id, status)
    }

    pub fn get_all_deployments(&self) -> Result<Vec<Deployment>> {
        self.store.find_deployments()
    }

    pub fn get_deployments_by_service(&self, service_name: &str) -> Result<Vec<Deployment>> {
        self.store.find_deployments_by_service(service_name)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
