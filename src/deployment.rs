//! Deployment tracking
//!
//! A deployment records that a stored schema version was rolled out to an
//! environment. It references the version by id and carries a copy of the
//! version's identity, which is safe because stored versions never change.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::SchemaEntry;

/// Rollout state of a deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    /// Registered, rollout not confirmed yet
    #[default]
    Pending,
    Monitoring,
    Success,
    Failed,
    RolledBack,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "PENDING",
            DeploymentStatus::Monitoring => "MONITORING",
            DeploymentStatus::Success => "SUCCESS",
            DeploymentStatus::Failed => "FAILED",
            DeploymentStatus::RolledBack => "ROLLED_BACK",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    /// Case-insensitive; `-` and `_` are interchangeable
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(DeploymentStatus::Pending),
            "MONITORING" => Ok(DeploymentStatus::Monitoring),
            "SUCCESS" => Ok(DeploymentStatus::Success),
            "FAILED" => Ok(DeploymentStatus::Failed),
            "ROLLED_BACK" => Ok(DeploymentStatus::RolledBack),
            _ => Err(format!("unknown deployment status '{}'", s)),
        }
    }
}

/// A deployment about to be recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeployment {
    pub schema_id: u64,
    pub schema_name: String,
    pub version: String,
    pub service_name: String,
    pub environment: String,
}

impl NewDeployment {
    pub fn of(schema: &SchemaEntry, environment: impl Into<String>) -> Self {
        Self {
            schema_id: schema.id,
            schema_name: schema.name.clone(),
            version: schema.version.clone(),
            service_name: schema.service_name.clone(),
            environment: environment.into(),
        }
    }
}

/// A recorded deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: u64,
    pub schema_id: u64,
    pub schema_name: String,
    pub version: String,
    pub service_name: String,
    pub environment: String,
    pub status: DeploymentStatus,
    pub deployed_at: DateTime<Utc>,
}

impl Deployment {
    pub(crate) fn new(id: u64, deployment: NewDeployment) -> Self {
        Self {
            id,
            schema_id: deployment.schema_id,
            schema_name: deployment.schema_name,
            version: deployment.version,
            service_name: deployment.service_name,
            environment: deployment.environment,
            status: DeploymentStatus::Pending,
            deployed_at: Utc::now(),
        }
    }
}
