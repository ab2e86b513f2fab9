//! Schema Monitor
//!
//! Tracks JSON-Schema documents published by services and tells producers,
//! at registration time, whether a new version breaks existing consumers.
//!
//! ## Features
//!
//! - **Compatibility Analysis**: recursive diff of two versions of a schema,
//!   every change classified as breaking or non-breaking
//! - **Payload Validation**: structural check of runtime payloads against a
//!   stored schema document
//! - **Append-only Registry**: versions of a `(name, service)` identity are
//!   ordered by insertion and never rewritten
//! - **Impact Analysis**: direct and transitive consumers of a schema
//! - **Deployment Tracking**: rollouts of stored versions per environment
//!
//! ## Example
//!
//! ```
//! use schema_monitor::{compare_schemas_for_breaking_changes, ChangeKind};
//! use serde_json::json;
//!
//! let old = json!({ "properties": { "id": { "type": "string" }, "email": { "type": "string" } } });
//! let new = json!({ "properties": { "id": { "type": "string" } } });
//!
//! let report = compare_schemas_for_breaking_changes(&old, &new);
//! assert!(report.has_breaking_changes);
//! assert_eq!(report.breaking[0].kind, ChangeKind::FieldRemoved);
//! assert_eq!(report.breaking[0].path, "email");
//! ```

pub mod checksum;
pub mod compatibility;
pub mod config;
pub mod deployment;
pub mod error;
pub mod impact;
pub mod registry;
pub mod schema;
pub mod store;
pub mod validation;

pub use checksum::Checksum;
pub use compatibility::{
    classify, compare_schemas_for_breaking_changes, ChangeKind, ChangeRecord, Comparator,
    ComparatorOptions, ComparisonReport, Compatibility, RequiredPathStyle,
};
pub use config::MonitorConfig;
pub use deployment::{Deployment, DeploymentStatus};
pub use error::{Lookup, Result, SchemaError};
pub use impact::ImpactReport;
pub use registry::{RegistrationResult, SchemaRecord, SchemaRegistry};
pub use schema::{SchemaDocument, SchemaEntry, SchemaNode, TypeName};
pub use store::{Dependency, FileStore, InMemoryStore, SchemaStore};
pub use validation::{validate, validate_data_against_schema, ValidationResult, Validator};
