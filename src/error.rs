//! Error types for the schema monitor

use std::fmt;

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema monitor errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A registration record is missing one of its identity/content fields
    #[error("Missing required field: {field}")]
    Validation { field: String },

    #[error("{0}")]
    NotFound(Lookup),

    #[error("Checksum mismatch for schema record {id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        id: u64,
        expected: String,
        actual: String,
    },

    #[error("Schema immutability violation: record {id} already exists")]
    ImmutabilityViolation { id: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

/// What a failed lookup was looking for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Versions of a `(name, service)` identity
    Identity { name: String, service: String },
    /// A stored version by id
    SchemaId(u64),
    Deployment(u64),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Identity { name, service } => {
                write!(f, "Schema not found: {} for service {}", name, service)
            }
            Lookup::SchemaId(id) => write!(f, "Schema with ID {} not found", id),
            Lookup::Deployment(id) => write!(f, "Deployment {} not found", id),
        }
    }
}

impl SchemaError {
    /// Whether the failure was caused by the caller's input (a 4xx-class
    /// failure) rather than by the monitor or its storage.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SchemaError::Validation { .. } | SchemaError::NotFound(_))
    }

    pub(crate) fn missing_field(field: &str) -> Self {
        SchemaError::Validation {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_client_error() {
        let err = SchemaError::missing_field("version");
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Missing required field: version");
    }

    #[test]
    fn test_not_found_messages() {
        let err = SchemaError::NotFound(Lookup::SchemaId(7));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Schema with ID 7 not found");

        let err = SchemaError::NotFound(Lookup::Identity {
            name: "User".to_string(),
            service: "user-service".to_string(),
        });
        assert_eq!(err.to_string(), "Schema not found: User for service user-service");
    }

    #[test]
    fn test_storage_is_server_error() {
        let err = SchemaError::Storage("disk full".to_string());
        assert!(!err.is_client_error());
    }
}
