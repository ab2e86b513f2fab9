//! Content checksums for stored schema versions
//!
//! The file store records the checksum of each version when it is appended
//! and re-checks it on load, so any edit to a persisted document is caught.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex-encoded SHA256 of a schema's serialized content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    /// Checksum of the compact JSON serialization of `value`
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self::from_bytes(value.to_string().as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn verify_json(&self, value: &serde_json::Value) -> bool {
        *self == Self::from_json(value)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_is_stable() {
        let content = json!({ "type": "object", "properties": { "id": { "type": "string" } } });
        assert_eq!(Checksum::from_json(&content), Checksum::from_json(&content.clone()));
        assert_eq!(Checksum::from_json(&content).as_str().len(), 64);
    }

    #[test]
    fn test_checksum_detects_edits() {
        let original = json!({ "properties": { "id": { "type": "string" } } });
        let edited = json!({ "properties": { "id": { "type": "number" } } });
        let checksum = Checksum::from_json(&original);
        assert!(checksum.verify_json(&original));
        assert!(!checksum.verify_json(&edited));
    }
}
