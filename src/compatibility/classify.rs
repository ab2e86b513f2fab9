//! Change classification
//!
//! The one table deciding which kinds of structural change break existing
//! consumers. Object and array traversal both go through [`classify`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of structural change between two schema versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    /// A property present in the old version is gone
    FieldRemoved,
    /// A property was introduced
    FieldAdded,
    /// A shared property's `type` differs
    TypeChanged,
    /// A name was added to `required`
    RequiredAdded,
    /// An allowed `enum` value was dropped
    EnumValueRemoved,
    /// An `enum` value was introduced
    EnumValueAdded,
    /// The declared item type of an array property differs
    ArrayTypeChanged,
}

/// Whether a change breaks consumers of the previous version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compatibility {
    Breaking,
    NonBreaking,
}

/// Classify a change kind
pub fn classify(kind: ChangeKind) -> Compatibility {
    match kind {
        ChangeKind::FieldRemoved
        | ChangeKind::TypeChanged
        | ChangeKind::RequiredAdded
        | ChangeKind::EnumValueRemoved => Compatibility::Breaking,
        ChangeKind::FieldAdded | ChangeKind::EnumValueAdded | ChangeKind::ArrayTypeChanged => {
            Compatibility::NonBreaking
        }
    }
}

impl ChangeKind {
    pub fn is_breaking(self) -> bool {
        classify(self) == Compatibility::Breaking
    }

    /// Wire name, e.g. `FIELD_REMOVED`
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::FieldRemoved => "FIELD_REMOVED",
            ChangeKind::FieldAdded => "FIELD_ADDED",
            ChangeKind::TypeChanged => "TYPE_CHANGED",
            ChangeKind::RequiredAdded => "REQUIRED_ADDED",
            ChangeKind::EnumValueRemoved => "ENUM_VALUE_REMOVED",
            ChangeKind::EnumValueAdded => "ENUM_VALUE_ADDED",
            ChangeKind::ArrayTypeChanged => "ARRAY_TYPE_CHANGED",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breaking_kinds() {
        for kind in [
            ChangeKind::FieldRemoved,
            ChangeKind::TypeChanged,
            ChangeKind::RequiredAdded,
            ChangeKind::EnumValueRemoved,
        ] {
            assert_eq!(classify(kind), Compatibility::Breaking, "{kind}");
        }
    }

    #[test]
    fn test_non_breaking_kinds() {
        for kind in [
            ChangeKind::FieldAdded,
            ChangeKind::EnumValueAdded,
            ChangeKind::ArrayTypeChanged,
        ] {
            assert!(!kind.is_breaking(), "{kind}");
        }
    }

    #[test]
    fn test_wire_names_match_serde() {
        let json = serde_json::to_string(&ChangeKind::ArrayTypeChanged).unwrap();
        assert_eq!(json, format!("\"{}\"", ChangeKind::ArrayTypeChanged.as_str()));
    }
}
