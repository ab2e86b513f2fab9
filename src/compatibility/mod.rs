//! Schema compatibility checking
//!
//! Recursively diffs two versions of a schema document and files every
//! detected change as breaking or non-breaking.
//!
//! Within one level of the document the scan order is fixed: removed
//! properties first, then added / type-changed properties (in the new
//! document's declaration order, descending into shared nested objects as
//! they are met), then newly required names.
//!
//! Array comparison is shallow: only the declared item `type` is compared,
//! item schemas are not diffed further.

pub mod classify;
pub mod report;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::schema::{contains_json, literal, SchemaDocument, SchemaNode, TypeName};

pub use classify::{classify, ChangeKind, Compatibility};
pub use report::{content_diff, ChangeDetail, ChangeRecord, ComparisonReport, ComparisonSummary};

/// How the path of a `REQUIRED_ADDED` record is built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredPathStyle {
    /// The bare field name, whatever the nesting depth
    #[default]
    Bare,
    /// The dotted path of the field, like every other change kind
    Qualified,
}

/// Comparator settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparatorOptions {
    #[serde(default)]
    pub required_path: RequiredPathStyle,
}

/// Compares two versions of a schema document
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    options: ComparatorOptions,
}

impl Comparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ComparatorOptions) -> Self {
        Self { options }
    }

    /// Report `REQUIRED_ADDED` at the field's dotted path
    pub fn qualified_required_paths(mut self) -> Self {
        self.options.required_path = RequiredPathStyle::Qualified;
        self
    }

    pub fn options(&self) -> ComparatorOptions {
        self.options
    }

    /// Compare `old` against `new`
    pub fn compare(&self, old: &SchemaDocument, new: &SchemaDocument) -> ComparisonReport {
        let mut report = ComparisonReport::default();
        self.compare_objects(old, new, "", &mut report);
        let report = report.finish();

        debug!(
            breaking = report.summary.breaking_changes_count,
            non_breaking = report.summary.non_breaking_changes_count,
            "Compared schema versions"
        );
        report
    }

    fn compare_objects(
        &self,
        old: &SchemaDocument,
        new: &SchemaDocument,
        path: &str,
        report: &mut ComparisonReport,
    ) {
        let old_props = old.properties();
        let new_props = new.properties();

        for (name, _) in old_props.iter() {
            if !new_props.contains(name) {
                report.push(ChangeRecord::new(
                    ChangeKind::FieldRemoved,
                    join_path(path, name),
                    format!("Field '{}' was removed", name),
                ));
            }
        }

        for (name, new_prop) in new_props.iter() {
            let prop_path = join_path(path, name);

            let Some(old_prop) = old_props.get(name) else {
                report.push(ChangeRecord::new(
                    ChangeKind::FieldAdded,
                    prop_path,
                    format!("Field '{}' was added", name),
                ));
                continue;
            };

            if old_prop.declared_type != new_prop.declared_type {
                report.push(
                    ChangeRecord::new(
                        ChangeKind::TypeChanged,
                        prop_path,
                        format!(
                            "Type changed from '{}' to '{}'",
                            old_prop.type_label(),
                            new_prop.type_label()
                        ),
                    )
                    .with_detail(type_str(old_prop), type_str(new_prop)),
                );
                continue;
            }

            match (&old_prop.node, &new_prop.node) {
                (SchemaNode::Object { .. }, _) | (_, SchemaNode::Object { .. }) => {
                    self.compare_objects(old_prop, new_prop, &prop_path, report);
                }
                (SchemaNode::Array { .. }, SchemaNode::Array { .. }) => {
                    compare_array_items(old_prop, new_prop, &prop_path, report);
                }
                _ => {}
            }
            compare_enums(old_prop, new_prop, &prop_path, report);
        }

        let old_required = old.required();
        for field in new.required() {
            if !old_required.contains(field) {
                let field_path = match self.options.required_path {
                    RequiredPathStyle::Bare => field.clone(),
                    RequiredPathStyle::Qualified => join_path(path, field),
                };
                report.push(ChangeRecord::new(
                    ChangeKind::RequiredAdded,
                    field_path,
                    format!("Field '{}' is now required", field),
                ));
            }
        }
    }
}

fn compare_array_items(
    old: &SchemaDocument,
    new: &SchemaDocument,
    path: &str,
    report: &mut ComparisonReport,
) {
    let (Some(old_items), Some(new_items)) = (old.items(), new.items()) else {
        return;
    };
    if old_items.is_empty() || new_items.is_empty() {
        return;
    }

    if old_items.declared_type != new_items.declared_type {
        report.push(
            ChangeRecord::new(
                ChangeKind::ArrayTypeChanged,
                path,
                format!(
                    "Array item type changed from '{}' to '{}'",
                    old_items.type_label(),
                    new_items.type_label()
                ),
            )
            .with_detail(type_str(old_items), type_str(new_items)),
        );
    }
}

fn compare_enums(old: &SchemaDocument, new: &SchemaDocument, path: &str, report: &mut ComparisonReport) {
    let (Some(old_values), Some(new_values)) = (old.enum_values(), new.enum_values()) else {
        return;
    };

    for value in old_values.iter().filter(|v| !contains_json(new_values, v)) {
        report.push(ChangeRecord::new(
            ChangeKind::EnumValueRemoved,
            path,
            format!("Enum value '{}' was removed", literal(value)),
        ));
    }
    for value in new_values.iter().filter(|v| !contains_json(old_values, v)) {
        report.push(ChangeRecord::new(
            ChangeKind::EnumValueAdded,
            path,
            format!("Enum value '{}' was added", literal(value)),
        ));
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn type_str(doc: &SchemaDocument) -> Option<&str> {
    doc.declared_type.as_ref().map(TypeName::as_str)
}

/// Compare two schema contents in their JSON form with default options
pub fn compare_schemas_for_breaking_changes(old: &Value, new: &Value) -> ComparisonReport {
    Comparator::new().compare(
        &SchemaDocument::from_value(old),
        &SchemaDocument::from_value(new),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compare(old: Value, new: Value) -> ComparisonReport {
        compare_schemas_for_breaking_changes(&old, &new)
    }

    fn paths(report: &ComparisonReport, kind: ChangeKind) -> Vec<&str> {
        report.of_kind(kind).map(|c| c.path.as_str()).collect()
    }

    #[test]
    fn test_identical_documents_yield_empty_report() {
        let doc = json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "status": { "type": "string", "enum": ["active", "inactive"] },
                "tags": { "type": "array", "items": { "type": "string" } },
                "address": {
                    "type": "object",
                    "properties": { "city": { "type": "string" } },
                    "required": ["city"]
                }
            },
            "required": ["id"]
        });

        let report = compare(doc.clone(), doc);
        assert!(report.is_empty());
        assert!(!report.has_breaking_changes);
        assert_eq!(report.summary, ComparisonSummary::default());
    }

    #[test]
    fn test_removed_field_is_breaking() {
        let report = compare(
            json!({ "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" },
                "email": { "type": "string" }
            }}),
            json!({ "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" }
            }}),
        );

        assert!(report.has_breaking_changes);
        assert_eq!(report.breaking.len(), 1);
        assert_eq!(report.breaking[0].kind, ChangeKind::FieldRemoved);
        assert_eq!(report.breaking[0].path, "email");
        assert!(report.non_breaking.is_empty());
    }

    #[test]
    fn test_added_field_is_not_breaking() {
        let report = compare(
            json!({ "properties": { "id": { "type": "string" }, "name": { "type": "string" } } }),
            json!({ "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" },
                "phone": { "type": "string" }
            }}),
        );

        assert!(!report.has_breaking_changes);
        assert_eq!(report.non_breaking.len(), 1);
        assert_eq!(report.non_breaking[0].kind, ChangeKind::FieldAdded);
        assert_eq!(report.non_breaking[0].path, "phone");
    }

    #[test]
    fn test_type_change_carries_detail_and_stops_recursion() {
        let report = compare(
            json!({ "properties": {
                "age": { "type": "string" },
                "meta": { "type": "object", "properties": { "a": { "type": "string" } } }
            }}),
            json!({ "properties": {
                "age": { "type": "number" },
                "meta": { "type": "string" }
            }}),
        );

        assert!(report.has_breaking_changes);
        assert_eq!(paths(&report, ChangeKind::TypeChanged), vec!["age", "meta"]);
        assert_eq!(report.breaking.len(), 2);

        let age = &report.breaking[0];
        assert_eq!(age.description, "Type changed from 'string' to 'number'");
        assert_eq!(
            age.detail,
            Some(ChangeDetail {
                old_type: Some("string".to_string()),
                new_type: Some("number".to_string()),
            })
        );
    }

    #[test]
    fn test_required_added_on_existing_field() {
        let props = json!({
            "id": { "type": "string" },
            "name": { "type": "string" },
            "email": { "type": "string" }
        });
        let report = compare(
            json!({ "properties": props.clone(), "required": ["id", "name"] }),
            json!({ "properties": props, "required": ["id", "name", "email"] }),
        );

        assert!(report.has_breaking_changes);
        assert_eq!(report.breaking.len(), 1);
        assert_eq!(report.breaking[0].kind, ChangeKind::RequiredAdded);
        assert_eq!(report.breaking[0].path, "email");
    }

    #[test]
    fn test_nested_changes_use_dotted_paths() {
        let report = compare(
            json!({ "properties": { "address": {
                "type": "object",
                "properties": { "city": { "type": "string" }, "zip": { "type": "string" } }
            }}}),
            json!({ "properties": { "address": {
                "type": "object",
                "properties": { "city": { "type": "string" }, "country": { "type": "string" } },
                "required": ["city"]
            }}}),
        );

        assert_eq!(paths(&report, ChangeKind::FieldRemoved), vec!["address.zip"]);
        assert_eq!(paths(&report, ChangeKind::FieldAdded), vec!["address.country"]);
        assert_eq!(paths(&report, ChangeKind::RequiredAdded), vec!["city"]);
    }

    #[test]
    fn test_qualified_required_paths() {
        let old = SchemaDocument::from_value(&json!({ "properties": { "address": {
            "type": "object",
            "properties": { "city": { "type": "string" } }
        }}}));
        let new = SchemaDocument::from_value(&json!({ "properties": { "address": {
            "type": "object",
            "properties": { "city": { "type": "string" } },
            "required": ["city"]
        }}}));

        let report = Comparator::new().qualified_required_paths().compare(&old, &new);
        assert_eq!(paths(&report, ChangeKind::RequiredAdded), vec!["address.city"]);
    }

    #[test]
    fn test_array_item_type_change_is_not_breaking() {
        let report = compare(
            json!({ "properties": { "tags": { "type": "array", "items": { "type": "string" } } } }),
            json!({ "properties": { "tags": { "type": "array", "items": { "type": "number" } } } }),
        );

        assert!(!report.has_breaking_changes);
        assert_eq!(paths(&report, ChangeKind::ArrayTypeChanged), vec!["tags"]);
    }

    #[test]
    fn test_array_items_are_compared_shallowly() {
        let report = compare(
            json!({ "properties": { "rows": { "type": "array", "items": {
                "type": "object", "properties": { "a": { "type": "string" } }
            }}}}),
            json!({ "properties": { "rows": { "type": "array", "items": {
                "type": "object", "properties": { "b": { "type": "number" } }
            }}}}),
        );
        assert!(report.is_empty());

        let report = compare(
            json!({ "properties": { "rows": { "type": "array", "items": {} } } }),
            json!({ "properties": { "rows": { "type": "array", "items": { "type": "number" } } } }),
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_enum_value_changes() {
        let report = compare(
            json!({ "properties": { "status": { "type": "string", "enum": ["active", "inactive", "banned"] } } }),
            json!({ "properties": { "status": { "type": "string", "enum": ["active", "inactive", "pending"] } } }),
        );

        assert!(report.has_breaking_changes);
        let removed: Vec<_> = report.of_kind(ChangeKind::EnumValueRemoved).collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].path, "status");
        assert_eq!(removed[0].description, "Enum value 'banned' was removed");
        assert_eq!(report.of_kind(ChangeKind::EnumValueAdded).count(), 1);
    }

    #[test]
    fn test_numerically_equal_enum_values_are_unchanged() {
        let report = compare(
            json!({ "properties": { "level": { "type": "number", "enum": [1, 2] } } }),
            json!({ "properties": { "level": { "type": "number", "enum": [1.0, 2.0] } } }),
        );
        assert_eq!(report, ComparisonReport::default());
    }

    #[test]
    fn test_enum_changes_on_structured_fields() {
        let report = compare(
            json!({ "properties": { "pair": { "type": "array", "items": { "type": "string" }, "enum": [["x", "y"]] } } }),
            json!({ "properties": { "pair": { "type": "array", "items": { "type": "string" }, "enum": [["x", "z"]] } } }),
        );

        assert_eq!(paths(&report, ChangeKind::EnumValueRemoved), vec!["pair"]);
        assert_eq!(paths(&report, ChangeKind::EnumValueAdded), vec!["pair"]);
        assert_eq!(report.of_kind(ChangeKind::ArrayTypeChanged).count(), 0);
    }

    #[test]
    fn test_missing_sections_are_treated_as_empty() {
        let report = compare(json!({}), json!({ "required": ["id"] }));
        assert_eq!(paths(&report, ChangeKind::RequiredAdded), vec!["id"]);

        let report = compare(json!("garbage"), json!(null));
        assert!(report.is_empty());
    }

    #[test]
    fn test_scan_order_within_a_level() {
        let report = compare(
            json!({ "properties": { "a": { "type": "string" }, "b": { "type": "string" } } }),
            json!({
                "properties": { "b": { "type": "number" }, "c": { "type": "string" } },
                "required": ["c"]
            }),
        );

        let breaking: Vec<_> = report.breaking.iter().map(|c| c.kind).collect();
        assert_eq!(
            breaking,
            vec![ChangeKind::FieldRemoved, ChangeKind::TypeChanged, ChangeKind::RequiredAdded]
        );
        assert_eq!(report.summary.breaking_changes_count, 3);
        assert_eq!(report.summary.non_breaking_changes_count, 1);
    }
}
