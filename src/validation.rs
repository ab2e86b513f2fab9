//! Payload validation
//!
//! Structural check of a runtime payload against a stored schema document:
//! required fields, declared types, nested objects, array items and enums.
//! Every mismatch becomes a [`ValidationIssue`]; validation itself never fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{contains_json, literal, Properties, SchemaDocument, SchemaNode, TypeName};

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path, with `[i]` for array elements (e.g., `orders[2].sku`)
    pub path: String,
    pub message: String,
}

/// Outcome of validating one payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Messages recorded at `path`
    pub fn messages_at<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a str> {
        self.errors
            .iter()
            .filter(move |issue| issue.path == path)
            .map(|issue| issue.message.as_str())
    }
}

/// Payload validator
#[derive(Debug, Clone)]
pub struct Validator {
    /// Also treat names in an object's `required` list as required, not only
    /// fields whose own constraint says `required: true`
    honor_required_list: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            honor_required_list: true,
        }
    }
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only per-field `required: true` markers make a field required
    pub fn markers_only(mut self) -> Self {
        self.honor_required_list = false;
        self
    }

    /// Validate `instance` against a whole schema document
    pub fn validate_document(&self, instance: &Value, schema: &SchemaDocument) -> ValidationResult {
        let mut errors = Vec::new();
        self.validate_object(instance, schema.properties(), schema.required(), "", &mut errors);
        ValidationResult::from_errors(errors)
    }

    /// Validate `instance` against a field-name to constraint mapping
    pub fn validate_properties(&self, instance: &Value, properties: &Properties) -> ValidationResult {
        let mut errors = Vec::new();
        self.validate_object(instance, properties, &[], "", &mut errors);
        ValidationResult::from_errors(errors)
    }

    fn validate_object(
        &self,
        instance: &Value,
        properties: &Properties,
        required_list: &[String],
        path: &str,
        errors: &mut Vec<ValidationIssue>,
    ) {
        for (key, constraint) in properties.iter() {
            let field_path = if path.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", path, key)
            };
            let value = instance.get(key);

            let required = constraint.marked_required
                || (self.honor_required_list && required_list.iter().any(|name| name == key));
            if required && value.map_or(true, Value::is_null) {
                errors.push(ValidationIssue {
                    path: field_path,
                    message: format!("Required field '{}' is missing", key),
                });
                continue;
            }

            let Some(value) = value else {
                continue;
            };

            if let Some(expected) = &constraint.declared_type {
                if !type_matches(expected, value) {
                    errors.push(ValidationIssue {
                        path: field_path.clone(),
                        message: format!(
                            "Type mismatch: expected {}, got {}",
                            expected,
                            runtime_kind(value)
                        ),
                    });
                }
            }

            if value.is_object() {
                if let SchemaNode::Object {
                    properties,
                    required,
                } = &constraint.node
                {
                    self.validate_object(value, properties, required, &field_path, errors);
                }
            }

            if let (Some(elements), Some(items)) = (value.as_array(), constraint.items()) {
                self.validate_items(elements, items, &field_path, errors);
            }

            check_enum(value, constraint, field_path, errors);
        }
    }

    fn validate_items(
        &self,
        elements: &[Value],
        items: &SchemaDocument,
        path: &str,
        errors: &mut Vec<ValidationIssue>,
    ) {
        for (index, item) in elements.iter().enumerate() {
            let item_path = format!("{}[{}]", path, index);

            if let Some(expected) = &items.declared_type {
                if !type_matches(expected, item) {
                    errors.push(ValidationIssue {
                        path: item_path.clone(),
                        message: format!(
                            "Type mismatch in array item: expected {}, got {}",
                            expected,
                            runtime_kind(item)
                        ),
                    });
                }
            }

            if item.is_object() && !items.properties().is_empty() {
                self.validate_object(item, items.properties(), items.required(), &item_path, errors);
            }

            check_enum(item, items, item_path, errors);
        }
    }
}

fn check_enum(
    value: &Value,
    constraint: &SchemaDocument,
    path: String,
    errors: &mut Vec<ValidationIssue>,
) {
    let Some(allowed) = constraint.enum_values() else {
        return;
    };
    if contains_json(allowed, value) {
        return;
    }

    let listed: Vec<String> = allowed.iter().map(literal).collect();
    errors.push(ValidationIssue {
        path,
        message: format!(
            "Value '{}' not in allowed enum values: {}",
            literal(value),
            listed.join(", ")
        ),
    });
}

/// Runtime kind of a JSON value, as reported in mismatch messages
pub fn runtime_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(expected: &TypeName, value: &Value) -> bool {
    match expected {
        TypeName::Object => value.is_object(),
        TypeName::Array => value.is_array(),
        TypeName::String => value.is_string(),
        TypeName::Number => value.is_number(),
        TypeName::Integer => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|n| n.fract() == 0.0)
        }
        TypeName::Boolean => value.is_boolean(),
        TypeName::Null => value.is_null(),
        TypeName::Other(name) => runtime_kind(value) == name,
    }
}

/// Validate against a field-name to constraint mapping, honoring only
/// per-field `required: true` markers
pub fn validate(instance: &Value, properties: &Properties) -> ValidationResult {
    Validator::new().validate_properties(instance, properties)
}

/// Validate against a schema document in its JSON form
pub fn validate_data_against_schema(instance: &Value, schema: &Value) -> ValidationResult {
    Validator::new().validate_document(instance, &SchemaDocument::from_value(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraints(value: Value) -> Properties {
        Properties::from_value(&value)
    }

    #[test]
    fn test_missing_required_and_type_mismatch() {
        let schema = constraints(json!({
            "id": { "type": "string", "required": true },
            "age": { "type": "number" }
        }));

        let result = validate(&json!({ "age": "30" }), &schema);

        assert!(!result.valid);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(
            result.messages_at("id").collect::<Vec<_>>(),
            vec!["Required field 'id' is missing"]
        );
        assert_eq!(
            result.messages_at("age").collect::<Vec<_>>(),
            vec!["Type mismatch: expected number, got string"]
        );
    }

    #[test]
    fn test_null_counts_as_missing_for_required_fields() {
        let schema = constraints(json!({ "id": { "type": "string", "required": true } }));
        let result = validate(&json!({ "id": null }), &schema);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "Required field 'id' is missing");
    }

    #[test]
    fn test_valid_payload() {
        let schema = constraints(json!({
            "id": { "type": "string", "required": true },
            "count": { "type": "integer" },
            "tags": { "type": "array", "items": { "type": "string" } },
            "active": { "type": "boolean" }
        }));
        let result = validate(
            &json!({ "id": "u-1", "count": 3, "tags": ["a", "b"], "active": true, "extra": 1 }),
            &schema,
        );
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn test_nested_objects_extend_path() {
        let schema = constraints(json!({
            "address": {
                "type": "object",
                "properties": {
                    "city": { "type": "string", "required": true },
                    "zip": { "type": "string" }
                }
            }
        }));
        let result = validate(&json!({ "address": { "zip": 12345 } }), &schema);

        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.messages_at("address.city").count(), 1);
        assert_eq!(
            result.messages_at("address.zip").collect::<Vec<_>>(),
            vec!["Type mismatch: expected string, got number"]
        );
    }

    #[test]
    fn test_array_items_are_checked_by_index() {
        let schema = constraints(json!({
            "orders": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": { "sku": { "type": "string", "required": true } }
                }
            }
        }));
        let result = validate(&json!({ "orders": [{ "sku": "a" }, "oops", {}] }), &schema);

        assert_eq!(
            result.messages_at("orders[1]").collect::<Vec<_>>(),
            vec!["Type mismatch in array item: expected object, got string"]
        );
        assert_eq!(
            result.messages_at("orders[2].sku").collect::<Vec<_>>(),
            vec!["Required field 'sku' is missing"]
        );
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_enum_membership() {
        let schema = constraints(json!({ "status": { "type": "string", "enum": ["active", "inactive"] } }));

        let result = validate(&json!({ "status": "deleted" }), &schema);
        assert_eq!(
            result.errors[0].message,
            "Value 'deleted' not in allowed enum values: active, inactive"
        );
        assert!(validate(&json!({ "status": "active" }), &schema).valid);
    }

    #[test]
    fn test_enum_applies_to_structured_values() {
        let schema = json!({
            "properties": {
                "mode": { "type": "object", "enum": [{ "a": 1 }] },
                "pair": { "type": "array", "enum": [["x", "y"]] }
            }
        });

        let result = validate_data_against_schema(&json!({ "mode": { "a": 2 }, "pair": ["z"] }), &schema);
        assert_eq!(
            result.messages_at("mode").collect::<Vec<_>>(),
            vec![r#"Value '{"a":2}' not in allowed enum values: {"a":1}"#]
        );
        assert_eq!(
            result.messages_at("pair").collect::<Vec<_>>(),
            vec![r#"Value '["z"]' not in allowed enum values: ["x","y"]"#]
        );

        let ok = validate_data_against_schema(&json!({ "mode": { "a": 1 }, "pair": ["x", "y"] }), &schema);
        assert!(ok.valid, "{:?}", ok.errors);
    }

    #[test]
    fn test_enum_membership_compares_numbers_by_value() {
        let schema = constraints(json!({ "n": { "type": "number", "enum": [1, 2] } }));
        assert!(validate(&json!({ "n": 1.0 }), &schema).valid);
        assert!(validate(&json!({ "n": 2 }), &schema).valid);
        assert_eq!(
            validate(&json!({ "n": 3 }), &schema).errors[0].message,
            "Value '3' not in allowed enum values: 1, 2"
        );
    }

    #[test]
    fn test_enum_on_array_items() {
        let schema = constraints(json!({
            "sizes": { "type": "array", "items": { "type": "string", "enum": ["s", "m"] } }
        }));
        let result = validate(&json!({ "sizes": ["s", "xl"] }), &schema);
        assert_eq!(
            result.messages_at("sizes[1]").collect::<Vec<_>>(),
            vec!["Value 'xl' not in allowed enum values: s, m"]
        );
    }

    #[test]
    fn test_required_list_on_document() {
        let schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "number" },
                "name": { "type": "string" }
            },
            "required": ["id", "name"]
        });

        let result = validate_data_against_schema(&json!({ "id": 1 }), &schema);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "name");

        let doc = SchemaDocument::from_value(&schema);
        let lenient = Validator::new().markers_only().validate_document(&json!({ "id": 1 }), &doc);
        assert!(lenient.valid);
    }

    #[test]
    fn test_non_object_instance_degrades() {
        let schema = constraints(json!({ "id": { "type": "string", "required": true }, "x": { "type": "string" } }));
        let result = validate(&json!("just a string"), &schema);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "id");
    }

    #[test]
    fn test_integer_accepts_whole_numbers_only() {
        let schema = constraints(json!({ "n": { "type": "integer" } }));
        assert!(validate(&json!({ "n": 4.0 }), &schema).valid);
        assert!(!validate(&json!({ "n": 4.5 }), &schema).valid);
    }
}
