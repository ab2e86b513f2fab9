//! Schema types and structures
//!
//! A [`SchemaDocument`] is the parsed form of one stored schema version. The
//! structural keywords (`properties`, `required`, `items`) are lifted into a
//! tagged [`SchemaNode`], `type` and `enum` into fields of the document.
//! Everything else (`format`, `pattern`, `minimum`, ...) is kept verbatim in
//! [`SchemaDocument::keywords`], as is any recognized keyword the node's shape
//! cannot hold, so rendering back with [`SchemaDocument::to_value`] loses nothing.
//!
//! Parsing never fails. Keywords with an unexpected shape are treated as
//! absent so that comparison and validation degrade to "no finding".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checksum::Checksum;

/// Value of the `type` keyword
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Anything else, kept as written (including non-string `type` values)
    Other(String),
}

impl TypeName {
    /// Parse the raw `type` keyword value
    pub fn from_value(value: &Value) -> Self {
        match value.as_str() {
            Some(name) => Self::from_name(name),
            None => TypeName::Other(value.to_string()),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "object" => TypeName::Object,
            "array" => TypeName::Array,
            "string" => TypeName::String,
            "number" => TypeName::Number,
            "integer" => TypeName::Integer,
            "boolean" => TypeName::Boolean,
            "null" => TypeName::Null,
            other => TypeName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeName::Object => "object",
            TypeName::Array => "array",
            TypeName::String => "string",
            TypeName::Number => "number",
            TypeName::Integer => "integer",
            TypeName::Boolean => "boolean",
            TypeName::Null => "null",
            TypeName::Other(name) => name,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered field-name to sub-document mapping (the `properties` keyword)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, SchemaDocument)>);

impl Properties {
    /// Parse a `properties` mapping, keeping declaration order
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(map) => Self(
                map.iter()
                    .map(|(name, doc)| (name.clone(), SchemaDocument::from_value(doc)))
                    .collect(),
            ),
            None => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDocument> {
        self.0.iter().find(|(key, _)| key == name).map(|(_, doc)| doc)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaDocument)> {
        self.0.iter().map(|(name, doc)| (name.as_str(), doc))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(name, doc)| (name.clone(), doc.to_value()))
                .collect(),
        )
    }
}

impl FromIterator<(String, SchemaDocument)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, SchemaDocument)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Structural shape of a schema node
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// `type: object`, or an untyped node that declares `properties` or a `required` list
    Object {
        properties: Properties,
        required: Vec<String>,
    },
    /// `type: array`
    Array { items: Option<Box<SchemaDocument>> },
    /// Any scalar or untyped node
    Leaf,
}

/// A parsed schema document (or nested sub-document)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct SchemaDocument {
    /// The `type` keyword, if present
    pub declared_type: Option<TypeName>,
    /// Recognized structure
    pub node: SchemaNode,
    /// The `enum` keyword, whatever the node's type
    pub enum_values: Option<Vec<Value>>,
    /// Field-level `required: true` marker used by payload constraints
    pub marked_required: bool,
    /// Keywords carried for display but not interpreted, including recognized
    /// keywords the node's shape has no place for
    pub keywords: Map<String, Value>,
}

impl SchemaDocument {
    /// Parse a document from its JSON form
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::empty();
        };

        let declared_type = map.get("type").map(TypeName::from_value);
        let has_structure = map.get("properties").is_some_and(Value::is_object)
            || map.get("required").is_some_and(Value::is_array);

        let node = match declared_type {
            Some(TypeName::Object) => Self::object_node(map),
            None if has_structure => Self::object_node(map),
            Some(TypeName::Array) => SchemaNode::Array {
                items: map
                    .get("items")
                    .filter(|items| items.is_object())
                    .map(|items| Box::new(Self::from_value(items))),
            },
            _ => SchemaNode::Leaf,
        };

        let enum_values = map.get("enum").and_then(Value::as_array).cloned();
        let marked_required = map.get("required") == Some(&Value::Bool(true));

        let consumed = |key: &str, value: &Value| match key {
            "type" => value.is_string(),
            "enum" => value.is_array(),
            "required" => match &node {
                SchemaNode::Object { .. } => is_name_list(value),
                _ => marked_required,
            },
            "properties" => matches!(node, SchemaNode::Object { .. }) && value.is_object(),
            "items" => matches!(node, SchemaNode::Array { .. }) && value.is_object(),
            _ => false,
        };

        let keywords = map
            .iter()
            .filter(|&(key, value)| !consumed(key.as_str(), value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            declared_type,
            node,
            enum_values,
            marked_required,
            keywords,
        }
    }

    fn object_node(map: &Map<String, Value>) -> SchemaNode {
        SchemaNode::Object {
            properties: map
                .get("properties")
                .map(Properties::from_value)
                .unwrap_or_default(),
            required: map
                .get("required")
                .and_then(Value::as_array)
                .map(|names| {
                    names
                        .iter()
                        .filter_map(|name| name.as_str().map(String::from))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// A document with no keywords at all (`{}`)
    pub fn empty() -> Self {
        Self {
            declared_type: None,
            node: SchemaNode::Leaf,
            enum_values: None,
            marked_required: false,
            keywords: Map::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::empty()
    }

    /// Nested properties; empty unless this is an object node
    pub fn properties(&self) -> &Properties {
        static NO_PROPERTIES: Properties = Properties(Vec::new());
        match &self.node {
            SchemaNode::Object { properties, .. } => properties,
            _ => &NO_PROPERTIES,
        }
    }

    /// Names listed in the `required` keyword; empty unless this is an object node
    pub fn required(&self) -> &[String] {
        match &self.node {
            SchemaNode::Object { required, .. } => required,
            _ => &[],
        }
    }

    /// Item schema of an array node
    pub fn items(&self) -> Option<&SchemaDocument> {
        match &self.node {
            SchemaNode::Array { items } => items.as_deref(),
            _ => None,
        }
    }

    /// Allowed literal values, if the node carries `enum`
    pub fn enum_values(&self) -> Option<&[Value]> {
        self.enum_values.as_deref()
    }

    /// Type label used in change descriptions
    pub fn type_label(&self) -> &str {
        self.declared_type
            .as_ref()
            .map(TypeName::as_str)
            .unwrap_or("unspecified")
    }

    /// Render back to JSON
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(declared_type) = &self.declared_type {
            map.insert("type".to_string(), Value::String(declared_type.to_string()));
        }
        match &self.node {
            SchemaNode::Object {
                properties,
                required,
            } => {
                if !properties.is_empty() {
                    map.insert("properties".to_string(), properties.to_value());
                }
                if !required.is_empty() {
                    map.insert(
                        "required".to_string(),
                        Value::Array(required.iter().cloned().map(Value::String).collect()),
                    );
                }
            }
            SchemaNode::Array { items } => {
                if let Some(items) = items {
                    map.insert("items".to_string(), items.to_value());
                }
            }
            SchemaNode::Leaf => {}
        }
        if let Some(values) = &self.enum_values {
            map.insert("enum".to_string(), Value::Array(values.clone()));
        }
        if self.marked_required && !map.contains_key("required") {
            map.insert("required".to_string(), Value::Bool(true));
        }
        for (key, value) in &self.keywords {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

impl From<Value> for SchemaDocument {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl From<SchemaDocument> for Value {
    fn from(doc: SchemaDocument) -> Self {
        doc.to_value()
    }
}

/// Render a JSON literal the way it appears in messages: strings bare,
/// everything else as compact JSON.
pub(crate) fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// JSON equality: numbers compare by value, so `1` equals `1.0`
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(x), Some(y)) => x == y,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Whether `values` holds a JSON-equal copy of `value`
pub(crate) fn contains_json(values: &[Value], value: &Value) -> bool {
    values.iter().any(|candidate| json_eq(candidate, value))
}

fn is_name_list(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|names| names.iter().all(Value::is_string))
}

/// A stored schema version
///
/// Entries are append-only: once persisted, `content` never changes. Newer
/// versions of the same `(name, service_name)` identity get a larger `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// Store-assigned, monotonically increasing identifier
    pub id: u64,
    /// Logical schema name (e.g., "UserSchema")
    pub name: String,
    /// Free-form version label; never parsed
    pub version: String,
    /// Owning (producer) service
    pub service_name: String,
    /// The schema document as JSON
    pub content: Value,
    /// SHA256 checksum of the serialized content
    pub checksum: Checksum,
    /// When this entry was created
    pub created_at: DateTime<Utc>,
}

impl SchemaEntry {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        version: impl Into<String>,
        service_name: impl Into<String>,
        content: Value,
    ) -> Self {
        let checksum = Checksum::from_json(&content);
        Self {
            id,
            name: name.into(),
            version: version.into(),
            service_name: service_name.into(),
            content,
            checksum,
            created_at: Utc::now(),
        }
    }

    /// Parsed form of the stored content
    pub fn document(&self) -> SchemaDocument {
        SchemaDocument::from_value(&self.content)
    }

    /// Verify the checksum matches the content
    pub fn verify_checksum(&self) -> bool {
        self.checksum.verify_json(&self.content)
    }

    /// Identity key (`service/name`)
    pub fn identity(&self) -> String {
        format!("{}/{}", self.service_name, self.name)
    }
}
