//! Lightweight schema inference over arbitrary JSON values.
//!
//! Schemas are documentation only: they describe what a discovered type
//! looks like so stub responses can show callers the expected shape. They
//! are never used to validate or coerce payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::Error as _;
use serde_json::Value as JsonValue;
use serde_json::json;

pub const DEFAULT_MAX_DEPTH: usize = 3;

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];
const LIST_PREFIX: &str = "List[";

/// Field name to inferred type descriptor.
pub type Schema = BTreeMap<String, SchemaNode>;

/// Primitive classification of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Url,
    Email,
    Percentage,
    Currency,
    Boolean,
    Integer,
    Float,
    Array,
    Unknown,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Url => "url",
            FieldKind::Email => "email",
            FieldKind::Percentage => "percentage",
            FieldKind::Currency => "currency",
            FieldKind::Boolean => "boolean",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Array => "array",
            FieldKind::Unknown => "unknown",
        }
    }

    /// Unrecognised tags degrade to [`FieldKind::Unknown`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "string" => FieldKind::String,
            "url" => FieldKind::Url,
            "email" => FieldKind::Email,
            "percentage" => FieldKind::Percentage,
            "currency" => FieldKind::Currency,
            "boolean" => FieldKind::Boolean,
            "integer" => FieldKind::Integer,
            "float" => FieldKind::Float,
            "array" => FieldKind::Array,
            _ => FieldKind::Unknown,
        }
    }

    /// Placeholder value used when building example payloads.
    pub fn placeholder(self) -> JsonValue {
        match self {
            FieldKind::String => json!("example"),
            FieldKind::Url => json!("https://example.com"),
            FieldKind::Email => json!("user@example.com"),
            FieldKind::Percentage => json!("50%"),
            FieldKind::Currency => json!("$1,000"),
            FieldKind::Boolean => json!(false),
            FieldKind::Integer => json!(0),
            FieldKind::Float => json!(0.0),
            FieldKind::Array => json!([]),
            FieldKind::Unknown => JsonValue::Null,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an inferred schema.
///
/// Serialises as a type tag (`"currency"`), a nested map, or for arrays of
/// objects as `"List[<nested schema json>]"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSchemaNode")]
pub enum SchemaNode {
    Leaf(FieldKind),
    Object(Schema),
    List(Schema),
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SchemaNode::Leaf(kind) => serializer.serialize_str(kind.as_str()),
            SchemaNode::Object(schema) => schema.serialize(serializer),
            SchemaNode::List(schema) => {
                let inner = serde_json::to_string(schema).map_err(S::Error::custom)?;
                serializer.serialize_str(&format!("{LIST_PREFIX}{inner}]"))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchemaNode {
    Tag(String),
    Object(Schema),
}

impl TryFrom<RawSchemaNode> for SchemaNode {
    type Error = serde_json::Error;

    fn try_from(raw: RawSchemaNode) -> Result<Self, Self::Error> {
        match raw {
            RawSchemaNode::Object(schema) => Ok(SchemaNode::Object(schema)),
            RawSchemaNode::Tag(tag) => match tag
                .strip_prefix(LIST_PREFIX)
                .and_then(|rest| rest.strip_suffix(']'))
            {
                Some(inner) => Ok(SchemaNode::List(serde_json::from_str(inner)?)),
                None => Ok(SchemaNode::Leaf(FieldKind::from_tag(&tag))),
            },
        }
    }
}

/// Infer the schema of `value`, descending at most `max_depth` object levels.
///
/// Objects map each key to a descriptor; an array whose first element is an
/// object yields that element's schema; anything else yields an empty map.
pub fn infer_schema(value: &JsonValue, max_depth: usize) -> Schema {
    infer_at_depth(value, 0, max_depth)
}

fn infer_at_depth(value: &JsonValue, depth: usize, max_depth: usize) -> Schema {
    if depth >= max_depth {
        return Schema::new();
    }
    match value {
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, field)| (key.clone(), classify_value(field, depth, max_depth)))
            .collect(),
        JsonValue::Array(items) => match items.first() {
            Some(first @ JsonValue::Object(_)) => infer_at_depth(first, depth, max_depth),
            _ => Schema::new(),
        },
        _ => Schema::new(),
    }
}

fn classify_value(value: &JsonValue, depth: usize, max_depth: usize) -> SchemaNode {
    match value {
        JsonValue::Bool(_) => SchemaNode::Leaf(FieldKind::Boolean),
        JsonValue::Number(number) if number.is_i64() || number.is_u64() => {
            SchemaNode::Leaf(FieldKind::Integer)
        }
        JsonValue::Number(_) => SchemaNode::Leaf(FieldKind::Float),
        JsonValue::String(text) => SchemaNode::Leaf(classify_text(text)),
        JsonValue::Array(items) => match items.first() {
            Some(first @ JsonValue::Object(_)) => {
                SchemaNode::List(infer_at_depth(first, depth + 1, max_depth))
            }
            _ => SchemaNode::Leaf(FieldKind::Array),
        },
        JsonValue::Object(_) => SchemaNode::Object(infer_at_depth(value, depth + 1, max_depth)),
        JsonValue::Null => SchemaNode::Leaf(FieldKind::Unknown),
    }
}

/// First match wins: email, url, percentage, currency, then plain string.
pub fn classify_text(text: &str) -> FieldKind {
    if text.contains('@') {
        FieldKind::Email
    } else if text.starts_with("http") {
        FieldKind::Url
    } else if text.contains('%') {
        FieldKind::Percentage
    } else if text.contains(CURRENCY_SYMBOLS) {
        FieldKind::Currency
    } else {
        FieldKind::String
    }
}

/// Shallow merge: fields of `incoming` are added to `target`, overwriting
/// fields that already exist.
pub fn merge_schema(target: &mut Schema, incoming: Schema) {
    target.extend(incoming);
}

/// Build a skeleton payload with a placeholder for every schema field.
pub fn example_payload(schema: &Schema) -> JsonValue {
    let fields = schema
        .iter()
        .map(|(key, node)| {
            let value = match node {
                SchemaNode::Leaf(kind) => kind.placeholder(),
                SchemaNode::Object(nested) => example_payload(nested),
                SchemaNode::List(nested) => JsonValue::Array(vec![example_payload(nested)]),
            };
            (key.clone(), value)
        })
        .collect();
    JsonValue::Object(fields)
}
