//! JSON Schema document → typed [`Schema`] IR.
//!
//! The document is first read into [`RawSchema`], a flat keyword record
//! (unknown keywords such as `title` or `description` are ignored), then
//! lowered node by node. Keyword precedence follows the compiler's dispatch
//! order: `enum`, then `oneOf`, then `type`. Every error names the JSON
//! Pointer of the offending node.
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{
    Additional, ArraySchema, NumberKind, NumberSchema, ObjectSchema, Schema, StringSchema,
};

// ————————————————————————————————————————————————————————————————————————————
// RAW KEYWORDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSchema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<RawSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, RawSchema>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<RawAdditional>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAdditional {
    Bool(bool),
    Schema(Box<RawSchema>),
}

impl RawSchema {
    /// True when the node says what kind of value it holds.
    pub fn declares_kind(&self) -> bool {
        self.type_.is_some() || self.enum_.is_some() || self.one_of.is_some()
    }

    /// `{}` or a node carrying only annotations.
    pub fn is_unconstrained(&self) -> bool {
        !self.declares_kind()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.pattern.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.min_items.is_none()
            && self.max_items.is_none()
            && self.items.is_none()
            && self.properties.is_none()
            && self.required.is_empty()
            && self.additional_properties.is_none()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// LOWERING
// ————————————————————————————————————————————————————————————————————————————

pub fn lower_document(document: &Value) -> Result<Schema> {
    let raw: RawSchema = crate::path_de::from_value_with_path(document)?;
    let schema = lower(&raw, "")?;
    tracing::debug!(kind = kind_name(&schema), "lowered schema document");
    Ok(schema)
}

pub fn lower(raw: &RawSchema, path: &str) -> Result<Schema> {
    if let Some(values) = &raw.enum_ {
        if values.is_empty() {
            return Err(unsatisfiable(path, "`enum` lists no values"));
        }
        return Ok(Schema::Enum(values.clone()));
    }

    if let Some(alternatives) = &raw.one_of {
        if alternatives.is_empty() {
            return Err(unsatisfiable(path, "`oneOf` lists no alternatives"));
        }
        let alternatives = alternatives
            .iter()
            .enumerate()
            .map(|(i, alt)| lower(alt, &pointer(&pointer(path, "oneOf"), &i.to_string())))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Schema::OneOf(alternatives));
    }

    let Some(type_) = raw.type_.as_deref() else {
        return Err(schema_type(path, "declares no `type`, `enum` or `oneOf`", raw));
    };

    match type_ {
        "string" => lower_string(raw, path),
        "integer" => lower_number(raw, path, NumberKind::Integer),
        "number" => lower_number(raw, path, NumberKind::Number),
        "boolean" => Ok(Schema::Boolean),
        "array" => lower_array(raw, path),
        "object" => lower_object(raw, path),
        other => Err(schema_type(path, &format!("has unsupported type `{other}`"), raw)),
    }
}

fn lower_string(raw: &RawSchema, path: &str) -> Result<Schema> {
    if let (Some(min), Some(max)) = (raw.min_length, raw.max_length) {
        if min > max {
            return Err(unsatisfiable(path, &format!("minLength {min} exceeds maxLength {max}")));
        }
    }
    Ok(Schema::String(StringSchema {
        min_length: raw.min_length,
        max_length: raw.max_length,
        pattern: raw.pattern.clone(),
    }))
}

fn lower_number(raw: &RawSchema, path: &str, kind: NumberKind) -> Result<Schema> {
    // 2^63: no i64 reaches a minimum above it or a maximum below its negation
    const I64_SPAN: f64 = i64::MAX as f64;
    if let Some(minimum) = raw.minimum.filter(|m| m.ceil() >= I64_SPAN) {
        return Err(unsatisfiable(path, &format!("no 64-bit integer at or above minimum {minimum:?}")));
    }
    if let Some(maximum) = raw.maximum.filter(|m| m.floor() < -I64_SPAN) {
        return Err(unsatisfiable(path, &format!("no 64-bit integer at or below maximum {maximum:?}")));
    }
    let number = NumberSchema { kind, minimum: raw.minimum, maximum: raw.maximum };
    // both kinds draw integers, so the integer range must be non-empty
    if let (Some(lo), Some(hi)) = number.integer_bounds() {
        if lo > hi {
            return Err(unsatisfiable(
                path,
                &format!("no integer between minimum {:?} and maximum {:?}", raw.minimum, raw.maximum),
            ));
        }
    }
    Ok(Schema::Number(number))
}

fn lower_array(raw: &RawSchema, path: &str) -> Result<Schema> {
    if let (Some(min), Some(max)) = (raw.min_items, raw.max_items) {
        if min > max {
            return Err(unsatisfiable(path, &format!("minItems {min} exceeds maxItems {max}")));
        }
    }
    let items = match &raw.items {
        Some(items) if items.declares_kind() => {
            Some(Box::new(lower(items, &pointer(path, "items"))?))
        }
        _ => None,
    };
    Ok(Schema::Array(ArraySchema {
        min_items: raw.min_items,
        max_items: raw.max_items,
        items,
    }))
}

fn lower_object(raw: &RawSchema, path: &str) -> Result<Schema> {
    if let Some(properties) = &raw.properties {
        let props_path = pointer(path, "properties");
        let properties = properties
            .iter()
            .map(|(name, prop)| Ok((name.clone(), lower(prop, &pointer(&props_path, name))?)))
            .collect::<Result<IndexMap<_, _>>>()?;
        let required = raw.required.iter().cloned().collect::<IndexSet<_>>();
        return Ok(Schema::Object(ObjectSchema::Properties { properties, required }));
    }

    let additional = match &raw.additional_properties {
        None => {
            return Err(schema_type(
                path,
                "is an object with neither `properties` nor `additionalProperties`",
                raw,
            ));
        }
        Some(RawAdditional::Bool(true)) => Additional::Any,
        Some(RawAdditional::Bool(false)) => Additional::Forbidden,
        Some(RawAdditional::Schema(schema)) if schema.is_unconstrained() => Additional::Any,
        Some(RawAdditional::Schema(schema)) => {
            Additional::Schema(Box::new(lower(schema, &pointer(path, "additionalProperties"))?))
        }
    };
    Ok(Schema::Object(ObjectSchema::Additional(additional)))
}

// ————————————————————————————————————————————————————————————————————————————
// UTILITIES
// ————————————————————————————————————————————————————————————————————————————

/// Append one JSON Pointer segment, escaping `~` and `/`.
pub fn pointer(path: &str, segment: &str) -> String {
    format!("{path}/{}", segment.replace('~', "~0").replace('/', "~1"))
}

fn schema_type(path: &str, reason: &str, raw: &RawSchema) -> Error {
    Error::SchemaType {
        path: display_path(path),
        reason: reason.to_string(),
        node: serde_json::to_string(raw).unwrap_or_else(|e| format!("<unprintable: {e}>")),
    }
}

fn unsatisfiable(path: &str, reason: &str) -> Error {
    Error::Unsatisfiable { path: display_path(path), reason: reason.to_string() }
}

fn display_path(path: &str) -> String {
    if path.is_empty() { "/".to_string() } else { path.to_string() }
}

fn kind_name(schema: &Schema) -> &'static str {
    match schema {
        Schema::String(_) => "string",
        Schema::Number(NumberSchema { kind: NumberKind::Integer, .. }) => "integer",
        Schema::Number(_) => "number",
        Schema::Boolean => "boolean",
        Schema::Enum(_) => "enum",
        Schema::OneOf(_) => "oneOf",
        Schema::Array(_) => "array",
        Schema::Object(_) => "object",
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
