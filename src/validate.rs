//! Checks a JSON value against a lowered [`Schema`].
//!
//! Used to verify generated samples. Patterns are matched with the `regex`
//! crate (search semantics, as JSON Schema prescribes); a pattern that crate
//! cannot express, such as one with backreferences, is not checked.
use std::collections::HashMap;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::lower::pointer;
use crate::schema::{Additional, ArraySchema, NumberKind, NumberSchema, ObjectSchema, Schema, StringSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer into the instance.
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

pub fn validate(value: &Value, schema: &Schema) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();
    check(value, schema, "", &mut violations);
    if violations.is_empty() { Ok(()) } else { Err(violations) }
}

pub fn is_valid(value: &Value, schema: &Schema) -> bool {
    let mut violations = Vec::new();
    check(value, schema, "", &mut violations);
    violations.is_empty()
}

fn check(value: &Value, schema: &Schema, path: &str, out: &mut Vec<Violation>) {
    let mut fail = |message: String| out.push(Violation { path: path.to_string(), message });
    match schema {
        Schema::Enum(values) => {
            if !values.contains(value) {
                fail(format!("{value} is not one of the enumerated values"));
            }
        }
        Schema::OneOf(alternatives) => {
            let matching = alternatives.iter().filter(|alt| is_valid(value, alt)).count();
            if matching != 1 {
                fail(format!("{value} matches {matching} of the `oneOf` alternatives, expected exactly 1"));
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                fail(format!("{value} is not a boolean"));
            }
        }
        Schema::String(string) => match value.as_str() {
            Some(s) => check_string(s, string, &mut fail),
            None => fail(format!("{value} is not a string")),
        },
        Schema::Number(number) => check_number(value, number, &mut fail),
        Schema::Array(array) => match value.as_array() {
            Some(items) => check_array(items, array, path, out),
            None => fail(format!("{value} is not an array")),
        },
        Schema::Object(object) => match value.as_object() {
            Some(map) => check_object(map, object, path, out),
            None => fail(format!("{value} is not an object")),
        },
    }
}

fn check_string(s: &str, schema: &StringSchema, fail: &mut impl FnMut(String)) {
    let len = s.chars().count();
    if let Some(min) = schema.min_length {
        if len < min {
            fail(format!("length {len} is below minLength {min}"));
        }
    }
    if let Some(max) = schema.max_length {
        if len > max {
            fail(format!("length {len} is above maxLength {max}"));
        }
    }
    if let Some(pattern) = &schema.pattern {
        if let Some(false) = pattern_matches(pattern, s) {
            fail(format!("{s:?} does not match pattern {pattern:?}"));
        }
    }
}

fn check_number(value: &Value, schema: &NumberSchema, fail: &mut impl FnMut(String)) {
    let Some(n) = value.as_f64() else {
        fail(format!("{value} is not a number"));
        return;
    };
    if schema.kind == NumberKind::Integer && !(value.is_i64() || value.is_u64() || n.fract() == 0.0) {
        fail(format!("{value} is not an integer"));
    }
    if let Some(min) = schema.minimum {
        if n < min {
            fail(format!("{value} is below minimum {min}"));
        }
    }
    if let Some(max) = schema.maximum {
        if n > max {
            fail(format!("{value} is above maximum {max}"));
        }
    }
}

fn check_array(items: &[Value], schema: &ArraySchema, path: &str, out: &mut Vec<Violation>) {
    let len = items.len();
    if let Some(min) = schema.min_items {
        if len < min {
            out.push(Violation { path: path.to_string(), message: format!("{len} items, minItems is {min}") });
        }
    }
    if let Some(max) = schema.max_items {
        if len > max {
            out.push(Violation { path: path.to_string(), message: format!("{len} items, maxItems is {max}") });
        }
    }
    if let Some(item_schema) = &schema.items {
        for (i, item) in items.iter().enumerate() {
            check(item, item_schema, &pointer(path, &i.to_string()), out);
        }
    }
}

fn check_object(map: &serde_json::Map<String, Value>, schema: &ObjectSchema, path: &str, out: &mut Vec<Violation>) {
    match schema {
        ObjectSchema::Properties { properties, required } => {
            for name in required {
                if !map.contains_key(name) {
                    out.push(Violation { path: path.to_string(), message: format!("missing required property `{name}`") });
                }
            }
            for (name, value) in map {
                if let Some(property) = properties.get(name) {
                    check(value, property, &pointer(path, name), out);
                }
            }
        }
        ObjectSchema::Additional(Additional::Any) => {}
        ObjectSchema::Additional(Additional::Forbidden) => {
            for name in map.keys() {
                out.push(Violation { path: pointer(path, name), message: "additional property not allowed".to_string() });
            }
        }
        ObjectSchema::Additional(Additional::Schema(values)) => {
            for (name, value) in map {
                check(value, values, &pointer(path, name), out);
            }
        }
    }
}

static PATTERNS: Lazy<Mutex<HashMap<String, Option<Regex>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// `None` when the pattern cannot be checked.
fn pattern_matches(pattern: &str, s: &str) -> Option<bool> {
    let mut cache = PATTERNS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let compiled = cache.entry(pattern.to_string()).or_insert_with(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::debug!(pattern, %err, "pattern not checkable with the regex crate, skipping");
            None
        }
    });
    compiled.as_ref().map(|re| re.is_match(s))
}
