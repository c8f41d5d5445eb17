// Strongly-typed schema IR the compilers and the validator walk. No raw
// serde_json::Value here except enum literals.
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String(StringSchema),
    Number(NumberSchema),
    Boolean,
    Enum(Vec<Value>),        // literals kept verbatim, numbers stay numbers
    OneOf(Vec<Schema>),
    Array(ArraySchema),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSchema {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

impl StringSchema {
    pub fn has_length_bounds(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    Integer,
    Number,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberSchema {
    pub kind: NumberKind,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

impl NumberSchema {
    /// Integer bounds, rounded inward. `as` saturates at the `i64` limits;
    /// lowering rejects bounds that no `i64` can reach.
    pub fn integer_bounds(&self) -> (Option<i64>, Option<i64>) {
        let lo = self.minimum.map(|m| m.ceil() as i64);
        let hi = self.maximum.map(|m| m.floor() as i64);
        (lo, hi)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySchema {
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub items: Option<Box<Schema>>, // None → any JSON value
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectSchema {
    Properties {
        properties: IndexMap<String, Schema>,
        required: IndexSet<String>,
    },
    Additional(Additional),
}

/// How an object without `properties` is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum Additional {
    Any,                 // `true` or `{}`
    Forbidden,           // `false`
    Schema(Box<Schema>),
}
