//! [`Schema`] → [`Generator<Value>`].
//!
//! Dispatch mirrors lowering: `enum`, then `oneOf`, then the node's type.
//! Compilation is pure and only builds generators; nothing is drawn until a
//! caller samples the result.
//!
//! A string node with both `pattern` and a length bound compiles to a single
//! fixed example: one pattern sample that satisfies the bounds is drawn the
//! first time and repeated for every later draw of the same generator.
pub mod any;
pub mod object;

use serde_json::{Number, Value};

use crate::config::Config;
use crate::error::Result;
use crate::generator::{self, Generator, SizeRange};
use crate::pattern::compile_pattern;
use crate::schema::{ArraySchema, NumberSchema, Schema, StringSchema};
use crate::validate::is_valid;

pub use any::AnyValue;
pub use object::FieldSelector;

pub struct SchemaCompiler {
    config: Config,
    selector: FieldSelector,
    any: AnyValue,
}

impl SchemaCompiler {
    pub fn new(config: Config) -> Self {
        let selector = FieldSelector::new(config.optional_probability);
        let any = AnyValue::new(&config);
        Self { config, selector, any }
    }

    pub fn compile(&self, schema: &Schema) -> Result<Generator<Value>> {
        match schema {
            Schema::Enum(values) => Ok(generator::sampled_from(values.clone())),
            Schema::OneOf(alternatives) => self.compile_one_of(alternatives),
            Schema::String(string) => self.compile_string(string),
            Schema::Number(number) => Ok(self.compile_number(number)),
            Schema::Boolean => Ok(generator::booleans().map(Value::Bool)),
            Schema::Array(array) => self.compile_array(array),
            Schema::Object(object) => object::compile_object(self, object),
        }
    }

    /// A union whose draws are kept only when exactly one alternative
    /// accepts them.
    fn compile_one_of(&self, alternatives: &[Schema]) -> Result<Generator<Value>> {
        let arms = alternatives
            .iter()
            .map(|alt| self.compile(alt))
            .collect::<Result<Vec<_>>>()?;
        let alternatives = alternatives.to_vec();
        let exactly_one = move |value: &Value| alternatives.iter().filter(|alt| is_valid(value, alt)).count() == 1;
        Ok(generator::one_of(arms).filter(exactly_one, self.config.max_filter_attempts))
    }

    fn compile_string(&self, string: &StringSchema) -> Result<Generator<Value>> {
        let min = string.min_length.unwrap_or(0);

        let strings = match &string.pattern {
            Some(pattern) if string.has_length_bounds() => {
                let max = string.max_length.unwrap_or(usize::MAX);
                // unbounded repeats must be able to reach `min` on their own
                let reach = u32::try_from(min).unwrap_or(u32::MAX);
                let config = Config {
                    max_unbounded_repeat: self.config.max_unbounded_repeat.max(reach),
                    ..self.config.clone()
                };
                tracing::debug!(%pattern, min, max, "pattern with length bounds, freezing one example");
                compile_pattern(pattern, &config)?
                    .filter(move |s| (min..=max).contains(&s.chars().count()), self.config.max_filter_attempts)
                    .once()
            }
            Some(pattern) => compile_pattern(pattern, &self.config)?,
            None => generator::text(SizeRange::new(min, string.max_length, self.config.max_collection_len)),
        };
        Ok(strings.map(Value::String))
    }

    fn compile_number(&self, number: &NumberSchema) -> Generator<Value> {
        let (lo, hi) = number.integer_bounds();
        generator::integers(lo, hi).map(|n| Value::Number(Number::from(n)))
    }

    fn compile_array(&self, array: &ArraySchema) -> Result<Generator<Value>> {
        let elements = match &array.items {
            Some(items) => self.compile(items)?,
            None => self.any.generator(),
        };
        let min = array.min_items.unwrap_or(0);
        let size = SizeRange::new(min, array.max_items, self.config.max_collection_len);
        Ok(generator::lists(elements, size).map(Value::Array))
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Compile with the default [`Config`].
pub fn compile_schema(schema: &Schema) -> Result<Generator<Value>> {
    SchemaCompiler::default().compile(schema)
}

/// Lower a JSON Schema document and compile it with the default [`Config`].
pub fn generate_from_schema(document: &Value) -> Result<Generator<Value>> {
    let schema = crate::lower::lower_document(document)?;
    compile_schema(&schema)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DrawError, Error};
    use crate::validate::validate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;

    fn draws(document: Value, n: usize) -> Vec<Value> {
        let generator = generate_from_schema(&document).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        generator.samples(&mut rng).take(n).map(Result::unwrap).collect()
    }

    fn assert_conforms(document: Value, n: usize) {
        let schema = crate::lower::lower_document(&document).unwrap();
        for value in draws(document, n) {
            if let Err(violations) = validate(&value, &schema) {
                panic!("{value} violates the schema: {violations:?}");
            }
        }
    }

    #[test]
    fn required_integer_is_always_present_and_in_range() {
        let document = json!({
            "type": "object",
            "properties": {
                "age": { "type": "integer", "minimum": 0 },
                "nick": { "type": "string" }
            },
            "required": ["age"]
        });
        let values = draws(document, 100);
        let mut with_nick = 0;
        for value in &values {
            let age = value["age"].as_i64().expect("age is an integer");
            assert!(age >= 0);
            if value.get("nick").is_some() {
                with_nick += 1;
            }
        }
        assert!(with_nick > 0 && with_nick < values.len(), "optional key seen {with_nick} times");
    }

    #[test]
    fn enum_values_come_back_exactly() {
        let allowed = [json!("string"), json!("int"), json!("bool"), json!(3)];
        let values = draws(json!({ "enum": allowed }), 100);
        for value in &values {
            assert!(allowed.contains(value), "{value}");
        }
        assert!(values.contains(&json!(3)));
        assert!(values.iter().all(|v| v != &json!(3.0)));
    }

    #[test]
    fn array_length_and_items_follow_the_schema() {
        let document = json!({
            "type": "array",
            "items": { "type": "integer" },
            "minItems": 2,
            "maxItems": 4
        });
        for value in draws(document, 200) {
            let items = value.as_array().expect("array");
            assert!((2..=4).contains(&items.len()));
            assert!(items.iter().all(Value::is_i64));
        }
    }

    #[test]
    fn one_of_draws_from_every_alternative() {
        let values = draws(json!({ "oneOf": [{ "type": "boolean" }, { "type": "string", "maxLength": 3 }] }), 100);
        assert!(values.iter().any(Value::is_boolean));
        assert!(values.iter().any(Value::is_string));
    }

    #[test]
    fn one_of_keeps_only_values_matching_exactly_one_alternative() {
        let document = json!({
            "oneOf": [
                { "type": "integer", "minimum": 0, "maximum": 10 },
                { "type": "integer", "minimum": 5, "maximum": 20 }
            ]
        });
        let values = draws(document.clone(), 200);
        for value in &values {
            let n = value.as_i64().expect("integer");
            assert!((0..=4).contains(&n) || (11..=20).contains(&n), "{n} matches both alternatives");
        }
        assert_conforms(document, 200);
    }

    #[test]
    fn one_of_with_fully_overlapping_alternatives_gives_up() {
        let generator = generate_from_schema(&json!({ "oneOf": [{ "type": "integer" }, { "type": "number" }] })).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let attempts = Config::default().max_filter_attempts;
        for sample in generator.samples(&mut rng).take(5) {
            assert_eq!(sample, Err(DrawError::Unsatisfiable { attempts }));
        }
    }

    #[test]
    fn fractional_number_bounds_round_inward() {
        for value in draws(json!({ "type": "number", "minimum": 1.5, "maximum": 3.5 }), 100) {
            let n = value.as_i64().expect("integral");
            assert!((2..=3).contains(&n));
        }
    }

    #[test]
    fn pattern_alone_varies_between_draws() {
        let values = draws(json!({ "type": "string", "pattern": "a[0-9]{2,3}" }), 50);
        let re = regex::Regex::new("^a[0-9]{2,3}$").unwrap();
        assert!(values.iter().all(|v| re.is_match(v.as_str().unwrap())));
        assert!(values.iter().any(|v| v != &values[0]));
    }

    #[test]
    fn pattern_with_length_bounds_freezes_one_example() {
        let values = draws(json!({ "type": "string", "pattern": "[a-z]+", "minLength": 3, "maxLength": 5 }), 20);
        let first = values[0].as_str().unwrap();
        assert!((3..=5).contains(&first.chars().count()));
        assert!(values.iter().all(|v| v == &values[0]));
    }

    #[test]
    fn pattern_with_only_a_minimum_keeps_long_matches() {
        let values = draws(json!({ "type": "string", "pattern": "[a-z]{20}", "minLength": 1 }), 10);
        let re = regex::Regex::new("^[a-z]{20}$").unwrap();
        assert!(values.iter().all(|v| re.is_match(v.as_str().unwrap())));
    }

    #[test]
    fn pattern_minimum_beyond_the_repeat_cap_is_reachable() {
        let document = json!({ "type": "string", "pattern": "a+", "minLength": 12 });
        for value in draws(document, 10) {
            let s = value.as_str().unwrap();
            assert!(s.len() >= 12 && s.chars().all(|c| c == 'a'), "{s}");
        }
    }

    #[test]
    fn additional_properties_variants() {
        for value in draws(json!({ "type": "object", "additionalProperties": false }), 10) {
            assert_eq!(value, json!({}));
        }
        for value in draws(json!({ "type": "object", "additionalProperties": { "type": "integer" } }), 50) {
            let map = value.as_object().expect("object");
            assert!(map.len() <= Config::default().max_collection_len);
            assert!(map.iter().all(|(k, v)| !k.is_empty() && v.is_i64()));
        }
        for value in draws(json!({ "type": "object", "additionalProperties": true }), 50) {
            assert!(value.is_object());
        }
    }

    #[test]
    fn required_names_outside_properties_are_still_present() {
        for value in draws(json!({ "type": "object", "properties": {}, "required": ["id"] }), 20) {
            assert!(value.get("id").is_some(), "{value}");
        }
    }

    #[test]
    fn nested_documents_conform() {
        assert_conforms(
            json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string", "pattern": "^[A-Z]{3}-\\d{4}$" },
                    "score": { "type": "integer", "minimum": -5, "maximum": 5 },
                    "tags": { "type": "array", "items": { "enum": ["a", "b"] }, "maxItems": 3 },
                    "meta": { "type": "object", "additionalProperties": { "type": "boolean" } },
                    "kind": { "oneOf": [{ "type": "integer", "minimum": 10 }, { "type": "boolean" }] }
                },
                "required": ["id", "score"]
            }),
            200,
        );
    }

    #[test]
    fn unsupported_pattern_fails_compilation() {
        let err = generate_from_schema(&json!({ "type": "string", "pattern": "(?<=a)b" })).unwrap_err();
        assert!(matches!(err, Error::RegexUnsupportedOpcode { .. }), "{err}");
    }
}
