use indexmap::IndexSet;
use rand::Rng;
use serde_json::{Map, Value};

use super::SchemaCompiler;
use crate::error::Result;
use crate::generator::{self, Generator, SizeRange};
use crate::schema::{Additional, ObjectSchema};

/// Decides, per property and per draw, whether a key appears.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSelector {
    optional_probability: f64,
}

impl FieldSelector {
    /// Probabilities outside `[0, 1]` are clamped; NaN counts as `0`.
    pub fn new(optional_probability: f64) -> Self {
        let p = if optional_probability.is_nan() { 0.0 } else { optional_probability.clamp(0.0, 1.0) };
        Self { optional_probability: p }
    }

    pub fn include<R: Rng + ?Sized>(&self, name: &str, required: &IndexSet<String>, rng: &mut R) -> bool {
        required.contains(name) || rng.gen_bool(self.optional_probability)
    }
}

impl Default for FieldSelector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

pub(super) fn compile_object(compiler: &SchemaCompiler, object: &ObjectSchema) -> Result<Generator<Value>> {
    match object {
        ObjectSchema::Properties { properties, required } => {
            let mut entries = properties
                .iter()
                .map(|(name, schema)| Ok((name.clone(), compiler.compile(schema)?)))
                .collect::<Result<Vec<_>>>()?;
            for name in required.iter().filter(|name| !properties.contains_key(*name)) {
                tracing::trace!(%name, "required name without a declared property, using any-values");
                entries.push((name.clone(), compiler.any.generator()));
            }

            let selector = compiler.selector;
            let required = required.clone();
            let fields = generator::fixed_dictionaries(entries, move |name, rng| {
                selector.include(name, &required, rng)
            });
            Ok(fields.map(|map| Value::Object(map.into_iter().collect())))
        }
        ObjectSchema::Additional(Additional::Any) => Ok(compiler.any.object_generator()),
        ObjectSchema::Additional(Additional::Forbidden) => Ok(generator::just(Value::Object(Map::new()))),
        ObjectSchema::Additional(Additional::Schema(schema)) => {
            let values = compiler.compile(schema)?;
            let max = compiler.config.max_collection_len;
            let keys = generator::text(SizeRange::new(1, Some(max.max(1)), 0));
            let map = generator::dictionaries(keys, values, SizeRange::new(0, Some(max), 0));
            Ok(map.map(|map| Value::Object(map.into_iter().collect())))
        }
    }
}
