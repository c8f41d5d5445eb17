use rand::Rng;
use rand::RngCore;
use serde_json::{Map, Number, Value};

use crate::config::Config;
use crate::error::DrawError;
use crate::generator::{self, DrawContext, Generator, SizeRange};

const KEY_MAX_LEN: usize = 8;

/// Arbitrary JSON values, bounded by a per-draw node budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyValue {
    max_leaves: usize,
    max_collection_len: usize,
}

impl AnyValue {
    pub fn new(config: &Config) -> Self {
        Self { max_leaves: config.max_leaves.max(1), max_collection_len: config.max_collection_len }
    }

    pub fn generator(&self) -> Generator<Value> {
        let this = *self;
        Generator::from_fn(move |ctx| {
            let mut budget = this.max_leaves;
            this.draw_value(ctx, &mut budget)
        })
    }

    /// Only the object arm; the top-level value is always a JSON object.
    pub fn object_generator(&self) -> Generator<Value> {
        let this = *self;
        Generator::from_fn(move |ctx| {
            let mut budget = this.max_leaves;
            this.draw_object(ctx, &mut budget)
        })
    }

    fn draw_value(&self, ctx: &mut DrawContext<'_>, budget: &mut usize) -> Result<Value, DrawError> {
        let containers = *budget > 1;
        let arm = ctx.rng().gen_range(0..if containers { 7u8 } else { 5 });
        match arm {
            5 => self.draw_object(ctx, budget),
            6 => self.draw_array(ctx, budget),
            _ => {
                *budget = budget.saturating_sub(1);
                Ok(draw_scalar(ctx.rng(), arm))
            }
        }
    }

    fn draw_object(&self, ctx: &mut DrawContext<'_>, budget: &mut usize) -> Result<Value, DrawError> {
        *budget = budget.saturating_sub(1);
        let wanted = ctx.rng().gen_range(0..=self.max_collection_len);
        let mut map = Map::new();
        for _ in 0..wanted {
            if *budget == 0 {
                break;
            }
            let key = draw_key(ctx.rng());
            let value = self.draw_value(ctx, budget)?;
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }

    fn draw_array(&self, ctx: &mut DrawContext<'_>, budget: &mut usize) -> Result<Value, DrawError> {
        *budget = budget.saturating_sub(1);
        let wanted = ctx.rng().gen_range(0..=self.max_collection_len);
        let mut items = Vec::new();
        for _ in 0..wanted {
            if *budget == 0 {
                break;
            }
            items.push(self.draw_value(ctx, budget)?);
        }
        Ok(Value::Array(items))
    }
}

impl Default for AnyValue {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

fn draw_scalar(rng: &mut dyn RngCore, arm: u8) -> Value {
    match arm {
        0 => {
            let len = SizeRange::new(0, Some(KEY_MAX_LEN), 0).draw_len(rng);
            Value::String((0..len).map(|_| generator::text::draw_char(rng)).collect())
        }
        1 => Value::Bool(rng.gen_bool(0.5)),
        2 => Value::Number(Number::from(rng.gen_range(-1_000i64..=1_000))),
        3 => Number::from_f64(rng.gen_range(-1.0e6..1.0e6)).map_or(Value::Null, Value::Number),
        _ => Value::Null,
    }
}

fn draw_key(rng: &mut dyn RngCore) -> String {
    let len = SizeRange::new(0, Some(KEY_MAX_LEN), 0).draw_len(rng);
    (0..len).map(|_| generator::text::draw_char(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn count_nodes(value: &Value) -> usize {
        1 + match value {
            Value::Array(items) => items.iter().map(count_nodes).sum(),
            Value::Object(map) => map.values().map(count_nodes).sum(),
            _ => 0,
        }
    }

    #[test]
    fn node_count_stays_within_the_budget() {
        for max_leaves in [0, 1, 3, 10] {
            let config = Config { max_leaves, ..Config::default() };
            let g = AnyValue::new(&config).generator();
            let mut rng = StdRng::seed_from_u64(9);
            for value in g.samples(&mut rng).take(300) {
                let nodes = count_nodes(&value.unwrap());
                assert!(nodes <= max_leaves.max(1), "{nodes} nodes with budget {max_leaves}");
            }
        }
    }

    #[test]
    fn every_arm_shows_up() {
        let g = AnyValue::default().generator();
        let mut rng = StdRng::seed_from_u64(9);
        let values: Vec<Value> = g.samples(&mut rng).take(500).map(Result::unwrap).collect();
        assert!(values.iter().any(Value::is_string));
        assert!(values.iter().any(Value::is_boolean));
        assert!(values.iter().any(Value::is_i64));
        assert!(values.iter().any(Value::is_f64));
        assert!(values.iter().any(Value::is_null));
        assert!(values.iter().any(Value::is_array));
        assert!(values.iter().any(Value::is_object));
    }

    #[test]
    fn object_generator_only_yields_objects() {
        let g = AnyValue::default().object_generator();
        let mut rng = StdRng::seed_from_u64(9);
        assert!(g.samples(&mut rng).take(100).all(|v| v.unwrap().is_object()));
    }
}
