use indexmap::IndexMap;
use rand::{Rng, RngCore};

use super::Generator;
use crate::error::DrawError;

/// Key draws allowed per wanted entry before a map gives up on reaching
/// its minimum size.
const KEY_ATTEMPTS_PER_ENTRY: usize = 10;

/// Inclusive bounds on the length of a collection or string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    min: usize,
    max: usize,
}

impl SizeRange {
    /// A missing `max` is unbounded, capped at `min + headroom`. A `max`
    /// below `min` is raised to `min`; callers reject such bounds earlier.
    pub fn new(min: usize, max: Option<usize>, headroom: usize) -> Self {
        let max = max.unwrap_or_else(|| min.saturating_add(headroom));
        Self { min, max: max.max(min) }
    }

    pub fn min(&self) -> usize {
        self.min
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }

    pub(crate) fn draw_len<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

/// Sequences of independently drawn elements.
pub fn lists<T: 'static>(elements: Generator<T>, size: SizeRange) -> Generator<Vec<T>> {
    Generator::from_fn(move |ctx| {
        let len = size.draw_len(ctx.rng());
        (0..len).map(|_| elements.draw(ctx)).collect()
    })
}

/// Maps with distinct drawn keys; the entry count lies in `size`.
pub fn dictionaries<V: 'static>(
    keys: Generator<String>,
    values: Generator<V>,
    size: SizeRange,
) -> Generator<IndexMap<String, V>> {
    Generator::from_fn(move |ctx| {
        let target = size.draw_len(ctx.rng());
        let attempts = (target + 1) * KEY_ATTEMPTS_PER_ENTRY;
        let mut out = IndexMap::with_capacity(target);
        for _ in 0..attempts {
            if out.len() == target {
                break;
            }
            let key = keys.draw(ctx)?;
            if out.contains_key(&key) {
                continue;
            }
            let value = values.draw(ctx)?;
            out.insert(key, value);
        }
        if out.len() < size.min() {
            return Err(DrawError::Unsatisfiable { attempts });
        }
        Ok(out)
    })
}

/// Maps over a fixed key list. `include` decides per key and per draw
/// whether the entry is present.
pub fn fixed_dictionaries<V, F>(
    entries: Vec<(String, Generator<V>)>,
    include: F,
) -> Generator<IndexMap<String, V>>
where
    V: 'static,
    F: Fn(&str, &mut dyn RngCore) -> bool + Send + Sync + 'static,
{
    Generator::from_fn(move |ctx| {
        let mut out = IndexMap::with_capacity(entries.len());
        for (key, value) in &entries {
            if include(key.as_str(), ctx.rng()) {
                out.insert(key.clone(), value.draw(ctx)?);
            }
        }
        Ok(out)
    })
}
