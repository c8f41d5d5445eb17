//! Lazy, composable value generators.
//!
//! A [`Generator<T>`] is an immutable description of how to draw a `T`. It
//! holds no randomness of its own: every draw receives a [`DrawContext`]
//! wrapping the caller's RNG plus a table of values shared by key within that
//! one draw (backreferences rely on it).
//!
//! Generators are `Arc`-backed, so cloning one is cheap and clones may be
//! drawn from concurrently, each thread with its own context.
pub mod collections;
pub mod num;
pub mod text;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::OnceCell;
use rand::{Rng, RngCore};

use crate::error::DrawError;

pub use collections::{SizeRange, dictionaries, fixed_dictionaries, lists};
pub use num::{floats, integers};
pub use text::{characters, characters_except, text};

type DrawFn<T> =
    dyn for<'a, 'r> Fn(&'a mut DrawContext<'r>) -> Result<T, DrawError> + Send + Sync;

// ————————————————————————————————————————————————————————————————————————————
// SHARED KEYS
// ————————————————————————————————————————————————————————————————————————————

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(0);

/// Namespace for shared keys. Every pattern compilation takes a fresh one so
/// that group ids of unrelated patterns never alias inside a single draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope(u64);

impl Scope {
    pub fn fresh() -> Self {
        Scope(NEXT_SCOPE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn key(self, id: u32) -> SharedKey {
        SharedKey { scope: self, id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SharedKey {
    scope: Scope,
    id: u32,
}

// ————————————————————————————————————————————————————————————————————————————
// DRAW CONTEXT
// ————————————————————————————————————————————————————————————————————————————

/// State for one draw: the random source and the values already produced
/// for shared keys.
pub struct DrawContext<'r> {
    rng: &'r mut dyn RngCore,
    shared: HashMap<SharedKey, Box<dyn Any>>,
}

impl<'r> DrawContext<'r> {
    pub fn new(rng: &'r mut dyn RngCore) -> Self {
        Self { rng, shared: HashMap::new() }
    }

    pub fn rng(&mut self) -> &mut (dyn RngCore + 'r) {
        &mut *self.rng
    }

    fn forget_scope(&mut self, scope: Scope) {
        self.shared.retain(|key, _| key.scope != scope);
    }
}

// ————————————————————————————————————————————————————————————————————————————
// GENERATOR
// ————————————————————————————————————————————————————————————————————————————

pub struct Generator<T> {
    draw: Arc<DrawFn<T>>,
}

impl<T> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self { draw: Arc::clone(&self.draw) }
    }
}

impl<T> std::fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Generator<")?;
        f.write_str(std::any::type_name::<T>())?;
        f.write_str(">")
    }
}

impl<T: 'static> Generator<T> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&mut DrawContext<'_>) -> Result<T, DrawError> + Send + Sync + 'static,
    {
        Self { draw: Arc::new(f) }
    }

    pub fn draw(&self, ctx: &mut DrawContext<'_>) -> Result<T, DrawError> {
        (self.draw)(ctx)
    }

    /// Draw one value with a fresh context.
    pub fn sample<R: RngCore>(&self, rng: &mut R) -> Result<T, DrawError> {
        let mut ctx = DrawContext::new(rng);
        self.draw(&mut ctx)
    }

    /// Endless stream of independent samples.
    pub fn samples<'g, R: RngCore>(
        &'g self,
        rng: &'g mut R,
    ) -> impl Iterator<Item = Result<T, DrawError>> + 'g {
        std::iter::repeat_with(move || self.sample(&mut *rng))
    }

    pub fn map<U, F>(self, f: F) -> Generator<U>
    where
        U: 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Generator::from_fn(move |ctx| self.draw(ctx).map(&f))
    }

    /// Redraw until `keep` accepts, giving up after `max_attempts`.
    pub fn filter<F>(self, keep: F, max_attempts: usize) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Generator::from_fn(move |ctx| {
            for _ in 0..max_attempts {
                let value = self.draw(ctx)?;
                if keep(&value) {
                    return Ok(value);
                }
            }
            Err(DrawError::Unsatisfiable { attempts: max_attempts })
        })
    }

    /// Draw a single example the first time and repeat it forever after.
    pub fn once(self) -> Self
    where
        T: Clone + Send + Sync,
    {
        let cell: Arc<OnceCell<T>> = Arc::new(OnceCell::new());
        Generator::from_fn(move |ctx| cell.get_or_try_init(|| self.draw(ctx)).cloned())
    }

    /// Reuse the first value drawn under `key` for the rest of the draw.
    pub fn shared(self, key: SharedKey) -> Self
    where
        T: Clone,
    {
        Generator::from_fn(move |ctx| {
            if let Some(value) = ctx.shared.get(&key).and_then(|v| v.downcast_ref::<T>()) {
                return Ok(value.clone());
            }
            let value = self.draw(ctx)?;
            ctx.shared.insert(key, Box::new(value.clone()));
            Ok(value)
        })
    }

    /// Drop whatever `scope` shared before drawing, so sharing never leaks
    /// from one draw of this generator into the next.
    ///
    /// A draw that hit [`DrawError::UnsetGroup`] is started over, up to
    /// `max_attempts` times.
    pub fn isolated(self, scope: Scope, max_attempts: usize) -> Self {
        Generator::from_fn(move |ctx| {
            for _ in 0..max_attempts {
                ctx.forget_scope(scope);
                match self.draw(ctx) {
                    Err(DrawError::UnsetGroup { .. }) => continue,
                    other => return other,
                }
            }
            Err(DrawError::Unsatisfiable { attempts: max_attempts })
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PRIMITIVES
// ————————————————————————————————————————————————————————————————————————————

pub fn just<T>(value: T) -> Generator<T>
where
    T: Clone + Send + Sync + 'static,
{
    Generator::from_fn(move |_| Ok(value.clone()))
}

/// Pick one alternative per draw, each equally likely.
pub fn one_of<T: 'static>(alternatives: Vec<Generator<T>>) -> Generator<T> {
    Generator::from_fn(move |ctx| {
        if alternatives.is_empty() {
            return Err(DrawError::Empty);
        }
        let index = ctx.rng().gen_range(0..alternatives.len());
        alternatives[index].draw(ctx)
    })
}

/// Pick one of `values` per draw, uniformly, returning an exact clone.
pub fn sampled_from<T>(values: Vec<T>) -> Generator<T>
where
    T: Clone + Send + Sync + 'static,
{
    Generator::from_fn(move |ctx| {
        if values.is_empty() {
            return Err(DrawError::Empty);
        }
        let index = ctx.rng().gen_range(0..values.len());
        Ok(values[index].clone())
    })
}

pub fn booleans() -> Generator<bool> {
    Generator::from_fn(|ctx| Ok(ctx.rng().gen_bool(0.5)))
}

/// The value already shared under `key` in this draw. Nothing is drawn: if
/// no generator has stored one yet the draw fails with
/// [`DrawError::UnsetGroup`].
pub fn recall<T>(key: SharedKey) -> Generator<T>
where
    T: Clone + 'static,
{
    Generator::from_fn(move |ctx| {
        ctx.shared
            .get(&key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
            .ok_or(DrawError::UnsetGroup { id: key.id })
    })
}

/// Draw every part in order and join the results.
pub fn concat(parts: Vec<Generator<String>>) -> Generator<String> {
    Generator::from_fn(move |ctx| {
        let mut out = String::new();
        for part in &parts {
            out.push_str(&part.draw(ctx)?);
        }
        Ok(out)
    })
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn one_of_reaches_every_alternative() {
        let g = one_of(vec![just(1usize), just(2), just(3)]);
        let mut rng = rng();
        let mut seen = [false; 3];
        for v in g.samples(&mut rng).take(200) {
            seen[v.unwrap() - 1] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn empty_union_is_a_draw_error() {
        let g: Generator<u8> = one_of(Vec::new());
        assert_eq!(g.sample(&mut rng()), Err(DrawError::Empty));
    }

    #[test]
    fn shared_key_repeats_within_one_draw_only() {
        let key = Scope::fresh().key(1);
        let part = integers(Some(0), Some(1_000_000)).map(|n| n.to_string()).shared(key);
        let pair = Generator::from_fn(move |ctx| Ok((part.draw(ctx)?, part.draw(ctx)?)));

        let mut rng = rng();
        let mut distinct = std::collections::BTreeSet::new();
        for v in pair.samples(&mut rng).take(20) {
            let (a, b) = v.unwrap();
            assert_eq!(a, b);
            distinct.insert(a);
        }
        assert!(distinct.len() > 1, "fresh contexts must redraw shared values");
    }

    #[test]
    fn isolated_resets_its_scope_between_inner_draws() {
        let scope = Scope::fresh();
        let inner = integers(Some(0), Some(1_000_000))
            .map(|n| n.to_string())
            .shared(scope.key(1))
            .isolated(scope, 1);
        let twice = Generator::from_fn(move |ctx| Ok((inner.draw(ctx)?, inner.draw(ctx)?)));

        let mut rng = rng();
        let differs = twice
            .samples(&mut rng)
            .take(20)
            .map(Result::unwrap)
            .any(|(a, b)| a != b);
        assert!(differs);
    }

    #[test]
    fn recall_fails_until_the_key_is_drawn() {
        let key = Scope::fresh().key(4);
        let unset: Generator<u32> = recall(key);
        assert_eq!(unset.sample(&mut rng()), Err(DrawError::UnsetGroup { id: 4 }));

        let stored = just(9u32).shared(key);
        let recalled = recall::<u32>(key);
        let pair = Generator::from_fn(move |ctx| Ok((stored.draw(ctx)?, recalled.draw(ctx)?)));
        assert_eq!(pair.sample(&mut rng()), Ok((9, 9)));
    }

    #[test]
    fn isolated_starts_over_when_a_group_was_skipped() {
        let scope = Scope::fresh();
        let key = scope.key(1);
        let maybe = one_of(vec![just(1u32).shared(key).map(|_| ()), just(())]);
        let g = Generator::from_fn(move |ctx| {
            maybe.draw(ctx)?;
            recall::<u32>(key).draw(ctx)
        })
        .isolated(scope, 1_000);
        for v in g.samples(&mut rng()).take(50) {
            assert_eq!(v, Ok(1));
        }

        let never: Generator<u32> = recall::<u32>(scope.key(2)).isolated(scope, 3);
        assert_eq!(never.sample(&mut rng()), Err(DrawError::Unsatisfiable { attempts: 3 }));
    }

    #[test]
    fn once_freezes_the_first_example() {
        let g = integers(None, None).once();
        let mut rng = rng();
        let first = g.sample(&mut rng).unwrap();
        for v in g.samples(&mut rng).take(10) {
            assert_eq!(v.unwrap(), first);
        }
    }

    #[test]
    fn filter_gives_up_when_nothing_passes() {
        let g = just(3).filter(|n| *n > 3, 5);
        assert_eq!(g.sample(&mut rng()), Err(DrawError::Unsatisfiable { attempts: 5 }));
    }

    #[test]
    fn concat_keeps_part_order() {
        let g = concat(vec![just("a".to_string()), just("b".to_string())]);
        assert_eq!(g.sample(&mut rng()).unwrap(), "ab");
    }
}
