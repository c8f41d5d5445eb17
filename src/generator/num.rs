use rand::Rng;

use super::Generator;

/// Width of the window drawn near a bound (or near zero) instead of across
/// the whole `i64` range.
const NEAR: i64 = 1_000;

/// Integers in `[min, max]`; a missing bound leaves that side open.
///
/// Half-open and open ranges alternate between a small window next to the
/// bound and the full remaining range, so both small and extreme values turn
/// up.
pub fn integers(min: Option<i64>, max: Option<i64>) -> Generator<i64> {
    let lo = min.unwrap_or(i64::MIN);
    let hi = max.unwrap_or(i64::MAX);
    let near = match (min, max) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) => (lo, lo.saturating_add(NEAR)),
        (None, Some(hi)) => (hi.saturating_sub(NEAR), hi),
        (None, None) => (-NEAR, NEAR),
    };
    Generator::from_fn(move |ctx| {
        let rng = ctx.rng();
        let (lo, hi) = if rng.gen_bool(0.5) { near } else { (lo, hi) };
        Ok(rng.gen_range(lo..=hi))
    })
}

/// Finite floats only; JSON has no NaN or infinity.
pub fn floats() -> Generator<f64> {
    Generator::from_fn(|ctx| {
        let rng = ctx.rng();
        let f = match rng.gen_range(0..3u8) {
            0 => rng.gen_range(-1.0..1.0),
            1 => rng.gen_range(-1.0e9..1.0e9),
            _ => {
                let f = f64::from_bits(rng.next_u64());
                if f.is_finite() { f } else { 0.0 }
            }
        };
        Ok(f)
    })
}
