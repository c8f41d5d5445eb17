use rand::Rng;
use rand::distributions::Standard;

use super::{Generator, SizeRange};
use crate::error::DrawError;

/// Biased towards printable ASCII so samples stay readable, while still
/// reaching Latin-1 and the full scalar-value range.
pub(crate) fn draw_char<R: Rng + ?Sized>(rng: &mut R) -> char {
    match rng.gen_range(0..4u8) {
        0 | 1 => char::from(rng.gen_range(0x20u8..=0x7e)),
        2 => char::from(rng.gen_range(0u8..=0xff)),
        _ => rng.sample::<char, _>(Standard),
    }
}

pub fn characters() -> Generator<char> {
    Generator::from_fn(|ctx| Ok(draw_char(ctx.rng())))
}

/// Any character for which `excluded` is false.
pub fn characters_except<F>(excluded: F, max_attempts: usize) -> Generator<char>
where
    F: Fn(char) -> bool + Send + Sync + 'static,
{
    Generator::from_fn(move |ctx| {
        for _ in 0..max_attempts {
            let c = draw_char(ctx.rng());
            if !excluded(c) {
                return Ok(c);
            }
        }
        Err(DrawError::Unsatisfiable { attempts: max_attempts })
    })
}

/// Strings whose length, counted in `char`s, lies in `size`.
pub fn text(size: SizeRange) -> Generator<String> {
    Generator::from_fn(move |ctx| {
        let len = size.draw_len(ctx.rng());
        Ok((0..len).map(|_| draw_char(ctx.rng())).collect())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn text_length_counts_scalar_values() {
        let g = text(SizeRange::new(2, Some(5), 0));
        let mut rng = StdRng::seed_from_u64(11);
        for s in g.samples(&mut rng).take(300) {
            let n = s.unwrap().chars().count();
            assert!((2..=5).contains(&n), "length {n}");
        }
    }

    #[test]
    fn excluded_characters_never_appear() {
        let g = characters_except(|c| c.is_ascii_lowercase(), 1_000);
        let mut rng = StdRng::seed_from_u64(3);
        for c in g.samples(&mut rng).take(500) {
            assert!(!c.unwrap().is_ascii_lowercase());
        }
    }

    #[test]
    fn excluding_everything_is_unsatisfiable() {
        let g = characters_except(|_| true, 10);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(g.sample(&mut rng), Err(DrawError::Unsatisfiable { attempts: 10 }));
    }
}
