/// Tuning knobs shared by the schema and pattern compilers.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Node budget for one any-value draw. Once spent, only scalars are produced.
    pub max_leaves: usize,
    /// Headroom above the minimum for collections and text with no declared maximum.
    pub max_collection_len: usize,
    /// Headroom above the minimum for `*`, `+` and `{n,}`.
    pub max_unbounded_repeat: u32,
    /// Probability that an optional object property is present in a draw.
    pub optional_probability: f64,
    /// Retry ceiling for filters and negated character classes.
    pub max_filter_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_leaves: 10,
            max_collection_len: 8,
            max_unbounded_repeat: 8,
            optional_probability: 0.5,
            max_filter_attempts: 1_000,
        }
    }
}
