use std::collections::HashMap;

use rand::Rng;

use super::ast::{Assertion, Category, ClassItem, Node};
use super::charset::CharSet;
use super::parse::parse;
use crate::config::Config;
use crate::error::{DrawError, Error, Result};
use crate::generator::{self, Generator, Scope, SizeRange};

/// Compile `pattern` into a generator of strings that match it in full.
///
/// Groups are drawn once per sample and a backreference repeats what its
/// group produced, so `(ab|cd)\1` yields `abab` or `cdcd` and never `abcd`.
/// A sample where a referenced group was skipped (`(a)?\1` taking zero
/// repeats) is drawn again, up to `max_filter_attempts` times.
pub fn compile_pattern(pattern: &str, config: &Config) -> Result<Generator<String>> {
    let nodes = parse(pattern)?;
    let mut compiler = PatternCompiler::new(config);
    let generator = compiler.compile_sequence(&nodes)?;
    tracing::debug!(pattern, groups = compiler.groups.len(), "compiled pattern");
    Ok(generator.isolated(compiler.scope, config.max_filter_attempts))
}

/// State for one pattern: its shared-key scope and, for every group compiled
/// so far, the generator a backreference to it reads from.
struct PatternCompiler<'c> {
    config: &'c Config,
    scope: Scope,
    groups: HashMap<u32, Generator<String>>,
}

impl<'c> PatternCompiler<'c> {
    fn new(config: &'c Config) -> Self {
        Self { config, scope: Scope::fresh(), groups: HashMap::new() }
    }

    fn compile_sequence(&mut self, nodes: &[Node]) -> Result<Generator<String>> {
        let mut parts = nodes.iter().map(|node| self.compile_node(node)).collect::<Result<Vec<_>>>()?;
        match parts.len() {
            1 => Ok(parts.remove(0)),
            _ => Ok(generator::concat(parts)),
        }
    }

    fn compile_node(&mut self, node: &Node) -> Result<Generator<String>> {
        let attempts = self.config.max_filter_attempts;
        match node {
            Node::Literal(c) => Ok(generator::just(c.to_string())),
            &Node::NotLiteral(excluded) => {
                Ok(generator::characters_except(move |c| c == excluded, attempts).map(String::from))
            }
            Node::AnyChar => Ok(generator::characters_except(|c| c == '\n', attempts).map(String::from)),
            Node::CharClass { items, negated } => self.compile_class(items, *negated),
            Node::Branch(alternatives) => {
                let arms = alternatives
                    .iter()
                    .map(|alt| self.compile_sequence(alt))
                    .collect::<Result<Vec<_>>>()?;
                Ok(generator::one_of(arms))
            }
            Node::Group { id, children } => {
                let body = self.compile_sequence(children)?;
                let Some(id) = *id else {
                    return Ok(body);
                };
                let key = self.scope.key(id);
                self.groups.insert(id, generator::recall(key));
                Ok(body.shared(key))
            }
            &Node::Backreference(id) => {
                self.groups.get(&id).cloned().ok_or(Error::UnresolvedBackreference { id })
            }
            Node::Repeat { min, max, children, .. } => {
                let body = self.compile_sequence(children)?;
                let size = SizeRange::new(
                    *min as usize,
                    max.map(|m| m as usize),
                    self.config.max_unbounded_repeat as usize,
                );
                Ok(generator::lists(body, size).map(|parts| parts.concat()))
            }
            Node::Assertion(assertion) => self.compile_assertion(assertion),
            Node::Conditional { group, .. } => Err(Error::unsupported(format!("conditional group (?({group})...)"))),
        }
    }

    fn compile_assertion(&mut self, assertion: &Assertion) -> Result<Generator<String>> {
        match assertion {
            Assertion::Start | Assertion::End | Assertion::WordBoundary | Assertion::NotWordBoundary => {
                Ok(generator::just(String::new()))
            }
            Assertion::Lookahead { negated: false, children } => {
                // drawn so the groups inside are set, but nothing is emitted
                Ok(self.compile_sequence(children)?.map(|_| String::new()))
            }
            Assertion::Lookahead { negated: true, children } => {
                // groups inside a failing lookahead never take part
                self.compile_sequence(children)?;
                Ok(generator::just(String::new()))
            }
            Assertion::Lookbehind { negated, .. } => {
                let sign = if *negated { '!' } else { '=' };
                Err(Error::unsupported(format!("lookbehind assertion (?<{sign}...)")))
            }
        }
    }

    fn compile_class(&self, items: &[ClassItem], negated: bool) -> Result<Generator<String>> {
        let mut ranges = Vec::with_capacity(items.len());
        let mut categories: Vec<Category> = Vec::new();
        for item in items {
            match item {
                ClassItem::Literal(c) => ranges.push((*c, *c)),
                ClassItem::Range(lo, hi) => ranges.push((*lo, *hi)),
                ClassItem::Category(category) => categories.push(*category),
                ClassItem::Property { name, negated } => {
                    let escape = if *negated { 'P' } else { 'p' };
                    return Err(Error::unsupported(format!("unicode property \\{escape}{{{name}}}")));
                }
            }
        }

        if negated {
            let set = CharSet::from_ranges(ranges);
            let excluded = move |c| set.contains(c) || categories.iter().any(|category| category.covers(c));
            let attempts = self.config.max_filter_attempts;
            return Ok(generator::characters_except(excluded, attempts).map(String::from));
        }

        let tables = categories.iter().flat_map(|category| category.table()).map(|c| (c, c));
        let set = CharSet::from_ranges(ranges.into_iter().chain(tables));
        Ok(Generator::from_fn(move |ctx| {
            let len = set.len();
            if len == 0 {
                return Err(DrawError::Empty);
            }
            let index = ctx.rng().gen_range(0..len);
            set.nth(index).map(String::from).ok_or(DrawError::Empty)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeSet;

    fn samples(pattern: &str, n: usize) -> Vec<String> {
        let g = compile_pattern(pattern, &Config::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        g.samples(&mut rng).take(n).map(Result::unwrap).collect()
    }

    #[test]
    fn samples_match_the_reference_engine() {
        let patterns = [
            "a[0-9]{2,3}",
            "[^abc]x",
            r"\d+\.\d*",
            "(foo|bar)?baz",
            r"[\w-]+@[a-z]{2,5}\.com",
            r"[^\s]+",
            r"\W\S\D",
            ".{3}",
            r"[^\d\s]{1,4}",
            "x*?y+",
            "[α-ω]{2}",
            "(?:ab|c)*",
            "^start$",
            r"\x41é\t",
            r"[\d\s_]{5}",
        ];
        for pattern in patterns {
            let re = regex::Regex::new(&format!("^(?:{pattern})$")).unwrap();
            for sample in samples(pattern, 200) {
                assert!(re.is_match(&sample), "{pattern:?} produced {sample:?}");
            }
        }
    }

    #[test]
    fn backreference_repeats_the_group() {
        let seen: BTreeSet<String> = samples(r"(ab|cd)\1", 100).into_iter().collect();
        assert_eq!(seen, BTreeSet::from(["abab".to_string(), "cdcd".to_string()]));
    }

    #[test]
    fn backreference_to_a_skipped_optional_group_is_redrawn() {
        let seen: BTreeSet<String> = samples(r"(a)?\1", 100).into_iter().collect();
        assert_eq!(seen, BTreeSet::from(["aa".to_string()]));
    }

    #[test]
    fn backreference_to_an_untaken_branch_is_redrawn() {
        let seen: BTreeSet<String> = samples(r"(?:(a)|b)\1", 100).into_iter().collect();
        assert_eq!(seen, BTreeSet::from(["aa".to_string()]));
    }

    #[test]
    fn backreference_to_a_group_that_never_takes_part_gives_up() {
        let config = Config { max_filter_attempts: 10, ..Config::default() };
        let g = compile_pattern(r"(?!(a))\1", &config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(g.sample(&mut rng), Err(DrawError::Unsatisfiable { attempts: 10 }));
    }

    #[test]
    fn named_backreference_repeats_the_group() {
        for sample in samples(r"(?P<x>[a-z]{3})-(?P=x)", 50) {
            let (left, right) = sample.split_once('-').unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn shared_groups_are_redrawn_for_each_sample() {
        let distinct: BTreeSet<String> = samples(r"(\d{6})\1", 20).into_iter().collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn groups_inside_lookahead_are_registered() {
        assert_eq!(samples(r"(?=(a))\1", 5), vec!["a"; 5]);
    }

    #[test]
    fn independent_patterns_do_not_share_groups() {
        let config = Config::default();
        let left = compile_pattern(r"(a|b)\1", &config).unwrap();
        let right = compile_pattern(r"(c|d)\1", &config).unwrap();
        let both = generator::concat(vec![left, right]);
        let mut rng = StdRng::seed_from_u64(3);
        let re = regex::Regex::new("^(?:aa|bb)(?:cc|dd)$").unwrap();
        for sample in both.samples(&mut rng).take(50) {
            assert!(re.is_match(&sample.unwrap()));
        }
    }

    #[test]
    fn unbounded_repeat_is_capped() {
        let config = Config { max_unbounded_repeat: 2, ..Config::default() };
        let g = compile_pattern("a*b+", &config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for sample in g.samples(&mut rng).take(100) {
            let sample = sample.unwrap();
            let a = sample.chars().filter(|&c| c == 'a').count();
            let b = sample.chars().filter(|&c| c == 'b').count();
            assert!(a <= 2 && (1..=3).contains(&b), "{sample}");
        }
    }

    #[test]
    fn dot_never_yields_a_newline() {
        assert!(samples(".", 1_000).iter().all(|s| s != "\n"));
    }

    #[test]
    fn unsupported_constructs_fail_loudly() {
        for pattern in ["(?<=a)b", "(?<!a)b", "(a)?(?(1)b|c)", r"\p{L}", r"[\P{Lu}x]"] {
            let err = compile_pattern(pattern, &Config::default()).unwrap_err();
            assert!(matches!(err, Error::RegexUnsupportedOpcode { .. }), "{pattern}: {err}");
        }
    }

    #[test]
    fn forward_backreference_is_unresolved() {
        let err = compile_pattern(r"\1(a)", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedBackreference { id: 1 }), "{err}");
    }

    #[test]
    fn impossible_negated_class_gives_up_at_draw_time() {
        let config = Config { max_filter_attempts: 20, ..Config::default() };
        let g = compile_pattern(r"[^\d\D]", &config).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(g.sample(&mut rng), Err(DrawError::Unsatisfiable { attempts: 20 }));
    }
}
