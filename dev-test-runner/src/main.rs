//! Runs every fixture under `fixtures/` (or the globs given as arguments):
//! compile, sample, check each sample, print a colored report.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use schema_gen::path_de::from_str_with_path;
use schema_gen::{Config, Error, SchemaCompiler, compile_pattern};

#[derive(Debug, Deserialize)]
struct Fixture {
    description: String,
    #[serde(flatten)]
    subject: Subject,
    #[serde(default = "default_samples")]
    samples: usize,
    /// Name of the compile error the fixture must produce.
    #[serde(default)]
    expect_error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Subject {
    Schema(Value),
    Pattern(String),
}

fn default_samples() -> usize {
    100
}

enum Outcome {
    Pass,
    /// Samples drawn but no reference check exists for them.
    Unchecked,
    Fail(String),
}

fn main() -> Result<()> {
    let mut patterns: Vec<String> = std::env::args().skip(1).collect();
    if patterns.is_empty() {
        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("*.json");
        patterns.push(fixtures.to_string_lossy().to_string());
    }

    let mut paths = Vec::<PathBuf>::new();
    for pattern in &patterns {
        for entry in glob::glob(pattern)? {
            paths.push(entry?);
        }
    }
    paths.sort();

    let mut failures = 0usize;
    for path in &paths {
        let fixture = load_fixture(path)?;
        let name = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        match run_fixture(&fixture) {
            Outcome::Pass => eprintln!("{} {name}: {}", "PASS".green().bold(), fixture.description),
            Outcome::Unchecked => eprintln!("{} {name}: {}", "SKIP".yellow().bold(), fixture.description),
            Outcome::Fail(reason) => {
                failures += 1;
                eprintln!("{} {name}: {}", "FAIL".red().bold(), fixture.description);
                eprintln!("     {}", reason.red());
            }
        }
    }

    eprintln!();
    if failures > 0 {
        bail!("{failures} of {} fixtures failed", paths.len());
    }
    eprintln!("{}", format!("all {} fixtures passed", paths.len()).green());
    Ok(())
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    from_str_with_path(&source).with_context(|| format!("malformed fixture {}", path.display()))
}

fn run_fixture(fixture: &Fixture) -> Outcome {
    let mut rng = StdRng::seed_from_u64(0);
    let config = Config::default();

    match &fixture.subject {
        Subject::Schema(document) => {
            let compiled = schema_gen::lower::lower_document(document)
                .and_then(|schema| Ok((SchemaCompiler::new(config).compile(&schema)?, schema)));
            let (generator, schema) = match expectation(compiled, fixture.expect_error.as_deref()) {
                Ok(Some(compiled)) => compiled,
                Ok(None) => return Outcome::Pass,
                Err(reason) => return Outcome::Fail(reason),
            };
            for sample in generator.samples(&mut rng).take(fixture.samples) {
                let value = match sample {
                    Ok(value) => value,
                    Err(err) => return Outcome::Fail(format!("draw failed: {err}")),
                };
                if let Err(violations) = schema_gen::validate(&value, &schema) {
                    return Outcome::Fail(format!("{value} violates: {}", violations[0]));
                }
            }
            Outcome::Pass
        }
        Subject::Pattern(pattern) => {
            let compiled = compile_pattern(pattern, &config);
            let generator = match expectation(compiled, fixture.expect_error.as_deref()) {
                Ok(Some(generator)) => generator,
                Ok(None) => return Outcome::Pass,
                Err(reason) => return Outcome::Fail(reason),
            };
            let reference = Regex::new(&format!("^(?:{pattern})$")).ok();
            for sample in generator.samples(&mut rng).take(fixture.samples) {
                let sample = match sample {
                    Ok(sample) => sample,
                    Err(err) => return Outcome::Fail(format!("draw failed: {err}")),
                };
                if let Some(re) = &reference {
                    if !re.is_match(&sample) {
                        return Outcome::Fail(format!("{sample:?} does not match"));
                    }
                }
            }
            if reference.is_some() { Outcome::Pass } else { Outcome::Unchecked }
        }
    }
}

/// `Ok(None)` when the expected error occurred; `Err` on any mismatch.
fn expectation<T>(compiled: schema_gen::Result<T>, expected: Option<&str>) -> Result<Option<T>, String> {
    match (compiled, expected) {
        (Ok(value), None) => Ok(Some(value)),
        (Ok(_), Some(expected)) => Err(format!("compiled, but {expected} was expected")),
        (Err(err), None) => Err(format!("compile failed: {err}")),
        (Err(err), Some(expected)) if error_kind(&err) == expected => Ok(None),
        (Err(err), Some(expected)) => Err(format!("expected {expected}, got {}: {err}", error_kind(&err))),
    }
}

fn error_kind(err: &Error) -> &'static str {
    match err {
        Error::SchemaType { .. } => "SchemaType",
        Error::Document { .. } => "Document",
        Error::Unsatisfiable { .. } => "Unsatisfiable",
        Error::RegexUnsupportedOpcode { .. } => "RegexUnsupportedOpcode",
        Error::UnresolvedBackreference { .. } => "UnresolvedBackreference",
        Error::RegexSyntax { .. } => "RegexSyntax",
    }
}
