//! Minimal CLI: (schema | regex) → samples
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde_json::Value;

use crate::compiler::SchemaCompiler;
use crate::config::Config;
use crate::path_de::from_str_with_path;
use crate::pattern::compile_pattern;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate random samples from JSON Schema documents or regex patterns
#[derive(Parser, Debug)]
#[command(name = "schema-gen", version)]
pub struct CommandLineInterface {
    /// log compiler decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// sample values conforming to JSON Schema documents (printed as NDJSON)
    Schema(SchemaOut),
    /// sample strings matching a regex pattern, one per line
    Regex(RegexOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the schema inside each document (e.g. /definitions/User)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct SampleSettings {
    /// samples per input
    #[arg(long, short = 'n', default_value_t = 10)]
    count: usize,

    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// node budget for arbitrary JSON values
    #[arg(long, default_value_t = Config::default().max_leaves)]
    max_leaves: usize,

    /// headroom for collections and strings without a maximum
    #[arg(long, default_value_t = Config::default().max_collection_len)]
    max_collection_len: usize,

    /// headroom for `*`, `+` and `{n,}`
    #[arg(long, default_value_t = Config::default().max_unbounded_repeat)]
    max_repeat: u32,

    /// probability that an optional property is present
    #[arg(long, default_value_t = Config::default().optional_probability)]
    optional_probability: f64,

    /// retries before a filter or negated class gives up
    #[arg(long, default_value_t = Config::default().max_filter_attempts)]
    max_filter_attempts: usize,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    sample_settings: SampleSettings,

    /// validate every sample against its schema before printing
    #[arg(long)]
    check: bool,

    /// output .ndjson file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RegexOut {
    /// pattern to sample from
    pattern: String,

    #[command(flatten)]
    sample_settings: SampleSettings,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<(PathBuf, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::with_capacity(source_paths.len());
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let document = from_str_with_path::<Value>(&source)
                .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
            let document = match self.json_pointer.as_deref() {
                None => document,
                Some(pointer) => document
                    .pointer(pointer)
                    .cloned()
                    .with_context(|| format!("{}: nothing at JSON pointer {pointer}", source_path.display()))?,
            };
            documents.push((source_path, document));
        }
        Ok(documents)
    }
}

impl SampleSettings {
    fn config(&self) -> Config {
        Config {
            max_leaves: self.max_leaves,
            max_collection_len: self.max_collection_len,
            max_unbounded_repeat: self.max_repeat,
            optional_probability: self.optional_probability,
            max_filter_attempts: self.max_filter_attempts,
        }
    }

    fn seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Schema(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
            Command::Regex(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                target.run()
            }
        }
    }
}

impl SchemaOut {
    fn run(&self) -> Result<()> {
        let documents = self.input_settings.load_documents()?;
        let settings = &self.sample_settings;
        let seed = settings.seed();
        let compiler = SchemaCompiler::new(settings.config());
        tracing::debug!(inputs = documents.len(), seed, "sampling schemas");

        let rendered = documents
            .par_iter()
            .enumerate()
            .map(|(index, (path, document))| {
                let mut rng = StdRng::seed_from_u64(seed ^ index as u64);
                sample_document(&compiler, document, settings.count, self.check, &mut rng)
                    .with_context(|| format!("failed to sample {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;

        let output = rendered.concat();
        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, &output).with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            print!("{output}");
        }

        let summary = format!(
            "{} samples from {} input(s), seed {seed}",
            settings.count * documents.len(),
            documents.len()
        );
        eprintln!("{} {summary}", "done".green().bold());
        Ok(())
    }
}

impl RegexOut {
    fn run(&self) -> Result<()> {
        let settings = &self.sample_settings;
        let seed = settings.seed();
        let generator = compile_pattern(&self.pattern, &settings.config())?;
        let mut rng = StdRng::seed_from_u64(seed);
        for sample in generator.samples(&mut rng).take(settings.count) {
            println!("{}", sample?);
        }
        tracing::debug!(seed, "sampled pattern");
        Ok(())
    }
}

/// NDJSON lines for one document.
fn sample_document(
    compiler: &SchemaCompiler,
    document: &Value,
    count: usize,
    check: bool,
    rng: &mut StdRng,
) -> Result<String> {
    let schema = crate::lower::lower_document(document)?;
    let generator = compiler.compile(&schema)?;
    let mut lines = String::new();
    for sample in generator.samples(rng).take(count) {
        let value = sample?;
        if check {
            if let Err(violations) = crate::validate::validate(&value, &schema) {
                let listed = violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
                bail!("sample {value} does not conform: {listed}");
            }
        }
        lines.push_str(&serde_json::to_string(&value)?);
        lines.push('\n');
    }
    Ok(lines)
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // explicitly a glob but matched nothing
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
