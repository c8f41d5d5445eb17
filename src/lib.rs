//! Random value generators derived from JSON Schema documents and regex
//! patterns, for property-based testing.
//!
//! ```no_run
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use serde_json::json;
//!
//! let generator = schema_gen::generate_from_schema(&json!({
//!     "type": "object",
//!     "properties": { "age": { "type": "integer", "minimum": 0 } },
//!     "required": ["age"]
//! }))?;
//! let mut rng = StdRng::seed_from_u64(1);
//! let value = generator.sample(&mut rng)?;
//! assert!(value["age"].as_i64().unwrap() >= 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Supported schema keywords: `type` (string, integer, number, boolean,
//! array, object), `minLength`/`maxLength`, `pattern`, `minimum`/`maximum`,
//! `minItems`/`maxItems`, `items`, `properties`/`required`,
//! `additionalProperties`, `enum` and `oneOf`. `number` draws integers, just
//! like `integer`.
//!
//! A string with both `pattern` and a length bound is approximated by one
//! fixed example: the first pattern sample within the bounds, repeated on
//! every draw of that generator.
pub mod cli;
pub mod compiler;
pub mod config;
pub mod error;
pub mod generator;
pub mod lower;
pub mod path_de;
pub mod pattern;
pub mod schema;
pub mod validate;

pub use compiler::{SchemaCompiler, compile_schema, generate_from_schema};
pub use config::Config;
pub use error::{DrawError, Error, Result};
pub use generator::Generator;
pub use pattern::compile_pattern;
pub use schema::Schema;
pub use validate::{Violation, validate};
