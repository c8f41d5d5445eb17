//! Regex patterns → string generators.
//!
//! [`parse`] builds the [`ast`] tree and [`compile_pattern`] turns it into a
//! [`Generator<String>`](crate::generator::Generator). Lookbehind,
//! conditionals and Unicode property classes parse but do not compile.
pub mod ast;
pub mod category;
pub mod charset;
pub mod compile;
pub mod parse;

pub use compile::compile_pattern;
pub use parse::parse;
