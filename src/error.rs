//! Compile-time and draw-time failures.
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a schema or pattern from compiling.
///
/// None of these are recoverable: the caller gets no generator and should
/// treat the input as unsupported.
#[derive(Debug, Error)]
pub enum Error {
    /// A schema node has no usable `type`, `enum` or `oneOf`, or names a
    /// type outside the supported subset.
    #[error("schema node at `{path}` {reason}: {node}")]
    SchemaType {
        path: String,
        reason: String,
        node: String,
    },

    /// A schema keyword holds a value of the wrong JSON type.
    #[error("invalid schema document at `{path}`: {message}")]
    Document { path: String, message: String },

    /// Bounds or alternatives that no value can satisfy.
    #[error("schema node at `{path}` is unsatisfiable: {reason}")]
    Unsatisfiable { path: String, reason: String },

    /// A regex construct with no compilation rule.
    #[error("regex construct not implemented: {opcode}")]
    RegexUnsupportedOpcode { opcode: String },

    /// A backreference to a group that was not compiled before it.
    #[error("backreference \\{id} refers to a group that has not been compiled yet")]
    UnresolvedBackreference { id: u32 },

    #[error("invalid regex `{pattern}` at offset {offset}: {message}")]
    RegexSyntax {
        pattern: String,
        offset: usize,
        message: String,
    },
}

impl Error {
    pub(crate) fn unsupported(opcode: impl Into<String>) -> Self {
        Error::RegexUnsupportedOpcode { opcode: opcode.into() }
    }
}

/// Failures while drawing a value from an already compiled generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("nothing to choose from")]
    Empty,
    #[error("gave up after {attempts} attempts to satisfy a filter")]
    Unsatisfiable { attempts: usize },
    /// A backreference whose group was skipped in this draw, by an optional
    /// repeat or an untaken branch.
    #[error("backreference \\{id} refers to a group that did not take part in the draw")]
    UnsetGroup { id: u32 },
}
