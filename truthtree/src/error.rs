//! Errors of problem reading and proof search.

use thiserror::Error;

/// What went wrong when reading a problem.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// the input is not a sequence of S-expressions
    Syntax,
    /// a top-level section is unknown or malformed
    Section,
    /// a declaration is malformed or conflicts with an earlier one
    Declaration,
    /// a formula or term is malformed
    Formula,
    /// a symbol is used with different numbers of arguments
    Arity,
    /// an undeclared sort or an argument of the wrong sort
    Sort,
}

/// User error in a problem; never retried.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind:?} error: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// An engine invariant was violated; the proof is aborted.
    #[error("engine defect: {0}")]
    Defect(String),
}
