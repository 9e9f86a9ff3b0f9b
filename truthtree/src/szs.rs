//! Result vocabulary of the SZS ontology, as used by theorem proving competitions.

use crate::prover::Verdict;
use core::fmt::{self, Debug, Display};
pub use NoSuccessKind::*;
pub use SuccessKind::*;

pub struct Status<K>(pub K);

impl<K: Debug> Display for Status<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "% SZS status {:?}", self.0)
    }
}

pub struct Output<O>(pub O);

impl<O: Display> Display for Output<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "% SZS output start")?;
        write!(f, "{}", self.0)?;
        writeln!(f, "% SZS output end")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SuccessKind {
    /// the goals follow from the premises
    Theorem,
    /// the premises and the negated goals are satisfiable
    CounterSatisfiable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoSuccessKind {
    OsError,
    InputError,
    SyntaxError,
    /// an internal error of the prover
    Error,
    Timeout,
}

/// Classify the outcome of a proof search.
pub fn status(v: Verdict) -> Result<SuccessKind, NoSuccessKind> {
    match v {
        Verdict::Valid => Ok(Theorem),
        Verdict::Invalid => Ok(CounterSatisfiable),
        Verdict::Unfinished => Err(Timeout),
    }
}

impl From<&crate::Error> for NoSuccessKind {
    fn from(e: &crate::Error) -> Self {
        use crate::error::ParseErrorKind;
        match e {
            crate::Error::Parse(e) if e.kind == ParseErrorKind::Syntax => SyntaxError,
            crate::Error::Parse(_) => InputError,
            crate::Error::Defect(_) => NoSuccessKind::Error,
        }
    }
}
