//! Semantic tableau (truth tree) prover for
//! propositional and many-sorted first-order logic.
//!
//! Given premises and goals, the prover tries to build a model of
//! the premises that falsifies the goals.
//! If every attempt ends in a contradiction, the goals follow from the premises;
//! otherwise, a consistent and completely decomposed branch is a countermodel.
//!
//! ~~~
//! use truthtree::{parse, Context, Options, Prover, Verdict};
//! let mut ctx = Context::default();
//! let input = "(premises (implies A B) A) (goal B)";
//! let problem = parse::parse(&mut ctx, input).unwrap();
//! let mut prover = Prover::new(ctx, problem.premises, problem.goals, Options::default());
//! assert_eq!(prover.prove().unwrap(), Verdict::Valid);
//! ~~~

#![forbid(unsafe_code)]

pub mod assignment;
pub mod change;
pub mod error;
pub mod inference;
pub mod parse;
pub mod prover;
mod rules;
pub mod sentence;
pub mod sort;
mod stats;
pub mod szs;
pub mod truth;

pub use assignment::{NodeId, Tree, TruthAssignment};
pub use error::{Error, ParseError, ParseErrorKind};
pub use inference::{Inference, InferenceKind};
pub use prover::{Countermodel, Options, Prover, Verdict};
pub use sentence::{Context, Kind, Sentence};
pub use sort::{Sort, Sorts};
pub use stats::Stats;
pub use truth::{InferenceNr, TruthValue};

use core::hash::Hash;

/// Remove duplicates, keeping the first occurrence of every element.
fn keep_first<T: Copy + Eq + Hash>(iter: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = hashbrown::HashSet::new();
    iter.filter(|x| seen.insert(*x)).collect()
}
