#[cfg(feature = "serde")]
use serde::Serialize;

/// Proof search statistics.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Stats {
    /// inferences in the proof log
    pub inferences: usize,
    pub decompositions: usize,
    /// committed branches
    pub branches: usize,
    pub closures: usize,
    /// universal and existential instantiations
    pub instantiations: usize,
    /// fresh constants
    pub witnesses: usize,
    /// saturation rounds
    pub rounds: usize,
    /// nodes in the tree
    pub nodes: usize,
    pub elapsed_ms: u64,
}
