//! Ranking of pending branches.

use crate::assignment::{NodeId, Tree};
use crate::inference::Inference;
use crate::sentence::{self, Context};
use crate::truth::InferenceNr;
use core::cmp::Reverse;
use num_bigint::BigUint;

/// Precomputed key of a pending branch; the smallest key is committed first.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score {
    /// children that would not be closed immediately, over all affected leaves
    survivors: usize,
    /// number of paths that full decomposition of the children yields
    degree: BigUint,
    /// facts of the children that are already mapped on the affected leaves
    reuse: Reverse<usize>,
    recency: Reverse<InferenceNr>,
}

/// Score a pending branch with respect to the open leaves.
pub fn score(ctx: &Context, tree: &Tree, open: &[NodeId], branch: &Inference) -> Score {
    let outcomes = branch.outcomes();
    let leaves = open.iter().filter(|l| tree.is_descendant(**l, branch.node));

    let (mut survivors, mut reuse) = (0, 0);
    for leaf in leaves {
        for facts in &outcomes {
            let refuted = facts.iter().any(|(s, v)| tree.models(*leaf, *s) == Some(!v));
            survivors += usize::from(!refuted);
            reuse += facts.iter().filter(|(s, _)| tree.is_mapped(*leaf, *s)).count();
        }
    }

    let degree = sentence::outcome_paths(ctx, outcomes.iter().map(|o| o.as_slice()));
    Score {
        survivors,
        degree,
        reuse: Reverse(reuse),
        recency: Reverse(branch.number),
    }
}

#[test]
fn order() {
    let key = |survivors, degree: u32, reuse, recency| Score {
        survivors,
        degree: BigUint::from(degree),
        reuse: Reverse(reuse),
        recency: Reverse(recency),
    };
    assert!(key(1, 9, 0, 1) < key(2, 1, 5, 9));
    // smaller degree wins over more reuse
    assert!(key(1, 2, 0, 1) < key(1, 3, 5, 9));
    assert!(key(1, 2, 3, 1) < key(1, 2, 1, 9));
    // the most recent branch breaks ties
    assert!(key(1, 2, 3, 9) < key(1, 2, 3, 1));
}
