//! Quantifier instantiation.

use super::Prover;
use crate::assignment::NodeId;
use crate::sentence::{Kind, Sentence};
use crate::Error;
use core::cmp::Reverse;
use log::debug;
use rayon::prelude::*;
use std::collections::BinaryHeap;

/// A quantified sentence waiting to be instantiated on an open leaf.
///
/// Obligations are discharged in increasing order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Obligation {
    class: Class,
    leaf: NodeId,
    sentence: Sentence,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Class {
    /// false quantifiers turn into their dual without branching
    Dual,
    Universal,
    /// existential sentences may branch and mint
    Existential,
}

impl Prover {
    fn obligations(&self) -> BinaryHeap<Reverse<Obligation>> {
        let (ctx, tree) = (&self.ctx, &self.tree);
        let per_leaf = self.open.par_iter().flat_map_iter(|leaf| {
            let leaf = *leaf;
            let quantifiers = ctx.open_quantifiers(tree, leaf).into_iter();
            quantifiers.map(move |(sentence, value)| {
                let class = match (ctx.kind(sentence), value) {
                    (_, false) => Class::Dual,
                    (Kind::ForAll(..), true) => Class::Universal,
                    _ => Class::Existential,
                };
                Reverse(Obligation { class, leaf, sentence })
            })
        });
        per_leaf.collect::<Vec<_>>().into_iter().collect()
    }

    /// Discharge all quantifier obligations on the open leaves.
    ///
    /// Existential instantiations with several witnesses are queued as pending branches.
    /// Return true if the tree changed.
    pub(super) fn instantiate(&mut self) -> Result<bool, Error> {
        let mut queue = self.obligations();
        debug!("{} quantifier obligations", queue.len());

        let mut change = false;
        while let Some(Reverse(ob)) = queue.pop() {
            if !self.open.contains(&ob.leaf) || !self.tree.is_path_consistent(ob.leaf) {
                continue;
            }
            let number = self.next_number();
            let inf = self.ctx.reason_quantifier(&self.tree, ob.leaf, ob.sentence, number);
            let inf = inf.ok_or_else(|| {
                let s = self.ctx.display(ob.sentence);
                Error::Defect(format!("no instantiation for {} on {}", s, ob.leaf))
            })?;
            change |= !inf.is_branching();
            self.commit(inf);
        }
        Ok(change)
    }
}
