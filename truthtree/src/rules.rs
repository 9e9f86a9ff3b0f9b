//! Tableau rules for every kind of sentence.

use crate::assignment::{NodeId, TruthAssignment, Tree};
use crate::inference::{Inference, InferenceKind};
use crate::sentence::{Context, Kind, Sentence};
use crate::truth::InferenceNr;

type Facts = Vec<(Sentence, bool)>;

fn decomposition(facts: &[(Sentence, bool)], number: InferenceNr) -> InferenceKind {
    InferenceKind::Decomposition(TruthAssignment::from_facts(facts, number))
}

impl Context {
    /// Fire the propositional rule for a sentence on the branch ending in `node`.
    ///
    /// Return `None` if the sentence is not mapped to a unique value,
    /// if it was already decomposed on the branch, or
    /// if it is terminal or quantified.
    pub fn reason(
        &self,
        tree: &Tree,
        node: NodeId,
        s: Sentence,
        number: InferenceNr,
    ) -> Option<Inference> {
        use Kind::*;
        let kind = self.kind(s);
        if kind.is_terminal() || kind.is_quantifier() || tree.is_decomposed(node, s) {
            return None;
        }
        let value = tree.models(node, s)?;
        let justification = tree.justification(node, s, value).unwrap_or_default();

        let all = |xs: &[Sentence], v: bool| -> Facts { xs.iter().map(|x| (*x, v)).collect() };
        let each = |xs: &[Sentence], v: bool| -> Vec<Facts> {
            xs.iter().map(|x| Vec::from([(*x, v)])).collect()
        };
        let outcomes: Vec<Facts> = match (kind, value) {
            (Not(x), v) => Vec::from([Vec::from([(*x, !v)])]),
            (And(xs), true) => Vec::from([all(xs, true)]),
            (And(xs), false) => each(xs, false),
            (Or(xs), true) => each(xs, true),
            (Or(xs), false) => Vec::from([all(xs, false)]),
            (Implies(l, r), true) => Vec::from([Vec::from([(*l, false)]), Vec::from([(*r, true)])]),
            (Implies(l, r), false) => Vec::from([Vec::from([(*l, true), (*r, false)])]),
            (Iff(l, r), v) => Vec::from([
                Vec::from([(*l, true), (*r, v)]),
                Vec::from([(*l, false), (*r, !v)]),
            ]),
            (Equals(xs), _) => {
                // only reflexivity is known about equality
                let reflexive = xs.windows(2).all(|w| w[0] == w[1]);
                let facts = if reflexive { Vec::from([(s, true)]) } else { Vec::new() };
                Vec::from([facts])
            }
            _ => return None,
        };

        let kind = match outcomes.len() {
            // no alternative can hold, so the branch has to close
            0 => decomposition(&[(s, !value)], number),
            1 => decomposition(&outcomes[0], number),
            _ => {
                let children = outcomes.iter().map(|o| TruthAssignment::from_facts(o, number));
                InferenceKind::Branch(children.collect())
            }
        };
        Some(Inference {
            node,
            origin: s,
            number,
            justification,
            kind,
        })
    }

    /// Return the ground terms on the branch ending in `node` that may instantiate `var`.
    ///
    /// A function application is compatible by its result sort.
    pub fn candidates(&self, tree: &Tree, node: NodeId, var: Sentence) -> Vec<Sentence> {
        let sort = match self.sort_of(var) {
            Some(sort) => sort,
            None => return Vec::new(),
        };
        let compatible = |c: &Sentence| {
            let cs = self.sort_of(*c);
            cs.map_or(false, |cs| self.sorts().compatible(cs, sort))
        };
        tree.ground_terms(self, node).into_iter().filter(compatible).collect()
    }

    /// Return true if the quantified sentence has an instantiation left to do on a branch.
    ///
    /// This does not change the context, unlike [`Context::reason_quantifier`].
    pub fn is_open_quantifier(&self, tree: &Tree, node: NodeId, s: Sentence) -> bool {
        if tree.is_decomposed(node, s) {
            return false;
        }
        match (self.kind(s), tree.models(node, s)) {
            (Kind::ForAll(var, _), Some(true)) => {
                let candidates = self.candidates(tree, node, *var);
                let used = tree.instances(node, s);
                (candidates.is_empty() && used.is_empty())
                    || candidates.iter().any(|c| !used.contains(c))
            }
            (Kind::ForAll(..) | Kind::Exists(..), Some(_)) => true,
            _ => false,
        }
    }

    /// Fire the rule for a quantified sentence on the branch ending in `node`.
    ///
    /// This may intern new sentences and mint fresh constants.
    /// Return `None` if the sentence is not an open quantifier on the branch.
    pub fn reason_quantifier(
        &mut self,
        tree: &Tree,
        node: NodeId,
        s: Sentence,
        number: InferenceNr,
    ) -> Option<Inference> {
        use Kind::*;
        if !self.is_open_quantifier(tree, node, s) {
            return None;
        }
        let value = tree.models(node, s)?;
        let justification = tree.justification(node, s, value).unwrap_or_default();

        let kind = match (self.kind(s).clone(), value) {
            (ForAll(var, body), true) => {
                let sort = self.sort_of(var)?;
                let used = tree.instances(node, s);
                let mut constants = self.candidates(tree, node, var);
                constants.retain(|c| !used.contains(c));
                if constants.is_empty() {
                    // the domain is never empty
                    constants.push(self.mint(sort))
                }
                let facts: Facts = constants
                    .iter()
                    .map(|c| (self.substitute(body, var, *c), true))
                    .collect();
                let facts = TruthAssignment::from_facts(&facts, number);
                InferenceKind::UniversalInstantiation {
                    variable: var,
                    constants,
                    facts,
                }
            }
            (ForAll(var, body), false) => {
                let neg = self.not(body);
                decomposition(&[(self.exists(var, neg), true)], number)
            }
            (Exists(var, body), false) => {
                let neg = self.not(body);
                decomposition(&[(self.forall(var, neg), true)], number)
            }
            (Exists(var, body), true) => {
                let sort = self.sort_of(var)?;
                let mut witnesses = self.candidates(tree, node, var);
                witnesses.push(self.mint(sort));
                let children = witnesses.iter().map(|w| {
                    let facts = [(self.substitute(body, var, *w), true)];
                    TruthAssignment::from_facts(&facts, number)
                });
                let children = children.collect();
                InferenceKind::ExistentialInstantiation {
                    variable: var,
                    witnesses,
                    children,
                }
            }
            _ => return None,
        };
        Some(Inference {
            node,
            origin: s,
            number,
            justification,
            kind,
        })
    }

    /// Return the sentences on a branch that a propositional rule can still fire on.
    pub fn undecomposed(&self, tree: &Tree, leaf: NodeId) -> Vec<Sentence> {
        let mapped = tree.mapped(leaf).into_iter();
        let candidate = |s: &Sentence| {
            let kind = self.kind(*s);
            !kind.is_terminal()
                && !kind.is_quantifier()
                && !tree.is_decomposed(leaf, *s)
                && tree.models(leaf, *s).is_some()
        };
        mapped.filter(candidate).collect()
    }

    /// Return the quantified sentences on a branch that still need instantiation,
    /// together with their value.
    pub fn open_quantifiers(&self, tree: &Tree, leaf: NodeId) -> Vec<(Sentence, bool)> {
        let mapped = tree.mapped(leaf).into_iter();
        let open = mapped.filter(|s| self.is_quantifier(*s) && self.is_open_quantifier(tree, leaf, *s));
        open.filter_map(|s| Some((s, tree.models(leaf, s)?))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::Sort;

    fn root(facts: &[(Sentence, bool)]) -> Tree {
        Tree::new(TruthAssignment::from_facts(facts, 0))
    }

    #[test]
    fn terminal() {
        let mut ctx = Context::default();
        let a = ctx.atom("A");
        let tree = root(&[(a, true)]);
        assert!(ctx.reason(&tree, NodeId::ROOT, a, 1).is_none());
        assert!(ctx.undecomposed(&tree, NodeId::ROOT).is_empty());
    }

    #[test]
    fn empty_disjunction() {
        let mut ctx = Context::default();
        let bot = ctx.or(Vec::new());
        let mut tree = root(&[(bot, true)]);
        let inf = ctx.reason(&tree, NodeId::ROOT, bot, 1).unwrap();
        assert!(!inf.is_branching());
        inf.apply(&mut tree, &[]);
        assert!(tree.conflict(NodeId::ROOT).is_some());
    }

    #[test]
    fn universal_mints_once() {
        let mut ctx = Context::default();
        let x = ctx.variable("x", Sort::OBJECT);
        let px = ctx.predicate("P", Vec::from([x]));
        let all = ctx.forall(x, px);
        let mut tree = root(&[(all, true)]);
        let inf = ctx.reason_quantifier(&tree, NodeId::ROOT, all, 1).unwrap();
        assert_eq!(ctx.minted(), 1);
        inf.apply(&mut tree, &[]);
        assert!(!ctx.is_open_quantifier(&tree, NodeId::ROOT, all));
        assert!(ctx.reason_quantifier(&tree, NodeId::ROOT, all, 2).is_none());
        assert_eq!(ctx.minted(), 1);
    }

    #[test]
    fn universal_uses_function_terms() {
        let mut ctx = Context::default();
        let x = ctx.variable("x", Sort::OBJECT);
        let a = ctx.constant("a", Sort::OBJECT);
        let fa = ctx.function("f", Sort::OBJECT, Vec::from([a]));
        let px = ctx.predicate("P", Vec::from([x]));
        let pfa = ctx.predicate("P", Vec::from([fa]));
        let all = ctx.forall(x, px);
        let mut tree = root(&[(all, true), (pfa, false)]);
        assert_eq!(ctx.candidates(&tree, NodeId::ROOT, x), [fa, a]);
        let inf = ctx.reason_quantifier(&tree, NodeId::ROOT, all, 1).unwrap();
        assert_eq!(ctx.minted(), 0);
        inf.apply(&mut tree, &[]);
        assert_eq!(tree.conflict(NodeId::ROOT).map(|(s, _)| s), Some(pfa));
        assert!(!ctx.is_open_quantifier(&tree, NodeId::ROOT, all));
    }
}
