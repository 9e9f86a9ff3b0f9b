//! Partial models and the tree they form.
//!
//! A [`TruthAssignment`] maps sentences to truth values.
//! The nodes of a proof are truth assignments stored in a [`Tree`],
//! where every node implicitly contains the mappings of its ancestors.
//! Nodes refer to their parent and children by [`NodeId`],
//! so forking a branch copies only the new mappings.

use crate::change::Change;
use crate::sentence::{Context, Sentence};
use crate::truth::{InferenceNr, TruthValue};
use core::fmt::{self, Display};
use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;

/// Stable index of a node in a [`Tree`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: Self = Self(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mapping from sentences to truth values, with links to parent and children.
///
/// An assignment that is not (yet) part of a tree is called detached;
/// its links are meaningless until it is added to a tree.
#[derive(Clone, Debug, Default)]
pub struct TruthAssignment {
    id: NodeId,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    values: HashMap<Sentence, TruthValue>,
    /// constants that universal sentences were instantiated with
    instances: HashMap<Sentence, Vec<Sentence>>,
}

impl TruthAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached assignment of the given facts, all established by one inference.
    pub fn from_facts(facts: &[(Sentence, bool)], inf: InferenceNr) -> Self {
        let mut ta = Self::new();
        for (s, v) in facts {
            ta.set(*s, *v, inf);
        }
        ta
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn set(&mut self, s: Sentence, value: bool, inf: InferenceNr) -> Change {
        self.values.entry(s).or_default().set(value, inf)
    }

    pub fn set_true(&mut self, s: Sentence, inf: InferenceNr) -> Change {
        self.set(s, true, inf)
    }

    pub fn set_false(&mut self, s: Sentence, inf: InferenceNr) -> Change {
        self.set(s, false, inf)
    }

    pub fn get(&self, s: Sentence) -> Option<&TruthValue> {
        self.values.get(&s)
    }

    /// Return the value of a sentence on this node alone.
    pub fn models(&self, s: Sentence) -> Option<bool> {
        self.get(s).and_then(|tv| tv.get())
    }

    pub fn is_mapped(&self, s: Sentence) -> bool {
        self.get(s).map_or(false, |tv| tv.is_mapped())
    }

    pub fn values(&self) -> impl Iterator<Item = (Sentence, &TruthValue)> {
        self.values.iter().map(|(s, tv)| (*s, tv))
    }

    /// Return all mapped sentences with their values, ordered by sentence.
    ///
    /// A sentence mapped to both values occurs twice.
    pub fn facts(&self) -> Vec<(Sentence, bool)> {
        let values = self.values().flat_map(|(s, tv)| {
            let vs = [true, false].into_iter().filter(move |v| tv.has(*v));
            vs.map(move |v| (s, v))
        });
        let mut facts: Vec<_> = values.collect();
        facts.sort_unstable();
        facts
    }

    /// Number of mapped sentences.
    pub fn len(&self) -> usize {
        self.values.values().filter(|tv| tv.is_mapped()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return true if no sentence is mapped both to true and false on this node.
    pub fn is_consistent(&self) -> bool {
        self.values.values().all(|tv| tv.is_consistent())
    }

    pub fn decompose(&mut self, s: Sentence) -> Change {
        self.values.entry(s).or_default().decompose()
    }

    /// Record that a universal sentence was instantiated with a constant.
    pub fn instantiated(&mut self, forall: Sentence, c: Sentence) -> Change {
        let cs = self.instances.entry(forall).or_default();
        let change = !cs.contains(&c);
        if change {
            cs.push(c)
        }
        change
    }

    /// Absorb the mappings of another assignment without overwriting existing ones.
    pub fn merge(&mut self, other: &Self) -> Change {
        let mut change = false;
        for (s, tv) in other.values() {
            change |= self.values.entry(s).or_default().merge(tv);
        }
        for (forall, cs) in &other.instances {
            for c in cs {
                change |= self.instantiated(*forall, *c);
            }
        }
        change
    }
}

/// Tree of truth assignments.
///
/// Nodes are never removed; closing a branch only means that
/// its leaf is no longer consistent with its ancestors.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TruthAssignment>,
}

impl Tree {
    pub fn new(mut root: TruthAssignment) -> Self {
        root.id = NodeId::ROOT;
        root.parent = None;
        root.children.clear();
        Self {
            nodes: Vec::from([root]),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &TruthAssignment {
        &self.nodes[id.0]
    }

    fn get_mut(&mut self, id: NodeId) -> &mut TruthAssignment {
        &mut self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TruthAssignment> {
        self.nodes.iter()
    }

    /// Return a node followed by all its ancestors.
    pub fn ancestry(&self, id: NodeId) -> impl Iterator<Item = &TruthAssignment> + '_ {
        core::iter::successors(Some(self.get(id)), move |n| n.parent.map(|p| self.get(p)))
    }

    /// Return the nodes from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<_> = self.ancestry(id).map(|n| n.id).collect();
        path.reverse();
        path
    }

    /// Return true if `ancestor` is `id` or one of its ancestors.
    pub fn is_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestry(id).any(|n| n.id == ancestor)
    }

    /// Return the value of a sentence on the branch ending in `id`.
    ///
    /// The nearest node that maps the sentence decides.
    pub fn models(&self, id: NodeId, s: Sentence) -> Option<bool> {
        let tv = self.ancestry(id).find_map(|n| n.get(s).filter(|tv| tv.is_mapped()))?;
        tv.get()
    }

    pub fn is_mapped(&self, id: NodeId, s: Sentence) -> bool {
        self.ancestry(id).any(|n| n.is_mapped(s))
    }

    /// Return true if the branch ending in `id` maps `s` to `value`.
    pub fn has(&self, id: NodeId, s: Sentence, value: bool) -> bool {
        self.justification(id, s, value).is_some()
    }

    /// Return true if the sentence was decomposed on the branch ending in `id`.
    pub fn is_decomposed(&self, id: NodeId, s: Sentence) -> bool {
        let decomposed = |n: &TruthAssignment| n.get(s).map_or(false, |tv| tv.is_decomposed());
        self.ancestry(id).any(decomposed)
    }

    /// Return the inference that made `s` `value` on the branch ending in `id`.
    pub fn justification(&self, id: NodeId, s: Sentence, value: bool) -> Option<InferenceNr> {
        let just = |n: &TruthAssignment| n.get(s).and_then(|tv| tv.justification(value));
        self.ancestry(id).find_map(just)
    }

    /// Return the constants that a universal sentence was instantiated with on a branch.
    pub fn instances(&self, id: NodeId, forall: Sentence) -> HashSet<Sentence> {
        let cs = self.ancestry(id).filter_map(|n| n.instances.get(&forall));
        cs.flatten().copied().collect()
    }

    /// Find a sentence mapped on `id` whose value contradicts `id` or one of its ancestors.
    ///
    /// Return the sentence together with the node holding the opposite value.
    pub fn conflict(&self, id: NodeId) -> Option<(Sentence, NodeId)> {
        self.get(id).facts().into_iter().find_map(|(s, v)| {
            let other = self.ancestry(id).find(|n| n.get(s).map_or(false, |tv| tv.has(!v)))?;
            Some((s, other.id))
        })
    }

    /// Like [`Tree::conflict`], but for all nodes from the root down to `id`.
    ///
    /// Return the sentence, the node where it conflicts, and the node holding the opposite value.
    pub fn path_conflict(&self, id: NodeId) -> Option<(Sentence, NodeId, NodeId)> {
        let mut path = self.path(id).into_iter();
        path.find_map(|n| self.conflict(n).map(|(s, other)| (s, n, other)))
    }

    pub fn is_path_consistent(&self, id: NodeId) -> bool {
        self.path_conflict(id).is_none()
    }

    /// Return true if the node is consistent with its ancestors and,
    /// if it has children, at least one of its leaves is.
    pub fn is_consistent(&self, id: NodeId) -> bool {
        self.is_path_consistent(id) && self.is_open_below(id)
    }

    fn is_open_below(&self, id: NodeId) -> bool {
        let children = self.get(id).children.iter();
        let mut open = children.filter(|c| self.conflict(**c).is_none());
        self.get(id).children.is_empty() || open.any(|c| self.is_open_below(*c))
    }

    /// Return the consistent leaves below `id`.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        if self.is_path_consistent(id) {
            self.collect_leaves(id, &mut leaves)
        }
        leaves
    }

    fn collect_leaves(&self, id: NodeId, leaves: &mut Vec<NodeId>) {
        let node = self.get(id);
        if node.children.is_empty() {
            leaves.push(id)
        }
        for c in &node.children {
            if self.conflict(*c).is_none() {
                self.collect_leaves(*c, leaves)
            }
        }
    }

    /// Like [`Tree::leaves`], but traverse sibling subtrees in parallel.
    pub fn par_leaves(&self, id: NodeId) -> Vec<NodeId> {
        if self.is_path_consistent(id) {
            self.par_collect_leaves(id)
        } else {
            Vec::new()
        }
    }

    fn par_collect_leaves(&self, id: NodeId) -> Vec<NodeId> {
        let node = self.get(id);
        if node.children.is_empty() {
            return Vec::from([id]);
        }
        let open = node.children.par_iter().filter(|c| self.conflict(**c).is_none());
        open.flat_map(|c| self.par_collect_leaves(*c)).collect()
    }

    /// Return the sentences mapped on the branch ending in `id`, from the root downwards.
    pub fn mapped(&self, id: NodeId) -> Vec<Sentence> {
        let path = self.path(id).into_iter();
        let facts = path.flat_map(|n| self.get(n).facts().into_iter().map(|(s, _)| s));
        crate::keep_first(facts)
    }

    /// Return the ground terms visible on the branch ending in `id`.
    ///
    /// These are the constants and variable-free function applications
    /// occurring in mapped sentences, and
    /// the terms that universal sentences were instantiated with.
    pub fn ground_terms(&self, ctx: &Context, id: NodeId) -> Vec<Sentence> {
        let from_facts = self.mapped(id).into_iter().flat_map(|s| ctx.ground_terms(s));
        let instances = self.path(id).into_iter().flat_map(|n| {
            let mut inst: Vec<_> = self.get(n).instances.values().flatten().copied().collect();
            inst.sort_unstable();
            inst
        });
        crate::keep_first(from_facts.chain(instances))
    }

    /// Map `s` to `value` on `id`, unless the branch already does so.
    pub fn set(&mut self, id: NodeId, s: Sentence, value: bool, inf: InferenceNr) -> Change {
        !self.has(id, s, value) && self.get_mut(id).set(s, value, inf)
    }

    pub fn set_true(&mut self, id: NodeId, s: Sentence, inf: InferenceNr) -> Change {
        self.set(id, s, true, inf)
    }

    pub fn set_false(&mut self, id: NodeId, s: Sentence, inf: InferenceNr) -> Change {
        self.set(id, s, false, inf)
    }

    pub fn decompose(&mut self, id: NodeId, s: Sentence) -> Change {
        !self.is_decomposed(id, s) && self.get_mut(id).decompose(s)
    }

    pub fn instantiated(&mut self, id: NodeId, forall: Sentence, c: Sentence) -> Change {
        !self.instances(id, forall).contains(&c) && self.get_mut(id).instantiated(forall, c)
    }

    /// Merge a detached assignment into `id`.
    ///
    /// Mappings that the branch already has keep their original provenance.
    pub fn merge(&mut self, id: NodeId, other: &TruthAssignment) -> Change {
        let mut change = false;
        for (s, v) in other.facts() {
            let inf = other.get(s).and_then(|tv| tv.justification(v)).unwrap_or_default();
            change |= self.set(id, s, v, inf);
        }
        for (s, tv) in other.values() {
            if tv.is_decomposed() {
                change |= self.decompose(id, s);
            }
        }
        for (forall, cs) in &other.instances {
            for c in cs {
                change |= self.instantiated(id, *forall, *c);
            }
        }
        change
    }

    /// Attach copies of detached assignments as new children of `id`.
    pub fn add_children(&mut self, id: NodeId, children: &[TruthAssignment]) -> Vec<NodeId> {
        let ids: Vec<_> = (0..children.len()).map(|i| NodeId(self.nodes.len() + i)).collect();
        for (child, cid) in children.iter().zip(&ids) {
            let mut child = child.clone();
            child.id = *cid;
            child.parent = Some(id);
            child.children.clear();
            self.nodes.push(child);
        }
        self.get_mut(id).children.extend(ids.iter().copied());
        ids
    }
}
