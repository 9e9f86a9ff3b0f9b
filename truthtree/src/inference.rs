//! Effects of firing a tableau rule.

use crate::assignment::{NodeId, TruthAssignment, Tree};
use crate::change::Change;
use crate::sentence::{Context, Sentence};
use crate::truth::InferenceNr;
use core::fmt::{self, Display};

/// A single tableau step.
#[derive(Clone, Debug)]
pub struct Inference {
    /// node on which the rule fired
    pub node: NodeId,
    /// sentence that the rule fired on
    pub origin: Sentence,
    /// position of the step in the proof
    pub number: InferenceNr,
    /// step that established the value of the origin
    pub justification: InferenceNr,
    pub kind: InferenceKind,
}

#[derive(Clone, Debug)]
pub enum InferenceKind {
    /// new facts for the node itself
    Decomposition(TruthAssignment),
    /// alternative children for every open leaf below the node
    Branch(Vec<TruthAssignment>),
    /// the node contradicts the `conflict` node on the origin
    Closure { conflict: NodeId },
    /// instances of a universal sentence for the given constants
    UniversalInstantiation {
        variable: Sentence,
        constants: Vec<Sentence>,
        facts: TruthAssignment,
    },
    /// one alternative per witness of an existential sentence
    ExistentialInstantiation {
        variable: Sentence,
        witnesses: Vec<Sentence>,
        children: Vec<TruthAssignment>,
    },
}

impl Inference {
    /// Return the facts of each alternative outcome.
    ///
    /// A closure has no outcome, any deterministic step has exactly one.
    pub fn outcomes(&self) -> Vec<Vec<(Sentence, bool)>> {
        use InferenceKind::*;
        match &self.kind {
            Decomposition(ta) | UniversalInstantiation { facts: ta, .. } => Vec::from([ta.facts()]),
            Branch(tas) | ExistentialInstantiation { children: tas, .. } => {
                tas.iter().map(|ta| ta.facts()).collect()
            }
            Closure { .. } => Vec::new(),
        }
    }

    /// Return true if the step creates new children when applied.
    pub fn is_branching(&self) -> bool {
        use InferenceKind::*;
        match &self.kind {
            Branch(_) => true,
            ExistentialInstantiation { children, .. } => children.len() > 1,
            Decomposition(_) | UniversalInstantiation { .. } | Closure { .. } => false,
        }
    }

    /// Apply the step to a tree.
    ///
    /// Deterministic steps change the node in place.
    /// Branching steps attach their alternatives to each of the given leaves,
    /// which must be open leaves below the node.
    /// Return the nodes that were changed or created.
    pub fn apply(&self, tree: &mut Tree, leaves: &[NodeId]) -> Vec<NodeId> {
        use InferenceKind::*;
        let in_place = |tree: &mut Tree, change: Change| {
            let change = tree.decompose(self.node, self.origin) | change;
            if change {
                Vec::from([self.node])
            } else {
                Vec::new()
            }
        };
        match &self.kind {
            Decomposition(ta) => {
                let change = tree.merge(self.node, ta);
                in_place(tree, change)
            }
            UniversalInstantiation { constants, facts, .. } => {
                let mut change = tree.merge(self.node, facts);
                for c in constants {
                    change |= tree.instantiated(self.node, self.origin, *c);
                }
                // a universal sentence stays open for constants that appear later
                if change {
                    Vec::from([self.node])
                } else {
                    Vec::new()
                }
            }
            ExistentialInstantiation { children, .. } if children.len() == 1 => {
                let change = tree.merge(self.node, &children[0]);
                in_place(tree, change)
            }
            Branch(children) | ExistentialInstantiation { children, .. } => {
                tree.decompose(self.node, self.origin);
                let created = leaves.iter().flat_map(|l| tree.add_children(*l, children));
                created.collect()
            }
            Closure { .. } => Vec::new(),
        }
    }

    pub fn display<'c>(&'c self, ctx: &'c Context) -> Disp<'c> {
        Disp { ctx, inf: self }
    }
}

/// Display an inference as one line of a proof log.
pub struct Disp<'c> {
    ctx: &'c Context,
    inf: &'c Inference,
}

impl Disp<'_> {
    fn facts(&self, f: &mut fmt::Formatter<'_>, facts: &[(Sentence, bool)]) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (s, v)) in facts.iter().enumerate() {
            let sep = if i == 0 { "" } else { ", " };
            let v = if *v { 'T' } else { 'F' };
            write!(f, "{}{} {}", sep, v, self.ctx.display(*s))?;
        }
        write!(f, "}}")
    }

    fn alternatives(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, facts) in self.inf.outcomes().iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            self.facts(f, facts)?;
        }
        Ok(())
    }

    fn terms(&self, f: &mut fmt::Formatter<'_>, xs: &[Sentence]) -> fmt::Result {
        for (i, x) in xs.iter().enumerate() {
            let sep = if i == 0 { "" } else { ", " };
            write!(f, "{}{}", sep, self.ctx.display(*x))?;
        }
        Ok(())
    }
}

impl Display for Disp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use InferenceKind::*;
        let inf = self.inf;
        let origin = self.ctx.display(inf.origin);
        write!(f, "{}. {} [{}] ", inf.number, inf.node, inf.justification)?;
        match &inf.kind {
            Decomposition(_) => {
                write!(f, "decompose {}: ", origin)?;
                self.alternatives(f)
            }
            Branch(_) => {
                write!(f, "branch on {}: ", origin)?;
                self.alternatives(f)
            }
            Closure { conflict } => write!(f, "close on {} against {}", origin, conflict),
            UniversalInstantiation { variable, constants, .. } => {
                write!(f, "instantiate {} with {} := ", origin, self.ctx.display(*variable))?;
                self.terms(f, constants)?;
                write!(f, ": ")?;
                self.alternatives(f)
            }
            ExistentialInstantiation { variable, witnesses, .. } => {
                write!(f, "witness {} with {} := ", origin, self.ctx.display(*variable))?;
                self.terms(f, witnesses)?;
                write!(f, ": ")?;
                self.alternatives(f)
            }
        }
    }
}
