//! Proof search driver.
//!
//! The prover alternates between
//! saturating open branches with deterministic decompositions,
//! removing closed branches,
//! instantiating quantifiers, and
//! committing a single pending branch,
//! until no branch is open or no open branch has anything left to do.
//!
//! Candidate collection, consistency checks and branch scoring only read the tree,
//! and are run in parallel over the open leaves.
//! All changes to the tree are made sequentially by the driver.

mod fol;
mod heuristic;

pub use heuristic::Score;

use crate::assignment::{NodeId, TruthAssignment, Tree};
use crate::change::{self, Change};
use crate::inference::{Inference, InferenceKind};
use crate::sentence::{Context, Sentence};
use crate::truth::InferenceNr;
use crate::{Error, Stats};
use core::fmt::{self, Display};
use log::{debug, info, log, Level};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Construction options of a [`Prover`].
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// report every committed inference at `info` instead of `trace` level
    pub verbose: bool,
    /// stop with [`Verdict::Unfinished`] once this much time has passed
    pub max_runtime: Option<Duration>,
}

/// Outcome of a proof search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// all branches closed: the goals follow from the premises
    Valid,
    /// an open branch is complete: it is a countermodel
    Invalid,
    /// the time budget was exhausted before a verdict was reached
    Unfinished,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::Unfinished => write!(f, "unfinished"),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum State {
    Saturate,
    Close,
    Instantiate,
    Branch,
    Complete(Verdict),
}

/// Semantic tableau prover.
pub struct Prover {
    ctx: Context,
    premises: Vec<Sentence>,
    goals: Vec<Sentence>,
    tree: Tree,
    /// consistent leaves, in order of creation
    open: Vec<NodeId>,
    /// branching inferences that have not been applied yet
    pending: Vec<Inference>,
    log: Vec<Inference>,
    counter: InferenceNr,
    options: Options,
    stats: Stats,
}

impl Prover {
    /// Set up a proof that the goals follow from the premises.
    ///
    /// The root asserts all premises and denies the goals.
    /// Several goals are denied together, as a conjunction.
    pub fn new(
        mut ctx: Context,
        premises: Vec<Sentence>,
        goals: Vec<Sentence>,
        options: Options,
    ) -> Self {
        let mut root = TruthAssignment::new();
        for p in &premises {
            root.set_true(*p, 0);
        }
        match goals.as_slice() {
            [] => (),
            [goal] => {
                root.set_false(*goal, 0);
            }
            _ => {
                let goal = ctx.and(goals.clone());
                root.set_false(goal, 0);
            }
        }
        Self {
            ctx,
            premises,
            goals,
            tree: Tree::new(root),
            open: Vec::from([NodeId::ROOT]),
            pending: Vec::new(),
            log: Vec::new(),
            counter: 0,
            options,
            stats: Stats::default(),
        }
    }

    /// Search for a proof.
    pub fn prove(&mut self) -> Result<Verdict, Error> {
        let start = Instant::now();
        let verdict = self.search(start);
        self.stats.inferences = self.log.len();
        self.stats.witnesses = self.ctx.minted();
        self.stats.nodes = self.tree.len();
        self.stats.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let verdict = verdict?;
        info!("{} after {} inferences", verdict, self.log.len());
        Ok(verdict)
    }

    fn search(&mut self, start: Instant) -> Result<Verdict, Error> {
        let mut state = State::Saturate;
        // set after a round of instantiation, so that a pending branch is
        // committed before the next round, even if every round yields new terms
        let mut instantiated = false;
        loop {
            debug!("state: {:?}, open leaves: {}", state, self.open.len());
            state = match state {
                State::Saturate => {
                    if self.options.max_runtime.map_or(false, |max| start.elapsed() >= max) {
                        info!("time budget exhausted");
                        State::Complete(Verdict::Unfinished)
                    } else {
                        self.stats.rounds += change::fix(self, Self::saturate);
                        State::Close
                    }
                }
                State::Close => {
                    self.close();
                    if self.open.is_empty() {
                        State::Complete(Verdict::Valid)
                    } else if instantiated && !self.pending.is_empty() {
                        State::Branch
                    } else {
                        State::Instantiate
                    }
                }
                State::Instantiate => {
                    instantiated = self.instantiate()?;
                    if instantiated {
                        State::Saturate
                    } else {
                        State::Branch
                    }
                }
                State::Branch => {
                    instantiated = false;
                    if self.has_countermodel() {
                        State::Complete(Verdict::Invalid)
                    } else if self.commit_branch() {
                        State::Saturate
                    } else {
                        State::Complete(Verdict::Invalid)
                    }
                }
                State::Complete(verdict) => return Ok(verdict),
            }
        }
    }

    fn level(&self) -> Level {
        if self.options.verbose {
            Level::Info
        } else {
            Level::Trace
        }
    }

    fn next_number(&self) -> InferenceNr {
        self.counter + 1
    }

    /// Run every deterministic propositional rule once on all open leaves.
    ///
    /// Branching rules are queued instead of applied.
    fn saturate(&mut self) -> Change {
        let (ctx, tree) = (&self.ctx, &self.tree);
        let candidates: Vec<(NodeId, Sentence)> = self
            .open
            .par_iter()
            .filter(|leaf| tree.is_path_consistent(**leaf))
            .flat_map_iter(|leaf| {
                let leaf = *leaf;
                ctx.undecomposed(tree, leaf).into_iter().map(move |s| (leaf, s))
            })
            .collect();

        let mut change = false;
        for (leaf, s) in candidates {
            if let Some(inf) = self.ctx.reason(&self.tree, leaf, s, self.next_number()) {
                self.commit(inf);
                change = true;
            }
        }
        change
    }

    /// Record a freshly reasoned inference.
    ///
    /// Deterministic inferences are applied right away;
    /// branching ones mark their origin as decomposed and wait to be committed.
    fn commit(&mut self, inf: Inference) {
        self.counter = inf.number;
        if inf.is_branching() {
            self.tree.decompose(inf.node, inf.origin);
            debug!("queue {}", inf.display(&self.ctx));
            self.pending.push(inf);
            return;
        }
        inf.apply(&mut self.tree, &[]);
        match inf.kind {
            InferenceKind::Decomposition(_) => self.stats.decompositions += 1,
            _ => self.stats.instantiations += 1,
        }
        self.record(inf)
    }

    fn record(&mut self, inf: Inference) {
        log!(self.level(), "{}", inf.display(&self.ctx));
        self.log.push(inf)
    }

    /// Remove closed leaves from the open ones, logging a closure for each.
    fn close(&mut self) {
        let tree = &self.tree;
        let conflicts: Vec<_> = self
            .open
            .par_iter()
            .filter_map(|leaf| Some((*leaf, tree.path_conflict(*leaf)?)))
            .collect();

        for (leaf, (s, node, conflict)) in conflicts {
            let number = self.next_number();
            let justification = self.tree.justification(node, s, true).unwrap_or_default();
            self.counter = number;
            self.stats.closures += 1;
            self.open.retain(|l| *l != leaf);
            self.record(Inference {
                node,
                origin: s,
                number,
                justification,
                kind: InferenceKind::Closure { conflict },
            });
        }

        let (open, tree) = (&self.open, &self.tree);
        let covers = |inf: &Inference| open.iter().any(|l| tree.is_descendant(*l, inf.node));
        self.pending.retain(covers);
    }

    /// Return the open leaves below a node.
    fn open_below(&self, node: NodeId) -> Vec<NodeId> {
        let below = self.open.iter().filter(|l| self.tree.is_descendant(**l, node));
        below.copied().collect()
    }

    /// Apply the best pending branch to all open leaves below its node.
    ///
    /// Return false if there was no pending branch.
    fn commit_branch(&mut self) -> Change {
        let (ctx, tree, open) = (&self.ctx, &self.tree, &self.open);
        let scores = self.pending.par_iter().enumerate();
        let best = scores.map(|(i, inf)| (heuristic::score(ctx, tree, open, inf), i)).min();
        let (score, i) = match best {
            Some(best) => best,
            None => return false,
        };
        let inf = self.pending.remove(i);
        debug!("commit {:?}: {}", score, inf.display(&self.ctx));

        let leaves = self.open_below(inf.node);
        let created = inf.apply(&mut self.tree, &leaves);
        self.open.retain(|l| !leaves.contains(l));
        self.open.extend(created);
        match inf.kind {
            InferenceKind::Branch(_) => self.stats.branches += 1,
            _ => self.stats.instantiations += 1,
        }
        self.record(inf);
        true
    }

    /// Return true if nothing remains to be done on an open leaf.
    pub fn is_complete(&self, leaf: NodeId) -> bool {
        let (ctx, tree) = (&self.ctx, &self.tree);
        tree.get(leaf).children().is_empty()
            && tree.is_path_consistent(leaf)
            && ctx.undecomposed(tree, leaf).is_empty()
            && ctx.open_quantifiers(tree, leaf).is_empty()
            && !self.pending.iter().any(|inf| tree.is_descendant(leaf, inf.node))
    }

    fn has_countermodel(&self) -> bool {
        self.open.par_iter().any(|l| self.is_complete(*l))
    }

    /// Return the open leaves that are complete, as countermodels.
    pub fn countermodels(&self) -> Vec<Countermodel> {
        let complete = self.open.iter().filter(|l| self.is_complete(**l));
        complete.map(|l| Countermodel::new(&self.tree, *l)).collect()
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn premises(&self) -> &[Sentence] {
        &self.premises
    }

    pub fn goals(&self) -> &[Sentence] {
        &self.goals
    }

    /// Return the inferences in the order they were applied.
    pub fn inferences(&self) -> &[Inference] {
        &self.log
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn open(&self) -> &[NodeId] {
        &self.open
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Display the proof log, one inference per line.
    pub fn display_log(&self) -> LogDisp<'_> {
        LogDisp(self)
    }
}

/// Consistent and complete branch, given by the sentences it makes true and false.
#[derive(Clone, Debug)]
pub struct Countermodel {
    pub leaf: NodeId,
    pub asserted: Vec<Sentence>,
    pub denied: Vec<Sentence>,
}

impl Countermodel {
    fn new(tree: &Tree, leaf: NodeId) -> Self {
        let mapped = tree.mapped(leaf);
        let with = |v: bool| -> Vec<Sentence> {
            let iter = mapped.iter().copied();
            iter.filter(|s| tree.models(leaf, *s) == Some(v)).collect()
        };
        Self {
            leaf,
            asserted: with(true),
            denied: with(false),
        }
    }

    /// Return the value of a sentence in the countermodel, if it is mapped.
    pub fn get(&self, s: Sentence) -> Option<bool> {
        if self.asserted.contains(&s) {
            Some(true)
        } else if self.denied.contains(&s) {
            Some(false)
        } else {
            None
        }
    }

    pub fn display<'c>(&'c self, ctx: &'c Context) -> CountermodelDisp<'c> {
        CountermodelDisp { ctx, cm: self }
    }
}

pub struct CountermodelDisp<'c> {
    ctx: &'c Context,
    cm: &'c Countermodel,
}

impl Display for CountermodelDisp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "countermodel at {}", self.cm.leaf)?;
        for s in &self.cm.asserted {
            writeln!(f, "T {}", self.ctx.display(*s))?;
        }
        for s in &self.cm.denied {
            writeln!(f, "F {}", self.ctx.display(*s))?;
        }
        Ok(())
    }
}

pub struct LogDisp<'p>(&'p Prover);

impl Display for LogDisp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ctx = self.0.context();
        for p in self.0.premises() {
            writeln!(f, "0. premise {}", ctx.display(*p))?;
        }
        for g in self.0.goals() {
            writeln!(f, "0. goal {}", ctx.display(*g))?;
        }
        self.0.log.iter().try_for_each(|inf| writeln!(f, "{}", inf.display(ctx)))
    }
}
