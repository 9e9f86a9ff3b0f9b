//! Interned logical sentences.
//!
//! Every structurally distinct sentence exists exactly once in a [`Context`],
//! which hands out a small copyable [`Sentence`] handle for it.
//! Equality and hashing of sentences are therefore equality and hashing of handles.

use crate::assignment::{NodeId, Tree};
use crate::sort::{Sort, Sorts};
use core::fmt::{self, Display};
use hashbrown::{HashMap, HashSet};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Canonical handle of an interned sentence.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sentence(usize);

impl Sentence {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Shape of a sentence, with sub-sentences referred to by their handles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// propositional letter
    Atom(String),
    /// term constant
    Constant(String, Sort),
    /// term variable, bound by a quantifier
    Variable(String, Sort),
    /// function application, with the sort of its result
    Function(String, Sort, Vec<Sentence>),
    Predicate(String, Vec<Sentence>),
    Not(Sentence),
    And(Vec<Sentence>),
    Or(Vec<Sentence>),
    Implies(Sentence, Sentence),
    Iff(Sentence, Sentence),
    Equals(Vec<Sentence>),
    ForAll(Sentence, Sentence),
    Exists(Sentence, Sentence),
}

impl Kind {
    pub fn is_quantifier(&self) -> bool {
        matches!(self, Self::ForAll(..) | Self::Exists(..))
    }

    pub fn is_term(&self) -> bool {
        matches!(
            self,
            Self::Constant(..) | Self::Variable(..) | Self::Function(..)
        )
    }

    /// Sentences on which no tableau rule ever fires.
    pub fn is_terminal(&self) -> bool {
        self.is_term() || matches!(self, Self::Atom(_) | Self::Predicate(..))
    }

    /// Return the direct sub-sentences (including terms).
    pub fn parts(&self) -> Vec<Sentence> {
        use Kind::*;
        match self {
            Atom(_) | Constant(..) | Variable(..) => Vec::new(),
            Function(_, _, xs) | Predicate(_, xs) | And(xs) | Or(xs) | Equals(xs) => xs.clone(),
            Not(x) => Vec::from([*x]),
            Implies(l, r) | Iff(l, r) | ForAll(l, r) | Exists(l, r) => Vec::from([*l, *r]),
        }
    }

    /// Apply a partial function to all direct sub-sentences.
    pub fn try_map(self, mut f: impl FnMut(Sentence) -> Option<Sentence>) -> Option<Self> {
        use Kind::*;
        fn all<F>(xs: Vec<Sentence>, f: F) -> Option<Vec<Sentence>>
        where
            F: FnMut(Sentence) -> Option<Sentence>,
        {
            xs.into_iter().map(f).collect()
        }
        Some(match self {
            Atom(_) | Constant(..) | Variable(..) => self,
            Function(name, sort, xs) => Function(name, sort, all(xs, &mut f)?),
            Predicate(name, xs) => Predicate(name, all(xs, &mut f)?),
            And(xs) => And(all(xs, &mut f)?),
            Or(xs) => Or(all(xs, &mut f)?),
            Equals(xs) => Equals(all(xs, &mut f)?),
            Not(x) => Not(f(x)?),
            Implies(l, r) => Implies(f(l)?, f(r)?),
            Iff(l, r) => Iff(f(l)?, f(r)?),
            ForAll(v, x) => ForAll(v, f(x)?),
            Exists(v, x) => Exists(v, f(x)?),
        })
    }
}

/// Interning table for sentences, together with
/// the sort hierarchy and the fresh constant counter.
#[derive(Clone, Debug, Default)]
pub struct Context {
    kinds: Vec<Kind>,
    index: HashMap<Kind, Sentence>,
    sorts: Sorts,
    /// names of all constants, to keep fresh witnesses distinct from them
    names: HashSet<String>,
    fresh: usize,
    minted: usize,
}

/// Something that can turn kinds into sentences.
///
/// Substitution is written once against this trait and used both
/// to build new instances and to look up whether an instance already exists.
trait Builder {
    fn context(&self) -> &Context;
    fn build(&mut self, kind: Kind) -> Option<Sentence>;
}

struct Interning<'c>(&'c mut Context);
struct Lookup<'c>(&'c Context);

impl Builder for Interning<'_> {
    fn context(&self) -> &Context {
        self.0
    }

    fn build(&mut self, kind: Kind) -> Option<Sentence> {
        Some(self.0.intern(kind))
    }
}

impl Builder for Lookup<'_> {
    fn context(&self) -> &Context {
        self.0
    }

    fn build(&mut self, kind: Kind) -> Option<Sentence> {
        self.0.find(&kind)
    }
}

/// Replace free occurrences of `var` in `s` by `tm`.
fn subst<B: Builder>(b: &mut B, s: Sentence, var: Sentence, tm: Sentence) -> Option<Sentence> {
    if s == var {
        return Some(tm);
    }
    let kind = b.context().kind(s).clone();
    match kind {
        Kind::Atom(_) | Kind::Constant(..) | Kind::Variable(..) => Some(s),
        Kind::ForAll(v, _) | Kind::Exists(v, _) if v == var => Some(s),
        kind => {
            let mut changed = false;
            let kind = kind.try_map(|x| {
                let y = subst(b, x, var, tm)?;
                changed |= x != y;
                Some(y)
            })?;
            if changed {
                b.build(kind)
            } else {
                Some(s)
            }
        }
    }
}

impl Context {
    pub fn new(sorts: Sorts) -> Self {
        Self {
            sorts,
            ..Self::default()
        }
    }

    pub fn sorts(&self) -> &Sorts {
        &self.sorts
    }

    pub fn sorts_mut(&mut self) -> &mut Sorts {
        &mut self.sorts
    }

    pub fn kind(&self, s: Sentence) -> &Kind {
        &self.kinds[s.0]
    }

    /// Number of interned sentences.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Return the canonical sentence for a kind, creating it if necessary.
    pub fn intern(&mut self, kind: Kind) -> Sentence {
        if let Some(s) = self.index.get(&kind) {
            return *s;
        }
        if let Kind::Constant(name, _) = &kind {
            self.names.insert(name.clone());
        }
        let s = Sentence(self.kinds.len());
        self.kinds.push(kind.clone());
        self.index.insert(kind, s);
        s
    }

    /// Return the canonical sentence for a kind if it was ever interned.
    pub fn find(&self, kind: &Kind) -> Option<Sentence> {
        self.index.get(kind).copied()
    }

    pub fn atom(&mut self, name: &str) -> Sentence {
        self.intern(Kind::Atom(name.to_string()))
    }

    pub fn constant(&mut self, name: &str, sort: Sort) -> Sentence {
        self.intern(Kind::Constant(name.to_string(), sort))
    }

    pub fn variable(&mut self, name: &str, sort: Sort) -> Sentence {
        self.intern(Kind::Variable(name.to_string(), sort))
    }

    pub fn function(&mut self, name: &str, sort: Sort, args: Vec<Sentence>) -> Sentence {
        self.intern(Kind::Function(name.to_string(), sort, args))
    }

    pub fn predicate(&mut self, name: &str, args: Vec<Sentence>) -> Sentence {
        self.intern(Kind::Predicate(name.to_string(), args))
    }

    pub fn not(&mut self, s: Sentence) -> Sentence {
        self.intern(Kind::Not(s))
    }

    pub fn and(&mut self, xs: Vec<Sentence>) -> Sentence {
        self.intern(Kind::And(xs))
    }

    pub fn or(&mut self, xs: Vec<Sentence>) -> Sentence {
        self.intern(Kind::Or(xs))
    }

    pub fn implies(&mut self, l: Sentence, r: Sentence) -> Sentence {
        self.intern(Kind::Implies(l, r))
    }

    pub fn iff(&mut self, l: Sentence, r: Sentence) -> Sentence {
        self.intern(Kind::Iff(l, r))
    }

    pub fn equals(&mut self, xs: Vec<Sentence>) -> Sentence {
        self.intern(Kind::Equals(xs))
    }

    pub fn forall(&mut self, var: Sentence, body: Sentence) -> Sentence {
        self.intern(Kind::ForAll(var, body))
    }

    pub fn exists(&mut self, var: Sentence, body: Sentence) -> Sentence {
        self.intern(Kind::Exists(var, body))
    }

    pub fn is_quantifier(&self, s: Sentence) -> bool {
        self.kind(s).is_quantifier()
    }

    pub fn is_constant(&self, s: Sentence) -> bool {
        matches!(self.kind(s), Kind::Constant(..))
    }

    /// Sort of a term, `None` for formulas.
    pub fn sort_of(&self, s: Sentence) -> Option<Sort> {
        match self.kind(s) {
            Kind::Constant(_, sort) | Kind::Variable(_, sort) | Kind::Function(_, sort, _) => {
                Some(*sort)
            }
            _ => None,
        }
    }

    /// Mint a constant of the given sort that is distinct from all constants so far.
    pub fn mint(&mut self, sort: Sort) -> Sentence {
        let name = loop {
            self.fresh += 1;
            let name = format!("c{}", self.fresh);
            if !self.names.contains(&name) {
                break name;
            }
        };
        self.minted += 1;
        self.constant(&name, sort)
    }

    /// Number of constants minted so far.
    pub fn minted(&self) -> usize {
        self.minted
    }

    /// Return the sentence and all sentences below it, in depth-first order.
    pub fn subsentences(&self, s: Sentence) -> Vec<Sentence> {
        let mut result = Vec::new();
        let mut stack = Vec::from([s]);
        while let Some(x) = stack.pop() {
            result.push(x);
            stack.extend(self.kind(x).parts().into_iter().rev());
        }
        result
    }

    /// Return the constants occurring in a sentence, without duplicates.
    pub fn constants(&self, s: Sentence) -> Vec<Sentence> {
        let subs = self.subsentences(s).into_iter();
        crate::keep_first(subs.filter(|x| self.is_constant(*x)))
    }

    /// Return true if no variable occurs in the sentence.
    pub fn is_ground(&self, s: Sentence) -> bool {
        let mut subs = self.subsentences(s).into_iter();
        subs.all(|x| !matches!(self.kind(x), Kind::Variable(..)))
    }

    /// Return the variable-free terms occurring in a sentence, without duplicates.
    ///
    /// These are constants and function applications over ground terms.
    pub fn ground_terms(&self, s: Sentence) -> Vec<Sentence> {
        let subs = self.subsentences(s).into_iter();
        let ground = |x: &Sentence| {
            matches!(self.kind(*x), Kind::Constant(..) | Kind::Function(..)) && self.is_ground(*x)
        };
        crate::keep_first(subs.filter(ground))
    }

    /// Return the atoms and predicate applications occurring in a sentence, without duplicates.
    pub fn atoms(&self, s: Sentence) -> Vec<Sentence> {
        let subs = self.subsentences(s).into_iter();
        let atomic = |x: &Sentence| matches!(self.kind(*x), Kind::Atom(_) | Kind::Predicate(..));
        crate::keep_first(subs.filter(atomic))
    }

    /// Instantiate the free occurrences of `var` in `s` with `tm`.
    pub fn substitute(&mut self, s: Sentence, var: Sentence, tm: Sentence) -> Sentence {
        let result = subst(&mut Interning(self), s, var, tm);
        result.unwrap_or(s)
    }

    /// Like [`Context::substitute`], but only succeed if the instance was already interned.
    pub fn find_substitute(&self, s: Sentence, var: Sentence, tm: Sentence) -> Option<Sentence> {
        subst(&mut Lookup(self), s, var, tm)
    }

    /// Number of tableau branches that the full decomposition of a sentence yields.
    ///
    /// Quantifiers and atomic sentences count as a single branch.
    pub fn paths(&self, s: Sentence, value: bool) -> BigUint {
        use Kind::*;
        let prod = |xs: &[Sentence], v: bool| -> BigUint {
            xs.iter().map(|x| self.paths(*x, v)).product()
        };
        let sum = |xs: &[Sentence], v: bool| -> BigUint { xs.iter().map(|x| self.paths(*x, v)).sum() };
        match (self.kind(s), value) {
            (Not(x), v) => self.paths(*x, !v),
            (And(xs), true) | (Or(xs), false) => prod(xs, value),
            (And(xs), false) | (Or(xs), true) => sum(xs, value),
            (Implies(l, r), true) => self.paths(*l, false) + self.paths(*r, true),
            (Implies(l, r), false) => self.paths(*l, true) * self.paths(*r, false),
            (Iff(l, r), v) => {
                let both = |a, b| self.paths(*l, a) * self.paths(*r, b);
                both(true, v) + both(false, !v)
            }
            _ => BigUint::one(),
        }
    }

    /// Evaluate a sentence on the branch ending in `node`.
    pub fn evaluate(&self, s: Sentence, tree: &Tree, node: NodeId) -> Option<bool> {
        let domain = tree.ground_terms(self, node);
        self.evaluate_with(s, &|x| tree.models(node, x), &domain)
    }

    /// Evaluate a sentence with Kleene's three-valued logic.
    ///
    /// The `lookup` function is consulted for every sentence first;
    /// quantifiers range over the ground terms in `domain`.
    pub fn evaluate_with(
        &self,
        s: Sentence,
        lookup: &impl Fn(Sentence) -> Option<bool>,
        domain: &[Sentence],
    ) -> Option<bool> {
        use Kind::*;
        if let Some(v) = lookup(s) {
            return Some(v);
        }
        let eval = |x: &Sentence| self.evaluate_with(*x, lookup, domain);
        match self.kind(s) {
            Atom(_) | Predicate(..) | Constant(..) | Variable(..) | Function(..) => None,
            Equals(xs) => xs.windows(2).all(|w| w[0] == w[1]).then_some(true),
            Not(x) => eval(x).map(|v| !v),
            And(xs) => kleene(xs.iter().map(eval), false),
            Or(xs) => kleene(xs.iter().map(eval), true),
            Implies(l, r) => kleene([eval(l).map(|v| !v), eval(r)].into_iter(), true),
            Iff(l, r) => Some(eval(l)? == eval(r)?),
            ForAll(var, body) | Exists(var, body) => {
                let sort = self.sort_of(*var)?;
                let instances: Vec<_> = domain
                    .iter()
                    .filter(|c| self.sort_of(**c).map_or(false, |cs| self.sorts.compatible(cs, sort)))
                    .map(|c| self.find_substitute(*body, *var, *c).and_then(|i| eval(&i)))
                    .collect();
                if instances.is_empty() {
                    return None;
                }
                let dominant = matches!(self.kind(s), Exists(..));
                kleene(instances.into_iter(), dominant)
            }
        }
    }

    pub fn display(&self, s: Sentence) -> Disp<'_> {
        Disp { ctx: self, s }
    }
}

/// Three-valued fold: `dominant` wins as soon as it occurs,
/// otherwise unknown values make the result unknown.
fn kleene(iter: impl Iterator<Item = Option<bool>>, dominant: bool) -> Option<bool> {
    let mut unknown = false;
    for v in iter {
        match v {
            Some(v) if v == dominant => return Some(dominant),
            Some(_) => (),
            None => unknown = true,
        }
    }
    (!unknown).then_some(!dominant)
}

/// Display a sentence as S-expression.
pub struct Disp<'c> {
    ctx: &'c Context,
    s: Sentence,
}

impl<'c> Disp<'c> {
    fn sub(&self, s: Sentence) -> Self {
        Self { ctx: self.ctx, s }
    }

    fn list(&self, f: &mut fmt::Formatter<'_>, head: &str, xs: &[Sentence]) -> fmt::Result {
        write!(f, "({}", head)?;
        xs.iter().try_for_each(|x| write!(f, " {}", self.sub(*x)))?;
        write!(f, ")")
    }
}

impl Display for Disp<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Kind::*;
        match self.ctx.kind(self.s) {
            Atom(name) | Constant(name, _) | Variable(name, _) => write!(f, "{}", name),
            Function(name, _, xs) | Predicate(name, xs) => self.list(f, name, xs),
            Not(x) => self.list(f, "not", &[*x]),
            And(xs) => self.list(f, "and", xs),
            Or(xs) => self.list(f, "or", xs),
            Implies(l, r) => self.list(f, "implies", &[*l, *r]),
            Iff(l, r) => self.list(f, "iff", &[*l, *r]),
            Equals(xs) => self.list(f, "=", xs),
            ForAll(v, x) | Exists(v, x) => {
                let q = if matches!(self.ctx.kind(self.s), ForAll(..)) {
                    "forall"
                } else {
                    "exists"
                };
                write!(f, "({} ", q)?;
                match self.ctx.kind(*v) {
                    Variable(name, sort) if *sort != Sort::OBJECT => {
                        write!(f, "({} {})", name, self.ctx.sorts.name(*sort))?
                    }
                    _ => write!(f, "{}", self.sub(*v))?,
                }
                write!(f, " {})", self.sub(*x))
            }
        }
    }
}

/// Sum of [`Context::paths`] over alternative outcomes, each outcome being a conjunction.
pub(crate) fn outcome_paths<'a>(
    ctx: &Context,
    outcomes: impl Iterator<Item = &'a [(Sentence, bool)]>,
) -> BigUint {
    outcomes.fold(BigUint::zero(), |acc, facts| {
        acc + facts
            .iter()
            .map(|(s, v)| ctx.paths(*s, *v))
            .product::<BigUint>()
    })
}

#[test]
fn interning() {
    let mut ctx = Context::default();
    let a1 = ctx.atom("A");
    let a2 = ctx.atom("A");
    let b = ctx.atom("B");
    assert_eq!(a1, a2);
    assert_ne!(a1, b);
    let ab1 = ctx.and(Vec::from([a1, b]));
    let ab2 = ctx.and(Vec::from([a2, b]));
    assert_eq!(ab1, ab2);
    assert_eq!(ctx.len(), 3);
    assert_eq!(ctx.display(ab1).to_string(), "(and A B)");
}

#[test]
fn substitution() {
    let mut ctx = Context::default();
    let x = ctx.variable("x", Sort::OBJECT);
    let a = ctx.constant("a", Sort::OBJECT);
    let px = ctx.predicate("P", Vec::from([x]));
    let inner = ctx.forall(x, px);
    let body = ctx.and(Vec::from([px, inner]));
    assert_eq!(ctx.find_substitute(body, x, a), None);
    let inst = ctx.substitute(body, x, a);
    // the inner quantifier shadows x
    assert_eq!(ctx.display(inst).to_string(), "(and (P a) (forall x (P x)))");
    assert_eq!(ctx.find_substitute(body, x, a), Some(inst));
    assert_eq!(ctx.constants(inst), [a]);
}

#[test]
fn ground_terms() {
    let mut ctx = Context::default();
    let x = ctx.variable("x", Sort::OBJECT);
    let a = ctx.constant("a", Sort::OBJECT);
    let fa = ctx.function("f", Sort::OBJECT, Vec::from([a]));
    let ffa = ctx.function("f", Sort::OBJECT, Vec::from([fa]));
    let fx = ctx.function("f", Sort::OBJECT, Vec::from([x]));
    let p = ctx.predicate("P", Vec::from([ffa, fx]));
    assert!(ctx.is_ground(ffa));
    assert!(!ctx.is_ground(fx));
    assert_eq!(ctx.ground_terms(p), [ffa, fa, a]);
    assert_eq!(ctx.constants(p), [a]);
}

#[test]
fn fresh_constants() {
    let mut ctx = Context::default();
    let c1 = ctx.constant("c1", Sort::OBJECT);
    let m1 = ctx.mint(Sort::OBJECT);
    let m2 = ctx.mint(Sort::OBJECT);
    assert_ne!(c1, m1);
    assert_ne!(m1, m2);
    assert_eq!(ctx.display(m1).to_string(), "c2");
    assert_eq!(ctx.minted(), 2);
}

#[test]
fn paths() {
    let mut ctx = Context::default();
    let [a, b, c] = ["A", "B", "C"].map(|n| ctx.atom(n));
    let ab = ctx.or(Vec::from([a, b]));
    let abc = ctx.and(Vec::from([ab, c]));
    assert_eq!(ctx.paths(abc, true), BigUint::from(2u32));
    assert_eq!(ctx.paths(abc, false), BigUint::from(2u32));
    let iff = ctx.iff(ab, c);
    assert_eq!(ctx.paths(iff, true), BigUint::from(3u32));
}
