use hashbrown::{HashMap, HashSet};
use std::time::Duration;
use truthtree::parse::{self, Problem};
use truthtree::{Context, InferenceKind, Kind, NodeId, Options, Prover, Sentence, Tree};
use truthtree::{TruthAssignment, Verdict};

fn problem(input: &str) -> (Context, Problem) {
    let mut ctx = Context::default();
    let problem = parse::parse(&mut ctx, input).unwrap();
    (ctx, problem)
}

fn setup(input: &str, options: Options) -> Prover {
    let (ctx, problem) = problem(input);
    Prover::new(ctx, problem.premises, problem.goals, options)
}

/// Decide validity of a propositional problem by enumerating all valuations.
fn truth_table(ctx: &Context, problem: &Problem) -> Verdict {
    let all = problem.premises.iter().chain(&problem.goals);
    let mut atoms: Vec<Sentence> = all.flat_map(|s| ctx.atoms(*s)).collect();
    atoms.sort();
    atoms.dedup();

    for bits in 0..1u64 << atoms.len() {
        let val: HashMap<Sentence, bool> = atoms
            .iter()
            .enumerate()
            .map(|(i, a)| (*a, bits & (1 << i) != 0))
            .collect();
        let eval = |s: &Sentence| ctx.evaluate_with(*s, &|x| val.get(&x).copied(), &[]);
        let premises = problem.premises.iter().all(|p| eval(p) == Some(true));
        let goals = problem.goals.iter().all(|g| eval(g) == Some(true));
        if premises && !goals {
            return Verdict::Invalid;
        }
    }
    Verdict::Valid
}

const PROPOSITIONAL: &[&str] = &[
    "(premises (implies A (and B C)) (iff C B) (not C)) (goal (not A))",
    "(premises (implies K H) (implies H L)) (goal (implies K B))",
    "(premises (or A B) (not A)) (goal B)",
    "(goal (or A (not A)))",
    "(premises (iff A B)) (goal (implies A B))",
    "(premises (and A B)) (goal (or C A))",
    "(premises (or A B)) (goal A)",
    "(premises (and A B)) (goals A B)",
    "(premises (or)) (goal Z)",
    "(premises (implies P Q) (implies Q R) (or P S) (not S)) (goal R)",
    "(premises (iff (iff A B) C)) (goal (iff A (iff B C)))",
    "(premises (or (and A B) (and C D))) (goal (and (or A C) (or B D)))",
    "(premises (or (and A B) (and C D))) (goal (and A D))",
    "(premises (not (and A B)) (or A B)) (goal (iff A (not B)))",
    "(premises (implies (implies A B) A)) (goal A)",
    "(premises (and)) (goal (implies (and A (not A)) B))",
];

#[test]
fn propositional_agrees_with_truth_table() {
    for input in PROPOSITIONAL {
        let (ctx, problem) = problem(input);
        let expected = truth_table(&ctx, &problem);
        let mut prover = Prover::new(ctx, problem.premises, problem.goals, Options::default());
        assert_eq!(prover.prove().unwrap(), expected, "{}", input);
        assert_eq!(prover.open().is_empty(), expected == Verdict::Valid, "{}", input);
    }
}

#[test]
fn valid_fixture() {
    let input = "(premises (implies A (and B C)) (iff C B) (not C)) (goal (not A))";
    let mut prover = setup(input, Options::default());
    assert_eq!(prover.prove().unwrap(), Verdict::Valid);
    assert!(prover.open().is_empty());
    assert!(prover.countermodels().is_empty());
    let closure = |inf: &&truthtree::Inference| matches!(inf.kind, InferenceKind::Closure { .. });
    assert!(prover.inferences().iter().filter(closure).count() > 0);
}

#[test]
fn countermodel_falsifies_goal() {
    let input = "(premises (implies K H) (implies H L)) (goal (implies K B))";
    let mut prover = setup(input, Options::default());
    assert_eq!(prover.prove().unwrap(), Verdict::Invalid);
    let cms = prover.countermodels();
    assert!(!cms.is_empty());
    let ctx = prover.context();
    for cm in cms {
        // only the atoms of the countermodel are looked up
        let atom = |x: Sentence| matches!(ctx.kind(x), Kind::Atom(_));
        let eval = |s: Sentence| ctx.evaluate_with(s, &|x| cm.get(x).filter(|_| atom(x)), &[]);
        for p in prover.premises() {
            assert_eq!(eval(*p), Some(true));
        }
        assert_eq!(eval(prover.goals()[0]), Some(false));
        assert!(prover.is_complete(cm.leaf));
        assert!(prover.tree().is_consistent(cm.leaf));
        let path = prover.tree().path(cm.leaf);
        assert!(path.iter().all(|n| prover.tree().get(*n).is_consistent()));
    }
}

#[test]
fn inference_numbers() {
    let input = "(premises (or A B) (not A)) (goal B)";
    let mut prover = setup(input, Options::default());
    assert_eq!(prover.prove().unwrap(), Verdict::Valid);
    let numbers: Vec<_> = prover.inferences().iter().map(|inf| inf.number).collect();
    assert!(numbers.iter().all(|n| *n > 0));
    let distinct: HashSet<_> = numbers.iter().collect();
    assert_eq!(distinct.len(), numbers.len());
    // every justification refers to a step logged before
    let mut seen: HashSet<usize> = HashSet::from([0]);
    for inf in prover.inferences() {
        assert!(seen.contains(&inf.justification), "{}", inf.display(prover.context()));
        seen.insert(inf.number);
    }
    assert_eq!(prover.stats().inferences, numbers.len());
}

fn root(facts: &[(Sentence, bool)]) -> Tree {
    Tree::new(TruthAssignment::from_facts(facts, 0))
}

#[test]
fn branch_rules() {
    let mut ctx = Context::default();
    let (a, b) = (ctx.atom("A"), ctx.atom("B"));
    let or = ctx.or(Vec::from([a, b]));
    let and = ctx.and(Vec::from([a, b]));
    let implies = ctx.implies(a, b);

    let cases = [
        (or, true, [[(a, true)], [(b, true)]]),
        (and, false, [[(a, false)], [(b, false)]]),
        (implies, true, [[(a, false)], [(b, true)]]),
    ];
    for (s, v, expected) in cases {
        let tree = root(&[(s, v)]);
        let inf = ctx.reason(&tree, NodeId::ROOT, s, 1).unwrap();
        assert!(matches!(inf.kind, InferenceKind::Branch(_)));
        assert_eq!(inf.outcomes(), expected);
    }

    let tree = root(&[(implies, false)]);
    let inf = ctx.reason(&tree, NodeId::ROOT, implies, 1).unwrap();
    assert!(!inf.is_branching());
    assert_eq!(inf.outcomes(), [[(a, true), (b, false)]]);
}

#[test]
fn branch_applies_to_open_leaves() {
    let mut ctx = Context::default();
    let [a, b, c, d] = ["A", "B", "C", "D"].map(|n| ctx.atom(n));
    let ab = ctx.or(Vec::from([a, b]));
    let cd = ctx.or(Vec::from([c, d]));
    let mut tree = root(&[(ab, true), (cd, true)]);
    let first = ctx.reason(&tree, NodeId::ROOT, ab, 1).unwrap();
    let second = ctx.reason(&tree, NodeId::ROOT, cd, 2).unwrap();
    let leaves = first.apply(&mut tree, &[NodeId::ROOT]);
    assert_eq!(leaves.len(), 2);
    let created = second.apply(&mut tree, &leaves);
    assert_eq!(created.len(), 4);
    assert_eq!(tree.leaves(NodeId::ROOT).len(), 4);
    assert_eq!(tree.par_leaves(NodeId::ROOT), tree.leaves(NodeId::ROOT));
}

#[test]
fn idempotence() {
    let mut ctx = Context::default();
    let (a, b) = (ctx.atom("A"), ctx.atom("B"));
    let and = ctx.and(Vec::from([a, b]));
    let mut tree = root(&[(and, true)]);
    let inf = ctx.reason(&tree, NodeId::ROOT, and, 1).unwrap();
    assert_eq!(inf.apply(&mut tree, &[]), [NodeId::ROOT]);
    assert!(tree.is_decomposed(NodeId::ROOT, and));
    assert!(ctx.reason(&tree, NodeId::ROOT, and, 2).is_none());
    assert!(inf.apply(&mut tree, &[]).is_empty());

    // the decomposed flag is inherited by children
    let child = tree.add_children(NodeId::ROOT, &[TruthAssignment::new()])[0];
    assert!(tree.is_decomposed(child, and));
    assert!(ctx.reason(&tree, child, and, 3).is_none());
    assert_eq!(tree.justification(child, a, true), Some(1));
}

#[test]
fn merge_is_monotone() {
    let mut ctx = Context::default();
    let (a, b) = (ctx.atom("A"), ctx.atom("B"));
    let mut ta = TruthAssignment::from_facts(&[(a, true)], 1);
    let other = TruthAssignment::from_facts(&[(a, true), (b, false)], 5);
    assert!(ta.merge(&other));
    assert_eq!(ta.get(a).unwrap().justification(true), Some(1));
    assert_eq!(ta.get(b).unwrap().justification(false), Some(5));
    assert!(!ta.merge(&other));

    let mut tree = Tree::new(ta);
    let child = tree.add_children(NodeId::ROOT, &[TruthAssignment::new()])[0];
    let later = TruthAssignment::from_facts(&[(a, true), (b, false)], 9);
    assert!(!tree.merge(child, &later));
    assert_eq!(tree.justification(child, a, true), Some(1));
    assert!(tree.get(child).is_empty());
}

#[test]
fn consistency() {
    let mut ctx = Context::default();
    let (a, b) = (ctx.atom("A"), ctx.atom("B"));
    let mut tree = root(&[(a, true)]);
    let children = [
        TruthAssignment::from_facts(&[(a, false)], 1),
        TruthAssignment::from_facts(&[(b, true)], 1),
    ];
    let ids = tree.add_children(NodeId::ROOT, &children);
    assert_eq!(tree.conflict(ids[0]), Some((a, NodeId::ROOT)));
    assert!(tree.conflict(ids[1]).is_none());
    assert_eq!(tree.leaves(NodeId::ROOT), [ids[1]]);
    assert!(tree.is_consistent(NodeId::ROOT));

    // local contradiction
    tree.set_false(ids[1], b, 2);
    assert!(!tree.get(ids[1]).is_consistent());
    assert!(tree.leaves(NodeId::ROOT).is_empty());
    assert!(!tree.is_consistent(NodeId::ROOT));
}

#[test]
fn three_valued_evaluation() {
    let mut ctx = Context::default();
    let (a, b) = (ctx.atom("A"), ctx.atom("B"));
    let or = ctx.or(Vec::from([a, b]));
    let and = ctx.and(Vec::from([a, b]));
    let tree = root(&[(a, true)]);
    assert_eq!(ctx.evaluate(or, &tree, NodeId::ROOT), Some(true));
    assert_eq!(ctx.evaluate(and, &tree, NodeId::ROOT), None);
    assert_eq!(ctx.evaluate(b, &tree, NodeId::ROOT), None);
}

#[test]
fn fol_valid() {
    let inputs = [
        "(premises (forall x (implies (A x) (B x))) (A a)) (goal (B a))",
        "(premises (exists x (P x)) (forall x (not (P x)))) (goal Q)",
        "(premises (forall x (P x))) (goal (exists y (P y)))",
        "(premises (not (exists x (P x)))) (goal (forall x (not (P x))))",
        "(declarations (sort Animal) (sort Dog Animal) (constant rex Dog))
         (premises (forall (x Animal) (Mortal x)))
         (goal (Mortal rex))",
        "(premises (forall x (P x))) (goal (P (f a)))",
        "(premises (forall x (implies (P x) (P (f x)))) (P a)) (goal (P (f (f a))))",
    ];
    for input in inputs {
        let mut prover = setup(input, Options::default());
        assert_eq!(prover.prove().unwrap(), Verdict::Valid, "{}", input);
    }
}

#[test]
fn fol_invalid() {
    let inputs = [
        "(premises (forall x (implies (A x) (B x))) (A a)) (goal (B b))",
        "(premises (exists x (P x))) (goal (forall x (P x)))",
        "(declarations (sort Cat) (sort Dog) (constant tom Cat))
         (premises (forall (x Dog) (Barks x)))
         (goal (Barks tom))",
    ];
    for input in inputs {
        let mut prover = setup(input, Options::default());
        assert_eq!(prover.prove().unwrap(), Verdict::Invalid, "{}", input);
        assert!(!prover.countermodels().is_empty());
    }
}

#[test]
fn fewest_survivors_first() {
    let (ctx, problem) = problem("(premises (or A B) (or C D) (not C)) (goal G)");
    let (ab, cd) = (problem.premises[0], problem.premises[1]);
    let mut prover = Prover::new(ctx, problem.premises, problem.goals, Options::default());
    assert_eq!(prover.prove().unwrap(), Verdict::Invalid);
    let branches: Vec<_> = prover
        .inferences()
        .iter()
        .filter(|inf| matches!(inf.kind, InferenceKind::Branch(_)))
        .map(|inf| inf.origin)
        .collect();
    // one child of (or C D) closes right away, so it is committed before (or A B)
    assert_eq!(branches, [cd, ab]);
}

#[test]
fn universal_fairness() {
    let input = "(premises (forall x (implies (A x) (B x))) (A a)) (goal (B b))";
    let mut prover = setup(input, Options::default());
    assert_eq!(prover.prove().unwrap(), Verdict::Invalid);

    let tree = prover.tree();
    let instances: Vec<_> = prover
        .inferences()
        .iter()
        .filter_map(|inf| match &inf.kind {
            InferenceKind::UniversalInstantiation { constants, .. } => {
                Some((inf.origin, inf.node, constants))
            }
            _ => None,
        })
        .collect();
    assert!(!instances.is_empty());
    for (i, (o1, n1, cs1)) in instances.iter().enumerate() {
        for (o2, n2, cs2) in &instances[i + 1..] {
            let same_branch = tree.is_descendant(*n1, *n2) || tree.is_descendant(*n2, *n1);
            if o1 == o2 && same_branch {
                assert!(cs1.iter().all(|c| !cs2.contains(c)));
            }
        }
    }
    // no fresh constant is needed when the branch has constants
    assert_eq!(prover.stats().witnesses, 0);
}

#[test]
fn timeout() {
    let input = "(premises (forall x (exists y (R x y)))
                           (forall x (not (R x x)))
                           (forall x (forall y (forall z (implies (and (R x y) (R y z)) (R x z))))))
                 (goal Q)";
    let options = Options {
        max_runtime: Some(Duration::ZERO),
        ..Options::default()
    };
    assert_eq!(setup(input, options).prove().unwrap(), Verdict::Unfinished);

    let options = Options {
        max_runtime: Some(Duration::from_millis(200)),
        ..Options::default()
    };
    let mut prover = setup(input, options);
    assert_eq!(prover.prove().unwrap(), Verdict::Unfinished);
    assert!(prover.stats().witnesses > 1);
}

#[test]
fn verbose_proof_log() {
    let input = "(premises (implies A B) A) (goal B)";
    let options = Options {
        verbose: true,
        ..Options::default()
    };
    let mut prover = setup(input, options);
    assert_eq!(prover.prove().unwrap(), Verdict::Valid);
    let log = prover.display_log().to_string();
    assert!(log.starts_with("0. premise (implies A B)\n"));
    assert!(log.contains("close on B"));
}
