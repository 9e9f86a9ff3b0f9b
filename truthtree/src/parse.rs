//! Reading problems given as S-expressions.
//!
//! A problem consists of sections:
//!
//! ~~~ text
//! (declarations (sort Dog) (constant rex Dog) (predicate Barks Dog))
//! (premises (forall (x Dog) (Barks x)))
//! (goal (Barks rex))
//! ~~~
//!
//! Comments start with `;` and last until the end of the line.

use crate::error::{ParseError, ParseErrorKind};
use crate::sentence::{Context, Kind, Sentence};
use crate::sort::Sort;
use core::fmt::{self, Display};
use hashbrown::HashMap;
use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, multispace1, not_line_ending};
use nom::combinator::{all_consuming, map, value};
use nom::multi::{many0, many0_count};
use nom::sequence::{delimited, preceded, terminated};
use nom::{Finish, IResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SExpr {
    Symbol(String),
    List(Vec<SExpr>),
}

impl Display for SExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, "{}", s),
            Self::List(xs) => {
                write!(f, "(")?;
                for (i, x) in xs.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { "" } else { " " }, x)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn comment(i: &str) -> IResult<&str, &str> {
    preceded(char(';'), not_line_ending)(i)
}

/// Skip whitespace and comments.
fn ws(i: &str) -> IResult<&str, ()> {
    value((), many0_count(alt((multispace1, comment))))(i)
}

fn symbol(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && !"();".contains(c))(i)
}

fn list(i: &str) -> IResult<&str, Vec<SExpr>> {
    let close = preceded(ws, char(')'));
    delimited(char('('), many0(preceded(ws, sexpr)), close)(i)
}

fn sexpr(i: &str) -> IResult<&str, SExpr> {
    let sym = map(symbol, |s: &str| SExpr::Symbol(s.to_string()));
    alt((map(list, SExpr::List), sym))(i)
}

/// Read a sequence of S-expressions.
pub fn sexprs(input: &str) -> Result<Vec<SExpr>, ParseError> {
    let all = terminated(many0(preceded(ws, sexpr)), ws);
    match all_consuming(all)(input).finish() {
        Ok((_, xs)) => Ok(xs),
        Err(e) => {
            let line = input[..input.len() - e.input.len()].lines().count().max(1);
            let rest: String = e.input.chars().take(20).collect();
            let msg = format!("unexpected input on line {}: {}", line, rest);
            Err(ParseError::new(ParseErrorKind::Syntax, msg))
        }
    }
}

/// Premises and goals of a problem.
#[derive(Clone, Debug, Default)]
pub struct Problem {
    pub premises: Vec<Sentence>,
    pub goals: Vec<Sentence>,
}

/// Parse a problem, interning its sentences and declaring its sorts in `ctx`.
pub fn parse(ctx: &mut Context, input: &str) -> Result<Problem, ParseError> {
    Reader::new(ctx).problem(&sexprs(input)?)
}

#[derive(Clone, Debug)]
struct Signature {
    /// declared argument sorts
    args: Option<Vec<Sort>>,
    arity: usize,
    result: Sort,
}

impl Signature {
    fn used(arity: usize) -> Self {
        Self {
            args: None,
            arity,
            result: Sort::OBJECT,
        }
    }
}

fn error<T>(kind: ParseErrorKind, message: String) -> Result<T, ParseError> {
    Err(ParseError::new(kind, message))
}

fn exactly<'e, const N: usize>(e: &SExpr, args: &'e [SExpr]) -> Result<&'e [SExpr; N], ParseError> {
    args.try_into().or_else(|_| {
        let msg = format!("expected {} arguments in {}", N, e);
        error(ParseErrorKind::Formula, msg)
    })
}

/// Conversion of S-expressions to sentences, keeping track of
/// declared symbols and bound variables.
pub struct Reader<'c> {
    ctx: &'c mut Context,
    predicates: HashMap<String, Signature>,
    functions: HashMap<String, Signature>,
    constants: HashMap<String, Sort>,
    scope: Vec<(String, Sentence)>,
}

impl<'c> Reader<'c> {
    pub fn new(ctx: &'c mut Context) -> Self {
        Self {
            ctx,
            predicates: HashMap::new(),
            functions: HashMap::new(),
            constants: HashMap::new(),
            scope: Vec::new(),
        }
    }

    pub fn problem(&mut self, sections: &[SExpr]) -> Result<Problem, ParseError> {
        let mut problem = Problem::default();
        for section in sections {
            let (head, body) = match section {
                SExpr::List(xs) => match xs.split_first() {
                    Some((SExpr::Symbol(head), body)) => (head.to_lowercase(), body),
                    _ => return error(ParseErrorKind::Section, format!("malformed section {}", section)),
                },
                SExpr::Symbol(s) => return error(ParseErrorKind::Section, format!("expected a section, found {}", s)),
            };
            match head.as_str() {
                "declarations" => body.iter().try_for_each(|d| self.declare(d))?,
                "premises" => {
                    for p in body {
                        let p = self.formula(p)?;
                        problem.premises.push(p)
                    }
                }
                "goal" | "goals" => {
                    for g in body {
                        let g = self.formula(g)?;
                        problem.goals.push(g)
                    }
                }
                _ => return error(ParseErrorKind::Section, format!("unknown section {}", head)),
            }
        }
        Ok(problem)
    }

    fn sort(&self, name: &str) -> Result<Sort, ParseError> {
        let sort = self.ctx.sorts().get(name);
        sort.ok_or_else(|| ParseError::new(ParseErrorKind::Sort, format!("undeclared sort {}", name)))
    }

    fn sorts(&self, xs: &[SExpr]) -> Result<Vec<Sort>, ParseError> {
        let sort = |x: &SExpr| match x {
            SExpr::Symbol(name) => self.sort(name),
            _ => error(ParseErrorKind::Declaration, format!("expected a sort, found {}", x)),
        };
        xs.iter().map(sort).collect()
    }

    fn declare(&mut self, e: &SExpr) -> Result<(), ParseError> {
        use ParseErrorKind::Declaration;
        use SExpr::{List, Symbol};
        let malformed = || error(Declaration, format!("malformed declaration {}", e));
        let (head, rest) = match e {
            List(xs) => match xs.split_first() {
                Some((Symbol(head), rest)) => (head.to_lowercase(), rest),
                _ => return malformed(),
            },
            Symbol(_) => return malformed(),
        };
        match (head.as_str(), rest) {
            ("sort", [Symbol(name)]) => self.declare_sort(name, Sort::OBJECT),
            ("sort", [Symbol(name), Symbol(parent)]) => {
                let parent = self.sort(parent)?;
                self.declare_sort(name, parent)
            }
            ("constant", [Symbol(name)]) => self.declare_constant(name, Sort::OBJECT),
            ("constant", [Symbol(name), Symbol(sort)]) => {
                let sort = self.sort(sort)?;
                self.declare_constant(name, sort)
            }
            ("predicate", [Symbol(name), args @ ..]) => {
                let args = self.sorts(args)?;
                let sig = Signature {
                    arity: args.len(),
                    args: Some(args),
                    result: Sort::OBJECT,
                };
                Self::declare_symbol(&mut self.predicates, name, sig)
            }
            ("function", [Symbol(name), List(args), result @ ..]) => {
                let result = match result {
                    [] => Sort::OBJECT,
                    [Symbol(result)] => self.sort(result)?,
                    _ => return malformed(),
                };
                let args = self.sorts(args)?;
                let sig = Signature {
                    arity: args.len(),
                    args: Some(args),
                    result,
                };
                Self::declare_symbol(&mut self.functions, name, sig)
            }
            _ => malformed(),
        }
    }

    fn declare_sort(&mut self, name: &str, parent: Sort) -> Result<(), ParseError> {
        let sorts = self.ctx.sorts_mut();
        let declared = sorts.declare(name, parent);
        declared.map(|_| ()).map_err(|msg| ParseError::new(ParseErrorKind::Declaration, msg))
    }

    fn declare_constant(&mut self, name: &str, sort: Sort) -> Result<(), ParseError> {
        match self.constants.get(name) {
            Some(old) if *old != sort => {
                let msg = format!("constant {} declared or used with another sort", name);
                error(ParseErrorKind::Declaration, msg)
            }
            _ => {
                self.constants.insert(name.to_string(), sort);
                self.ctx.constant(name, sort);
                Ok(())
            }
        }
    }

    fn declare_symbol(
        table: &mut HashMap<String, Signature>,
        name: &str,
        sig: Signature,
    ) -> Result<(), ParseError> {
        match table.get(name) {
            Some(old) if old.arity != sig.arity => {
                let msg = format!("{} declared with {} arguments, but has {}", name, sig.arity, old.arity);
                error(ParseErrorKind::Arity, msg)
            }
            Some(Signature { args: Some(_), .. }) => {
                error(ParseErrorKind::Declaration, format!("{} declared twice", name))
            }
            _ => {
                table.insert(name.to_string(), sig);
                Ok(())
            }
        }
    }

    fn bound(&self, name: &str) -> Option<Sentence> {
        let mut scope = self.scope.iter().rev();
        scope.find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Check the arguments of a predicate or function application and
    /// return the result sort.
    fn apply(&mut self, function: bool, name: &str, args: &[Sentence]) -> Result<Sort, ParseError> {
        let table = if function {
            &mut self.functions
        } else {
            &mut self.predicates
        };
        let sig = table.entry(name.to_string()).or_insert_with(|| Signature::used(args.len()));
        let sig = sig.clone();
        if sig.arity != args.len() {
            let msg = format!("{} used with {} arguments, but has {}", name, args.len(), sig.arity);
            return error(ParseErrorKind::Arity, msg);
        }
        let sorts = self.ctx.sorts();
        for (arg, want) in args.iter().zip(sig.args.iter().flatten()) {
            let have = self.ctx.sort_of(*arg).unwrap_or(Sort::OBJECT);
            // variables may range over a supersort of the argument sort
            let variable = matches!(self.ctx.kind(*arg), Kind::Variable(..));
            if !(sorts.is_subsort(have, *want) || variable && sorts.is_subsort(*want, have)) {
                let (have, want) = (sorts.name(have), sorts.name(*want));
                let arg = self.ctx.display(*arg);
                let msg = format!("argument {} of {} has sort {}, expected {}", arg, name, have, want);
                return error(ParseErrorKind::Sort, msg);
            }
        }
        Ok(sig.result)
    }

    fn terms(&mut self, xs: &[SExpr]) -> Result<Vec<Sentence>, ParseError> {
        xs.iter().map(|x| self.term(x)).collect()
    }

    fn formulas(&mut self, xs: &[SExpr]) -> Result<Vec<Sentence>, ParseError> {
        xs.iter().map(|x| self.formula(x)).collect()
    }

    pub fn term(&mut self, e: &SExpr) -> Result<Sentence, ParseError> {
        match e {
            SExpr::Symbol(name) => {
                if let Some(var) = self.bound(name) {
                    return Ok(var);
                }
                if self.functions.contains_key(name.as_str()) {
                    self.apply(true, name, &[])?;
                }
                let sort = *self.constants.entry(name.clone()).or_insert(Sort::OBJECT);
                Ok(self.ctx.constant(name, sort))
            }
            SExpr::List(xs) => match xs.split_first() {
                Some((SExpr::Symbol(f), args)) if !args.is_empty() => {
                    let args = self.terms(args)?;
                    let sort = self.apply(true, f, &args)?;
                    Ok(self.ctx.function(f, sort, args))
                }
                _ => error(ParseErrorKind::Formula, format!("malformed term {}", e)),
            },
        }
    }

    pub fn formula(&mut self, e: &SExpr) -> Result<Sentence, ParseError> {
        let (head, args) = match e {
            SExpr::Symbol(name) => return self.atom(name),
            SExpr::List(xs) => match xs.split_first() {
                Some((SExpr::Symbol(head), args)) => (head, args),
                _ => return error(ParseErrorKind::Formula, format!("malformed formula {}", e)),
            },
        };
        match head.to_lowercase().as_str() {
            "not" => {
                let [x] = exactly::<1>(e, args)?;
                let x = self.formula(x)?;
                Ok(self.ctx.not(x))
            }
            "and" => {
                let xs = self.formulas(args)?;
                Ok(self.ctx.and(xs))
            }
            "or" => {
                let xs = self.formulas(args)?;
                Ok(self.ctx.or(xs))
            }
            "implies" => {
                let [l, r] = exactly::<2>(e, args)?;
                let (l, r) = (self.formula(l)?, self.formula(r)?);
                Ok(self.ctx.implies(l, r))
            }
            "iff" => {
                let [l, r] = exactly::<2>(e, args)?;
                let (l, r) = (self.formula(l)?, self.formula(r)?);
                Ok(self.ctx.iff(l, r))
            }
            "=" | "equals" => {
                if args.is_empty() {
                    return error(ParseErrorKind::Formula, format!("equality without terms in {}", e));
                }
                let xs = self.terms(args)?;
                Ok(self.ctx.equals(xs))
            }
            q @ ("forall" | "exists") => {
                let [binder, body] = exactly::<2>(e, args)?;
                let (name, sort) = match binder {
                    SExpr::Symbol(name) => (name, Sort::OBJECT),
                    SExpr::List(b) => match b.as_slice() {
                        [SExpr::Symbol(name), SExpr::Symbol(sort)] => (name, self.sort(sort)?),
                        _ => return error(ParseErrorKind::Formula, format!("malformed binder {}", binder)),
                    },
                };
                let var = self.ctx.variable(name, sort);
                self.scope.push((name.clone(), var));
                let body = self.formula(body);
                self.scope.pop();
                let body = body?;
                Ok(if q == "forall" {
                    self.ctx.forall(var, body)
                } else {
                    self.ctx.exists(var, body)
                })
            }
            _ if args.is_empty() => self.atom(head),
            _ => {
                let args = self.terms(args)?;
                self.apply(false, head, &args)?;
                Ok(self.ctx.predicate(head, args))
            }
        }
    }

    fn atom(&mut self, name: &str) -> Result<Sentence, ParseError> {
        if self.bound(name).is_some() {
            return error(ParseErrorKind::Formula, format!("variable {} used as a formula", name));
        }
        self.apply(false, name, &[])?;
        Ok(self.ctx.atom(name))
    }
}

#[test]
fn comments() {
    let xs = sexprs("; header\n(a (b c)) ; trailing\n d").unwrap();
    let a = |s: &str| SExpr::Symbol(s.to_string());
    let bc = SExpr::List(Vec::from([a("b"), a("c")]));
    assert_eq!(xs, [SExpr::List(Vec::from([a("a"), bc])), a("d")]);
    assert_eq!(sexprs("(a").unwrap_err().kind, ParseErrorKind::Syntax);
}

#[test]
fn sorted() {
    let mut ctx = Context::default();
    let input = "(declarations (sort Animal) (sort Dog Animal) (constant rex Dog) (predicate Barks Animal))
                 (premises (FORALL (x Dog) (Barks x)))
                 (goal (Barks rex))";
    let problem = parse(&mut ctx, input).unwrap();
    assert_eq!(ctx.display(problem.premises[0]).to_string(), "(forall (x Dog) (Barks x))");
    assert_eq!(ctx.display(problem.goals[0]).to_string(), "(Barks rex)");
    let dog = ctx.sorts().get("Dog").unwrap();
    assert_eq!(ctx.sort_of(ctx.constants(problem.goals[0])[0]), Some(dog));
}

#[test]
fn errors() {
    let kind = |input: &str| parse(&mut Context::default(), input).unwrap_err().kind;
    assert_eq!(kind("(premises (P a) (P a b))"), ParseErrorKind::Arity);
    assert_eq!(kind("(declarations (constant a Cat))"), ParseErrorKind::Sort);
    assert_eq!(kind("(premises (forall x x))"), ParseErrorKind::Formula);
    assert_eq!(kind("(premises (implies A))"), ParseErrorKind::Formula);
    assert_eq!(kind("(conclusions A)"), ParseErrorKind::Section);
    let mistyped = "(declarations (sort Cat) (sort Dog) (constant tom Cat) (predicate Barks Dog))
                    (goal (Barks tom))";
    assert_eq!(kind(mistyped), ParseErrorKind::Sort);
}
