//! Many-sorted domains with single inheritance.

use core::fmt::{self, Display};
use hashbrown::HashMap;

/// Index of a sort in its hierarchy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sort(usize);

impl Sort {
    /// The root of every hierarchy.
    pub const OBJECT: Self = Self(0);
}

/// Rooted single-inheritance sort hierarchy.
///
/// ~~~
/// use truthtree::{Sort, Sorts};
/// let mut sorts = Sorts::default();
/// let animal = sorts.declare("Animal", Sort::OBJECT).unwrap();
/// let dog = sorts.declare("Dog", animal).unwrap();
/// assert!(sorts.is_subsort(dog, animal));
/// assert!(sorts.is_subsort(dog, Sort::OBJECT));
/// assert!(!sorts.is_subsort(animal, dog));
/// ~~~
#[derive(Clone, Debug)]
pub struct Sorts {
    names: Vec<String>,
    parents: Vec<Option<Sort>>,
    index: HashMap<String, Sort>,
}

impl Default for Sorts {
    fn default() -> Self {
        let name = "OBJECT".to_string();
        let index = HashMap::from([(name.clone(), Sort::OBJECT)]);
        Self {
            names: Vec::from([name]),
            parents: Vec::from([None]),
            index,
        }
    }
}

impl Sorts {
    /// Declare a new sort below `parent`.
    ///
    /// Redeclaring a sort with the same parent returns the existing sort;
    /// redeclaring it with a different parent fails.
    pub fn declare(&mut self, name: &str, parent: Sort) -> Result<Sort, String> {
        if let Some(&sort) = self.index.get(name) {
            return if self.parent(sort) == Some(parent) {
                Ok(sort)
            } else {
                Err(format!("sort {} redeclared with a different parent", name))
            };
        }
        let sort = Sort(self.names.len());
        self.names.push(name.to_string());
        self.parents.push(Some(parent));
        self.index.insert(name.to_string(), sort);
        Ok(sort)
    }

    pub fn get(&self, name: &str) -> Option<Sort> {
        self.index.get(name).copied()
    }

    pub fn name(&self, sort: Sort) -> &str {
        &self.names[sort.0]
    }

    pub fn parent(&self, sort: Sort) -> Option<Sort> {
        self.parents[sort.0]
    }

    /// Return all ancestors of a sort, starting with the sort itself.
    pub fn ancestors(&self, sort: Sort) -> impl Iterator<Item = Sort> + '_ {
        core::iter::successors(Some(sort), |s| self.parent(*s))
    }

    /// Return true if `sub` equals `sup` or inherits from it.
    pub fn is_subsort(&self, sub: Sort, sup: Sort) -> bool {
        self.ancestors(sub).any(|s| s == sup)
    }

    pub fn is_supersort(&self, sup: Sort, sub: Sort) -> bool {
        self.is_subsort(sub, sup)
    }

    /// Can a constant of sort `constant` instantiate a variable of sort `variable`?
    pub fn compatible(&self, constant: Sort, variable: Sort) -> bool {
        self.is_subsort(constant, variable)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sort{}", self.0)
    }
}

#[test]
fn redeclare() {
    let mut sorts = Sorts::default();
    let a = sorts.declare("A", Sort::OBJECT).unwrap();
    let b = sorts.declare("B", a).unwrap();
    assert_eq!(sorts.declare("B", a), Ok(b));
    assert!(sorts.declare("B", Sort::OBJECT).is_err());
    assert_eq!(sorts.get("OBJECT"), Some(Sort::OBJECT));
    assert_eq!(sorts.ancestors(b).collect::<Vec<_>>(), [b, a, Sort::OBJECT]);
    assert!(sorts.is_supersort(Sort::OBJECT, b));
}
