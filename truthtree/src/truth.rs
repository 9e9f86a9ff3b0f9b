use crate::change::Change;

/// Number of the inference that established a value.
///
/// Premises and the negated goal are given, with inference number 0.
pub type InferenceNr = usize;

/// What a single tree node knows about a sentence.
///
/// A value records which inference first made the sentence true and
/// which inference first made it false.
/// If both are present, the node is inconsistent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TruthValue {
    true_by: Option<InferenceNr>,
    false_by: Option<InferenceNr>,
    decomposed: bool,
}

impl TruthValue {
    /// Record that an inference made the sentence `value`.
    ///
    /// The first inference to set a value is retained.
    pub fn set(&mut self, value: bool, inf: InferenceNr) -> Change {
        let slot = if value {
            &mut self.true_by
        } else {
            &mut self.false_by
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(inf);
        true
    }

    pub fn set_true(&mut self, inf: InferenceNr) -> Change {
        self.set(true, inf)
    }

    pub fn set_false(&mut self, inf: InferenceNr) -> Change {
        self.set(false, inf)
    }

    /// Return the inference that first made the sentence `value`.
    pub fn justification(&self, value: bool) -> Option<InferenceNr> {
        if value {
            self.true_by
        } else {
            self.false_by
        }
    }

    pub fn is_true(&self) -> bool {
        self.true_by.is_some()
    }

    pub fn is_false(&self) -> bool {
        self.false_by.is_some()
    }

    pub fn has(&self, value: bool) -> bool {
        self.justification(value).is_some()
    }

    /// Return the value if it is known and unique.
    pub fn get(&self) -> Option<bool> {
        match (self.is_true(), self.is_false()) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    pub fn is_mapped(&self) -> bool {
        self.is_true() || self.is_false()
    }

    pub fn is_consistent(&self) -> bool {
        !(self.is_true() && self.is_false())
    }

    pub fn is_decomposed(&self) -> bool {
        self.decomposed
    }

    /// Mark the sentence as decomposed; this cannot be undone.
    pub fn decompose(&mut self) -> Change {
        !core::mem::replace(&mut self.decomposed, true)
    }

    /// Absorb another value, keeping existing provenance.
    pub fn merge(&mut self, other: &Self) -> Change {
        let mut change = false;
        if let Some(inf) = other.true_by {
            change |= self.set_true(inf);
        }
        if let Some(inf) = other.false_by {
            change |= self.set_false(inf);
        }
        if other.decomposed {
            change |= self.decompose();
        }
        change
    }
}

#[test]
fn first_writer_wins() {
    let mut tv = TruthValue::default();
    assert_eq!(tv.get(), None);
    assert!(tv.set_true(3));
    assert!(!tv.set_true(5));
    assert_eq!(tv.justification(true), Some(3));
    assert_eq!(tv.get(), Some(true));
    assert!(tv.set_false(7));
    assert!(!tv.is_consistent());
    assert_eq!(tv.get(), None);

    let mut other = TruthValue::default();
    other.set_true(1);
    other.decompose();
    assert!(tv.merge(&other));
    assert_eq!(tv.justification(true), Some(3));
    assert!(tv.is_decomposed());
    assert!(!tv.merge(&other));
}
