use serde::{Deserialize, Serialize};

use crate::equivalence::EquivalenceKind;
use crate::formula::FormulaId;
use crate::truth::TruthValue;

/// A structured reason a formula holds a value, per spec.md §4.6. Every
/// variant carries its own `value` directly (rather than requiring callers
/// to recompute it by walking the tree) and its `length` can be derived
/// from the cited sub-justifications via `Justification::length`.
///
/// Allocated fresh by every `Solver::solve` call — never cached on the
/// `Formula` node (spec.md §9: the selected justification for a formula
/// can depend on which cycles exist in the enclosing solve, not only on
/// the knowledge base).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Justification {
    /// An initial fact asserted in the source. Length 0.
    DefinedFact { formula: FormulaId, value: TruthValue },

    /// No other candidate applied; value is always `False`. Length 0.
    Default { formula: FormulaId },

    /// `formula`'s value equals `source`'s, because the two are in the
    /// same equivalence class. `kind` distinguishes a `<=>`-declared pair
    /// from a tautologically-deduced one.
    Equivalence {
        formula: FormulaId,
        kind: EquivalenceKind,
        source: FormulaId,
        source_justification: Box<Justification>,
    },

    /// `source => formula` holds and `source` solved to a value that
    /// determines `formula`'s (per spec.md §4.5's forward-implication
    /// table).
    ForwardImplication {
        formula: FormulaId,
        value: TruthValue,
        source: FormulaId,
        source_justification: Box<Justification>,
    },

    /// `formula => source` holds and `source`'s value determines
    /// `formula`'s via the contrapositive (spec.md §4.5).
    IndirectImplication {
        formula: FormulaId,
        value: TruthValue,
        source: FormulaId,
        source_justification: Box<Justification>,
    },

    /// `formula`'s value was inverted out of a parent formula's solved
    /// value (and, for binary parents, its sibling's), per spec.md §4.5's
    /// inversion tables.
    ParentStructural {
        formula: FormulaId,
        value: TruthValue,
        parent: FormulaId,
        parent_justification: Box<Justification>,
        sibling_justification: Option<Box<Justification>>,
    },

    /// `formula` is a compound and its value was computed directly from
    /// its (already-solved) operands via the forward truth tables.
    ChildStructural {
        formula: FormulaId,
        value: TruthValue,
        child_justifications: Vec<Justification>,
    },
}

impl Justification {
    pub fn formula(&self) -> FormulaId {
        match self {
            Justification::DefinedFact { formula, .. }
            | Justification::Default { formula }
            | Justification::Equivalence { formula, .. }
            | Justification::ForwardImplication { formula, .. }
            | Justification::IndirectImplication { formula, .. }
            | Justification::ParentStructural { formula, .. }
            | Justification::ChildStructural { formula, .. } => *formula,
        }
    }

    pub fn value(&self) -> TruthValue {
        match self {
            Justification::DefinedFact { value, .. } => *value,
            Justification::Default { .. } => TruthValue::False,
            Justification::Equivalence { source_justification, .. } => source_justification.value(),
            Justification::ForwardImplication { value, .. } => *value,
            Justification::IndirectImplication { value, .. } => *value,
            Justification::ParentStructural { value, .. } => *value,
            Justification::ChildStructural { value, .. } => *value,
        }
    }

    /// Depth of the derivation tree rooted at this justification, per
    /// spec.md §4.6: leaves (`DefinedFact`, `Default`) are length 0;
    /// everything else is one more than the relevant child/children's
    /// lengths (max, for the multi-premise variants).
    pub fn length(&self) -> usize {
        match self {
            Justification::DefinedFact { .. } | Justification::Default { .. } => 0,
            Justification::Equivalence { source_justification, .. }
            | Justification::ForwardImplication { source_justification, .. }
            | Justification::IndirectImplication { source_justification, .. } => {
                source_justification.length() + 1
            }
            Justification::ParentStructural {
                parent_justification,
                sibling_justification,
                ..
            } => {
                let parent_len = parent_justification.length();
                let sibling_len = sibling_justification.as_ref().map(|j| j.length()).unwrap_or(0);
                parent_len.max(sibling_len) + 1
            }
            Justification::ChildStructural { child_justifications, .. } => {
                child_justifications.iter().map(|j| j.length()).max().unwrap_or(0) + 1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fid(n: u32) -> FormulaId {
        // FormulaId's constructor is crate-private; tests live inside the
        // crate so this is fine.
        FormulaId::new(n as usize)
    }

    #[test]
    fn leaves_have_length_zero() {
        let fact = Justification::DefinedFact { formula: fid(0), value: TruthValue::True };
        assert_eq!(fact.length(), 0);
        let default = Justification::Default { formula: fid(0) };
        assert_eq!(default.length(), 0);
        assert_eq!(default.value(), TruthValue::False);
    }

    #[test]
    fn forward_implication_length_is_source_plus_one() {
        let fact = Justification::DefinedFact { formula: fid(0), value: TruthValue::True };
        let fi = Justification::ForwardImplication {
            formula: fid(1),
            value: TruthValue::True,
            source: fid(0),
            source_justification: Box::new(fact),
        };
        assert_eq!(fi.length(), 1);
    }

    #[test]
    fn child_structural_length_is_max_plus_one() {
        let short = Justification::DefinedFact { formula: fid(0), value: TruthValue::True };
        let long = Justification::ForwardImplication {
            formula: fid(1),
            value: TruthValue::True,
            source: fid(0),
            source_justification: Box::new(Justification::DefinedFact {
                formula: fid(0),
                value: TruthValue::True,
            }),
        };
        let child = Justification::ChildStructural {
            formula: fid(2),
            value: TruthValue::True,
            child_justifications: vec![short, long],
        };
        assert_eq!(child.length(), 2);
    }
}
