use serde::{Deserialize, Serialize};

use crate::formula::Operator;

/// The three-valued lattice the engine reasons in, plus the solver-internal
/// "not yet computed" marker.
///
/// `Unknown` never escapes `Solver::solve` — it exists only to let the
/// recursion-stack cycle guard (see `solver`) name "this formula is currently
/// being solved on the path that reached it".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruthValue {
    True,
    False,
    Undetermined,
    Unknown,
}

impl TruthValue {
    /// `¬` per spec.md §4.4. `Unknown` propagates unchanged — it is never
    /// actually observed by a caller, but keeping the table total avoids an
    /// unreachable!() in a spot that's easy to accidentally exercise while
    /// refactoring the solver.
    pub fn negate(self) -> TruthValue {
        match self {
            TruthValue::True => TruthValue::False,
            TruthValue::False => TruthValue::True,
            TruthValue::Undetermined => TruthValue::Undetermined,
            TruthValue::Unknown => TruthValue::Unknown,
        }
    }

    pub fn is_definite(self) -> bool {
        matches!(self, TruthValue::True | TruthValue::False)
    }
}

impl std::fmt::Display for TruthValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TruthValue::True => "True",
            TruthValue::False => "False",
            TruthValue::Undetermined => "Undetermined",
            TruthValue::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// Forward evaluation table for a binary connective, per spec.md §4.4.
/// Shared verbatim between the tautology-checker's pure evaluation
/// (`tautology::evaluate`) and the solver's child-structural candidate.
pub fn combine(op: Operator, left: TruthValue, right: TruthValue) -> TruthValue {
    use TruthValue::*;
    match op {
        Operator::And => match (left, right) {
            (True, True) => True,
            (False, _) | (_, False) => False,
            _ => Undetermined,
        },
        Operator::Or => match (left, right) {
            (False, False) => False,
            (True, _) | (_, True) => True,
            _ => Undetermined,
        },
        Operator::Xor => match (left, right) {
            (True, False) | (False, True) => True,
            (True, True) | (False, False) => False,
            _ => Undetermined,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negate_table() {
        assert_eq!(TruthValue::True.negate(), TruthValue::False);
        assert_eq!(TruthValue::False.negate(), TruthValue::True);
        assert_eq!(TruthValue::Undetermined.negate(), TruthValue::Undetermined);
    }

    #[test]
    fn and_table() {
        use TruthValue::*;
        assert_eq!(combine(Operator::And, True, True), True);
        assert_eq!(combine(Operator::And, False, True), False);
        assert_eq!(combine(Operator::And, True, False), False);
        assert_eq!(combine(Operator::And, Undetermined, Undetermined), Undetermined);
        assert_eq!(combine(Operator::And, True, Undetermined), Undetermined);
    }

    #[test]
    fn or_table() {
        use TruthValue::*;
        assert_eq!(combine(Operator::Or, False, False), False);
        assert_eq!(combine(Operator::Or, True, False), True);
        assert_eq!(combine(Operator::Or, False, True), True);
        assert_eq!(combine(Operator::Or, Undetermined, Undetermined), Undetermined);
        assert_eq!(combine(Operator::Or, False, Undetermined), Undetermined);
    }

    #[test]
    fn xor_table() {
        use TruthValue::*;
        assert_eq!(combine(Operator::Xor, True, False), True);
        assert_eq!(combine(Operator::Xor, False, True), True);
        assert_eq!(combine(Operator::Xor, True, True), False);
        assert_eq!(combine(Operator::Xor, False, False), False);
        assert_eq!(combine(Operator::Xor, Undetermined, True), Undetermined);
    }
}
