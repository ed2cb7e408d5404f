use std::collections::{BTreeSet, HashMap};

use crate::formula::{Formula, FormulaId};
use crate::knowledge_base::KnowledgeBase;
use crate::truth::{combine, TruthValue};

/// Past this many distinct atoms, `is_tautologically_equivalent` gives up
/// and reports "not equivalent" rather than enumerating `3^n` rows — see
/// spec.md §4.2's note that this is the engine's worst-case hotspot.
const MAX_TAUTOLOGY_ATOMS: usize = 12;

/// Check whether `f` and `g` agree on every one of the `3^n` possible
/// assignments of `{True, False, Undetermined}` to their combined atoms,
/// per spec.md §4.2. Called by `KnowledgeBase::intern` against every
/// previously-interned formula to discover deduced equivalences.
pub fn is_tautologically_equivalent(kb: &KnowledgeBase, f: FormulaId, g: FormulaId) -> bool {
    let mut atoms = BTreeSet::new();
    collect_atoms(kb, f, &mut atoms);
    collect_atoms(kb, g, &mut atoms);
    let atoms: Vec<char> = atoms.into_iter().collect();

    if atoms.len() > MAX_TAUTOLOGY_ATOMS {
        return false;
    }

    let rows = 3usize.pow(atoms.len() as u32);
    let states = [TruthValue::True, TruthValue::False, TruthValue::Undetermined];

    for row in 0..rows {
        let mut env: HashMap<char, TruthValue> = HashMap::with_capacity(atoms.len());
        let mut rest = row;
        for &atom in &atoms {
            env.insert(atom, states[rest % 3]);
            rest /= 3;
        }
        if evaluate(kb, f, &env) != evaluate(kb, g, &env) {
            return false;
        }
    }
    true
}

fn collect_atoms(kb: &KnowledgeBase, id: FormulaId, out: &mut BTreeSet<char>) {
    match *kb.node(id) {
        Formula::Atom(c) => {
            out.insert(c);
        }
        Formula::Not(child) => collect_atoms(kb, child, out),
        Formula::And(l, r) | Formula::Or(l, r) | Formula::Xor(l, r) => {
            collect_atoms(kb, l, out);
            collect_atoms(kb, r, out);
        }
    }
}

/// Pure evaluation of a formula under a full (definite-or-Undetermined)
/// assignment, using the same forward tables as the solver's
/// child-structural candidate (`truth::combine`). An atom missing from
/// `env` (can't happen for atoms collected by `collect_atoms`, but kept
/// total) defaults to `Undetermined`.
fn evaluate(kb: &KnowledgeBase, id: FormulaId, env: &HashMap<char, TruthValue>) -> TruthValue {
    match *kb.node(id) {
        Formula::Atom(c) => *env.get(&c).unwrap_or(&TruthValue::Undetermined),
        Formula::Not(child) => evaluate(kb, child, env).negate(),
        ref node => {
            let (op, l, r) = node.as_binary().expect("non-atom, non-Not formula must be binary");
            combine(op, evaluate(kb, l, env), evaluate(kb, r, env))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_negation_is_tautologically_equivalent_to_atom() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let not_a = kb.intern(Formula::Not(a));
        let not_not_a = kb.intern(Formula::Not(not_a));
        assert!(is_tautologically_equivalent(&kb, a, not_not_a));
    }

    #[test]
    fn de_morgan_and_to_or() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        let not_a = kb.intern(Formula::Not(a));
        let not_b = kb.intern(Formula::Not(b));
        // !(A + B) == !A | !B
        let and_ab = kb.intern(Formula::And(a, b));
        let not_and_ab = kb.intern(Formula::Not(and_ab));
        let or_not = kb.intern(Formula::Or(not_a, not_b));
        assert!(is_tautologically_equivalent(&kb, not_and_ab, or_not));
    }

    #[test]
    fn distinct_formulas_are_not_equivalent() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        assert!(!is_tautologically_equivalent(&kb, a, b));
    }
}
