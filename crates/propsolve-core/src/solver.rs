use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::equivalence::EquivalenceKind;
use crate::error::{EngineError, IncoherenceKind};
use crate::formula::{FormulaId, Operator};
use crate::justification::Justification;
use crate::knowledge_base::KnowledgeBase;
use crate::truth::TruthValue;

/// Outcome of resolving one formula during a single top-level `solve` call.
/// `Cycle` never escapes `Solver::solve` — it is only ever consumed by the
/// candidate that triggered it, which discards itself in response.
enum Resolution {
    Done(Justification),
    Cycle,
}

/// Backward-chaining resolver over a `KnowledgeBase`, per spec.md §4.5.
///
/// A `Solver` is built fresh for each top-level query (`Solver::new` then
/// one `solve` call); `stack` and `memo` are scoped to that single call and
/// are never reused across queries, matching spec.md §5's "justifications
/// are freshly allocated per solve call". Within one call, `memo` ensures
/// every formula is resolved at most once: without it, a formula reachable
/// from itself through more than one structural relation (e.g. both as an
/// operand of a conjunction and as the operand of a sibling negation) can
/// be resolved twice on different recursion paths and get two different
/// answers, one of which is built on a `Default` that the other path's
/// result then silently contradicts. Memoizing closes that gap and is what
/// makes repeated `solve` calls for the same query deterministic (spec.md
/// §8, property 1).
pub struct Solver<'kb> {
    kb: &'kb KnowledgeBase,
    stack: HashSet<FormulaId>,
    memo: HashMap<FormulaId, Justification>,
    candidate_trace: Option<HashMap<FormulaId, Vec<Justification>>>,
}

impl<'kb> Solver<'kb> {
    pub fn new(kb: &'kb KnowledgeBase) -> Self {
        Solver { kb, stack: HashSet::new(), memo: HashMap::new(), candidate_trace: None }
    }

    /// Like `new`, but also records every candidate justification considered
    /// for every formula touched during the call — not just the winners —
    /// for the CLI's `--debug` mode (spec.md §6: "every candidate
    /// justification"). Retrieve with `candidate_trace` after `solve`.
    pub fn with_trace(kb: &'kb KnowledgeBase) -> Self {
        Solver { kb, stack: HashSet::new(), memo: HashMap::new(), candidate_trace: Some(HashMap::new()) }
    }

    /// Every candidate considered for each formula reached while solving,
    /// in enumeration order, keyed by formula. Empty unless this `Solver`
    /// was built with `with_trace`.
    pub fn candidate_trace(&self) -> Option<&HashMap<FormulaId, Vec<Justification>>> {
        self.candidate_trace.as_ref()
    }

    /// Resolve `goal` to a value and justification. Never returns `Unknown`
    /// — that variant exists only to give `TruthValue` a name for the
    /// solver-internal cycle case, which this function fully absorbs.
    pub fn solve(&mut self, goal: FormulaId) -> Result<Justification, EngineError> {
        debug!("solving {}", self.kb.display(goal));
        let justification = match self.resolve(goal)? {
            Resolution::Done(j) => j,
            // Unreachable: the stack is empty at the outermost call, so
            // `goal` can never be "currently on the resolution stack".
            // Kept as a Default fallback rather than a panic/unwrap so a
            // future change to the entry conditions fails safe.
            Resolution::Cycle => Justification::Default { formula: goal },
        };
        debug_assert!(
            justification.value().is_definite() || justification.value() == TruthValue::Undetermined,
            "solve must never surface Unknown"
        );
        Ok(justification)
    }

    fn resolve(&mut self, id: FormulaId) -> Result<Resolution, EngineError> {
        if let Some(j) = self.memo.get(&id) {
            return Ok(Resolution::Done(j.clone()));
        }
        if self.stack.contains(&id) {
            trace!("cycle at {}", self.kb.display(id));
            return Ok(Resolution::Cycle);
        }

        self.stack.insert(id);
        let candidates = self.enumerate_candidates(id)?;
        self.stack.remove(&id);

        if let Some(trace) = self.candidate_trace.as_mut() {
            trace.insert(id, candidates.clone());
        }

        let winner = select(id, candidates)?;
        self.memo.insert(id, winner.clone());
        Ok(Resolution::Done(winner))
    }

    /// Build every applicable candidate justification for `id`, per the
    /// enumeration order of spec.md §4.5. Candidates whose premise required
    /// solving a formula still on the stack are silently dropped (the
    /// `Cycle` case); candidates that are structurally inert (a
    /// false-premise forward implication, or a true-premise contrapositive)
    /// are dropped too rather than contributing a hollow `Undetermined`
    /// entry — see DESIGN.md for why the literal "yields Undetermined"
    /// wording in spec.md §4.5 would otherwise make `Default` unreachable
    /// even in spec.md §8's own worked examples.
    fn enumerate_candidates(&mut self, id: FormulaId) -> Result<Vec<Justification>, EngineError> {
        let mut out = Vec::new();

        if let Some(value) = self.kb.initial_fact(id) {
            out.push(Justification::DefinedFact { formula: id, value });
        }

        let (defined_peers, deduced_peers) = self.kb.class_peers(id);
        for source in defined_peers {
            if let Resolution::Done(source_justification) = self.resolve(source)? {
                out.push(Justification::Equivalence {
                    formula: id,
                    kind: EquivalenceKind::Defined,
                    source,
                    source_justification: Box::new(source_justification),
                });
            }
        }
        for source in deduced_peers {
            if let Resolution::Done(source_justification) = self.resolve(source)? {
                out.push(Justification::Equivalence {
                    formula: id,
                    kind: EquivalenceKind::Deduced,
                    source,
                    source_justification: Box::new(source_justification),
                });
            }
        }

        for source in self.kb.implied_by(id).clone() {
            if let Resolution::Done(source_justification) = self.resolve(source)? {
                let source_value = source_justification.value();
                if let Some(value) = forward_implication(source_value) {
                    out.push(Justification::ForwardImplication {
                        formula: id,
                        value,
                        source,
                        source_justification: Box::new(source_justification),
                    });
                }
            }
        }

        for source in self.kb.implies(id).clone() {
            if let Resolution::Done(source_justification) = self.resolve(source)? {
                let source_value = source_justification.value();
                if let Some(value) = indirect_implication(source_value) {
                    out.push(Justification::IndirectImplication {
                        formula: id,
                        value,
                        source,
                        source_justification: Box::new(source_justification),
                    });
                }
            }
        }

        for parent in self.kb.contained_by(id).clone() {
            if let Some(candidate) = self.parent_structural_candidate(id, parent)? {
                out.push(candidate);
            }
        }

        if !self.kb.node(id).is_atom() {
            if let Some(candidate) = self.child_structural_candidate(id)? {
                out.push(candidate);
            }
        }

        Ok(out)
    }

    fn parent_structural_candidate(
        &mut self,
        id: FormulaId,
        parent: FormulaId,
    ) -> Result<Option<Justification>, EngineError> {
        let parent_justification = match self.resolve(parent)? {
            Resolution::Done(j) => j,
            Resolution::Cycle => return Ok(None),
        };
        let parent_value = parent_justification.value();

        let (op, left, right) = match self.kb.node(parent).as_binary() {
            Some(triple) => triple,
            None => {
                // Parent is `Not`; `id` is its sole child, no sibling.
                let value = parent_value.negate();
                return Ok(Some(Justification::ParentStructural {
                    formula: id,
                    value,
                    parent,
                    parent_justification: Box::new(parent_justification),
                    sibling_justification: None,
                }));
            }
        };
        let sibling = if left == id {
            right
        } else {
            left
        };
        let sibling_justification = match self.resolve(sibling)? {
            Resolution::Done(j) => j,
            Resolution::Cycle => return Ok(None),
        };
        let sibling_value = sibling_justification.value();

        let value = match invert(op, parent_value, sibling_value) {
            Ok(value) => value,
            Err(kind) => return Err(EngineError::Incoherence(kind)),
        };
        Ok(Some(Justification::ParentStructural {
            formula: id,
            value,
            parent,
            parent_justification: Box::new(parent_justification),
            sibling_justification: Some(Box::new(sibling_justification)),
        }))
    }

    fn child_structural_candidate(
        &mut self,
        id: FormulaId,
    ) -> Result<Option<Justification>, EngineError> {
        let node = *self.kb.node(id);
        if let Some((op, left, right)) = node.as_binary() {
            let left_j = match self.resolve(left)? {
                Resolution::Done(j) => j,
                Resolution::Cycle => return Ok(None),
            };
            let right_j = match self.resolve(right)? {
                Resolution::Done(j) => j,
                Resolution::Cycle => return Ok(None),
            };
            let value = crate::truth::combine(op, left_j.value(), right_j.value());
            return Ok(Some(Justification::ChildStructural {
                formula: id,
                value,
                child_justifications: vec![left_j, right_j],
            }));
        }

        // Formula::Not
        let child = node.children().into_iter().next().expect("Not has one child");
        let child_j = match self.resolve(child)? {
            Resolution::Done(j) => j,
            Resolution::Cycle => return Ok(None),
        };
        let value = child_j.value().negate();
        Ok(Some(Justification::ChildStructural {
            formula: id,
            value,
            child_justifications: vec![child_j],
        }))
    }
}

/// Forward-implication table from spec.md §4.5: `source => id` with
/// `source` solved to `source_value`. `None` means the candidate is inert
/// (a false premise proves nothing about `id`) and should not be added to
/// the candidate pool at all.
fn forward_implication(source_value: TruthValue) -> Option<TruthValue> {
    match source_value {
        TruthValue::True => Some(TruthValue::True),
        TruthValue::Undetermined => Some(TruthValue::Undetermined),
        TruthValue::False => None,
        TruthValue::Unknown => None,
    }
}

/// Contrapositive table from spec.md §4.5: `id => source`, `source` solved
/// to `source_value`. `None` means inert (a true premise proves nothing
/// about `id`).
fn indirect_implication(source_value: TruthValue) -> Option<TruthValue> {
    match source_value {
        TruthValue::False => Some(TruthValue::False),
        TruthValue::Undetermined => Some(TruthValue::Undetermined),
        TruthValue::True => None,
        TruthValue::Unknown => None,
    }
}

/// Parent-structural inversion tables from spec.md §4.5: given a binary
/// parent's operator, its solved value, and its sibling operand's solved
/// value, derive `id`'s value (or report that no assignment is consistent).
fn invert(op: Operator, parent: TruthValue, sibling: TruthValue) -> Result<TruthValue, IncoherenceKind> {
    use TruthValue::*;
    match op {
        Operator::And => match (parent, sibling) {
            (True, False) => Err(IncoherenceKind::ImpossibleParentSibling),
            (True, True) | (True, Undetermined) => Ok(True),
            (False, True) => Ok(False),
            (False, False) | (False, Undetermined) => Ok(Undetermined),
            _ => Ok(Undetermined),
        },
        Operator::Or => match (parent, sibling) {
            (False, True) => Err(IncoherenceKind::ImpossibleParentSibling),
            (True, False) => Ok(True),
            (True, True) | (True, Undetermined) => Ok(Undetermined),
            (False, False) => Ok(False),
            (False, Undetermined) => Ok(False),
            _ => Ok(Undetermined),
        },
        Operator::Xor => match (parent, sibling) {
            (True, False) | (False, True) => Ok(True),
            (True, True) | (False, False) => Ok(False),
            _ => Ok(Undetermined),
        },
    }
}

/// Selection rule from spec.md §4.7: pick the winning candidate for a
/// formula out of every candidate `enumerate_candidates` produced, falling
/// back to `Default` when the pool is empty (every candidate was either
/// discarded as cyclic or excluded as inert).
fn select(id: FormulaId, candidates: Vec<Justification>) -> Result<Justification, EngineError> {
    if candidates.is_empty() {
        return Ok(Justification::Default { formula: id });
    }

    let has_true = candidates.iter().any(|j| j.value() == TruthValue::True);
    let has_false = candidates.iter().any(|j| j.value() == TruthValue::False);
    if has_true && has_false {
        return Err(EngineError::Incoherence(IncoherenceKind::ConflictingCandidates));
    }

    let pick_shortest = |value: TruthValue| {
        candidates
            .iter()
            .filter(|j| j.value() == value)
            .min_by_key(|j| j.length())
            .cloned()
    };

    if has_true {
        return Ok(pick_shortest(TruthValue::True).expect("has_true checked above"));
    }
    if has_false {
        return Ok(pick_shortest(TruthValue::False).expect("has_false checked above"));
    }
    if let Some(winner) = pick_shortest(TruthValue::Undetermined) {
        return Ok(winner);
    }

    Ok(Justification::Default { formula: id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    #[test]
    fn fact_solves_directly() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        kb.set_initial_fact(a, TruthValue::True);
        let justification = Solver::new(&kb).solve(a).unwrap();
        assert_eq!(justification.value(), TruthValue::True);
        assert_eq!(justification.length(), 0);
    }

    #[test]
    fn unknown_atom_defaults_to_false() {
        let mut kb = KnowledgeBase::new();
        let b = kb.atom('B');
        let justification = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(justification.value(), TruthValue::False);
        assert!(matches!(justification, Justification::Default { .. }));
    }

    #[test]
    fn forward_implication_carries_true() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.add_implication(a, b);
        let justification = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(justification.value(), TruthValue::True);
        assert_eq!(justification.length(), 1);
    }

    #[test]
    fn false_premise_forward_implication_is_inert_not_undetermined() {
        // A => B; no facts at all. B must fall through to Default (False),
        // not to an Undetermined candidate built on A's own Default.
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.add_implication(a, b);
        let justification = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(justification.value(), TruthValue::False);
        assert!(matches!(justification, Justification::Default { .. }));
    }

    #[test]
    fn contradictory_premise_falls_back_to_default() {
        // A + !A => B; no facts. The premise can never be satisfied, so B
        // has no usable candidate and defaults to False.
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        let not_a = kb.intern(Formula::Not(a));
        let and_ = kb.intern(Formula::And(a, not_a));
        kb.add_implication(and_, b);
        let justification = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(justification.value(), TruthValue::False);
        assert!(matches!(justification, Justification::Default { .. }));
    }

    #[test]
    fn or_with_one_true_fact_solves_true() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        let c = kb.atom('C');
        kb.set_initial_fact(a, TruthValue::True);
        let or_ab = kb.intern(Formula::Or(a, b));
        kb.add_implication(or_ab, c);
        let justification = Solver::new(&kb).solve(c).unwrap();
        assert_eq!(justification.value(), TruthValue::True);
        assert_eq!(justification.length(), 2);
    }

    #[test]
    fn defined_equivalence_carries_value_with_length_one() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.add_equivalence(a, b);
        let justification = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(justification.value(), TruthValue::True);
        assert_eq!(justification.length(), 1);
        assert!(matches!(justification, Justification::Equivalence { kind: EquivalenceKind::Defined, .. }));
    }

    #[test]
    fn conflicting_facts_raise_incoherence() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.set_initial_fact(b, TruthValue::False);
        kb.add_equivalence(a, b);
        let err = Solver::new(&kb).solve(a).unwrap_err();
        assert!(matches!(err, EngineError::Incoherence(IncoherenceKind::ConflictingCandidates)));
    }

    #[test]
    fn repeated_solve_is_deterministic() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.add_implication(a, b);
        let first = Solver::new(&kb).solve(b).unwrap();
        let second = Solver::new(&kb).solve(b).unwrap();
        assert_eq!(first.value(), second.value());
        assert_eq!(first.length(), second.length());
    }

    #[test]
    fn solve_value_is_always_in_the_three_valued_closure() {
        // Property 2 (spec.md §8): solve(f).value is never Unknown, for a
        // handful of representative shapes (atom, compound, cyclic).
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.add_implication(a, b);
        kb.add_implication(b, a); // cycle
        let and_ab = kb.intern(Formula::And(a, b));
        for goal in [a, b, and_ab] {
            let value = Solver::new(&kb).solve(goal).unwrap().value();
            assert!(matches!(value, TruthValue::True | TruthValue::False | TruthValue::Undetermined));
        }
    }

    #[test]
    fn definite_atoms_match_classical_boolean_evaluation() {
        // Property 3 (spec.md §8): when every atom has a definite value,
        // solve(f).value matches plain Boolean evaluation of f.
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.set_initial_fact(b, TruthValue::False);
        let and_ab = kb.intern(Formula::And(a, b));
        let or_ab = kb.intern(Formula::Or(a, b));
        let xor_ab = kb.intern(Formula::Xor(a, b));
        assert_eq!(Solver::new(&kb).solve(and_ab).unwrap().value(), TruthValue::False);
        assert_eq!(Solver::new(&kb).solve(or_ab).unwrap().value(), TruthValue::True);
        assert_eq!(Solver::new(&kb).solve(xor_ab).unwrap().value(), TruthValue::True);
    }

    #[test]
    fn double_negation_matches_the_atom() {
        // Property 4 (spec.md §8): solve(¬¬A) == solve(A) under any KB.
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        kb.set_initial_fact(a, TruthValue::True);
        let not_a = kb.intern(Formula::Not(a));
        let not_not_a = kb.intern(Formula::Not(not_a));
        assert_eq!(
            Solver::new(&kb).solve(not_not_a).unwrap().value(),
            Solver::new(&kb).solve(a).unwrap().value(),
        );
    }

    #[test]
    fn contrapositive_propagates_false_backward() {
        // Property 7 (spec.md §8): P => Q in the KB and solve(Q) == False
        // implies solve(P) == False.
        let mut kb = KnowledgeBase::new();
        let p = kb.atom('P');
        let q = kb.atom('Q');
        kb.add_implication(p, q);
        kb.set_initial_fact(q, TruthValue::False);
        assert_eq!(Solver::new(&kb).solve(p).unwrap().value(), TruthValue::False);
    }

    #[test]
    fn trace_records_every_candidate_not_just_the_winner() {
        // A is both an initial fact and the target of C => A; only the fact
        // should win, but the trace should still hold both candidates.
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let c = kb.atom('C');
        kb.set_initial_fact(a, TruthValue::True);
        kb.set_initial_fact(c, TruthValue::True);
        kb.add_implication(c, a);
        let mut solver = Solver::with_trace(&kb);
        let winner = solver.solve(a).unwrap();
        assert_eq!(winner.value(), TruthValue::True);
        let trace = solver.candidate_trace().unwrap();
        let candidates_for_a = trace.get(&a).expect("a should have been traced");
        assert!(candidates_for_a.len() >= 2, "expected both the fact and the implication as candidates");
    }
}
