//! Textual rendering of a solved `Justification` tree.
//!
//! Per spec.md §1 this is explicitly a *consumer* of the core, not part of
//! it: `propsolve_core::Justification` is a structured, renderer-agnostic
//! value, and this module is the one place that turns it into the sentence
//! family from the original `expert_system`'s `Results.py`/`Solution.py`
//! (`"{p} was defined as {val}"`, `"{src} => {p} and {src} is {val}"`, …),
//! indented two spaces per derivation level the way `Solution.make_display_text`
//! nests premises under their conclusion.

use std::collections::HashMap;

use propsolve_core::{EquivalenceKind, FormulaId, Justification, KnowledgeBase, TruthValue};

const INDENT: &str = "  ";

/// The final `<expression> is <VALUE>.` line every query prints, verbose or
/// not (spec.md §6).
pub fn render_value_line(kb: &KnowledgeBase, formula: FormulaId, value: TruthValue) -> String {
    format!("{} is {}.", kb.display(formula), value)
}

/// One node's own sentence, without its premises — the leaf wording and the
/// internal-node wording families from SPEC_FULL.md §6.3, grounded in the
/// original `Result.__str__` implementations.
fn node_sentence(kb: &KnowledgeBase, justification: &Justification) -> String {
    match justification {
        Justification::DefinedFact { formula, value } => {
            format!("{} was defined as {}", kb.display(*formula), value)
        }
        Justification::Default { formula } => {
            format!("{}'s default value is {}", kb.display(*formula), TruthValue::False)
        }
        Justification::Equivalence { formula, kind, source, source_justification } => {
            let reason = match kind {
                EquivalenceKind::Defined => "previously defined",
                EquivalenceKind::Deduced => "logically deduced",
            };
            format!(
                "{} <=> {} ({}) and {} is {}, therefore {} is {}",
                kb.display(*source),
                kb.display(*formula),
                reason,
                kb.display(*source),
                source_justification.value(),
                kb.display(*formula),
                justification.value(),
            )
        }
        Justification::ForwardImplication { formula, source, source_justification, .. } => {
            format!(
                "{} => {} and {} is {}",
                kb.display(*source),
                kb.display(*formula),
                kb.display(*source),
                source_justification.value(),
            )
        }
        Justification::IndirectImplication { formula, value, source, source_justification } => {
            format!(
                "{} => {} and {} is {}, therefore {} is {}",
                kb.display(*formula),
                kb.display(*source),
                kb.display(*source),
                source_justification.value(),
                kb.display(*formula),
                value,
            )
        }
        Justification::ParentStructural { formula, value, parent, parent_justification, sibling_justification } => {
            match sibling_justification {
                Some(sibling) => format!(
                    "{} is {} and {} is {}, therefore {} is {}",
                    kb.display(sibling.formula()),
                    sibling.value(),
                    kb.display(*parent),
                    parent_justification.value(),
                    kb.display(*formula),
                    value,
                ),
                None => format!(
                    "{} is {}, therefore {} is {}",
                    kb.display(*parent),
                    parent_justification.value(),
                    kb.display(*formula),
                    value,
                ),
            }
        }
        Justification::ChildStructural { formula, value, child_justifications } => {
            let parts: Vec<String> = child_justifications
                .iter()
                .map(|j| format!("{} is {}", kb.display(j.formula()), j.value()))
                .collect();
            format!("{}, therefore {} is {}", parts.join(" and "), kb.display(*formula), value)
        }
    }
}

/// Premises to recurse into before printing a node's own sentence, in the
/// order `Solution.make_display_text` walks `parent_solutions`.
fn premises(justification: &Justification) -> Vec<&Justification> {
    match justification {
        Justification::DefinedFact { .. } | Justification::Default { .. } => vec![],
        Justification::Equivalence { source_justification, .. }
        | Justification::ForwardImplication { source_justification, .. }
        | Justification::IndirectImplication { source_justification, .. } => {
            vec![source_justification.as_ref()]
        }
        Justification::ParentStructural { parent_justification, sibling_justification, .. } => {
            let mut out = vec![parent_justification.as_ref()];
            if let Some(sibling) = sibling_justification {
                out.push(sibling.as_ref());
            }
            out
        }
        Justification::ChildStructural { child_justifications, .. } => {
            child_justifications.iter().collect()
        }
    }
}

/// Render the full derivation tree for `--verbose`: premises depth-first,
/// each line indented two spaces per level, deepest first.
pub fn render_tree(kb: &KnowledgeBase, justification: &Justification) -> String {
    let mut lines = Vec::new();
    render_tree_into(kb, justification, 0, &mut lines);
    lines.join("\n")
}

fn render_tree_into(kb: &KnowledgeBase, justification: &Justification, depth: usize, lines: &mut Vec<String>) {
    for premise in premises(justification) {
        render_tree_into(kb, premise, depth + 1, lines);
    }
    lines.push(format!("{}{}", INDENT.repeat(depth), node_sentence(kb, justification)));
}

/// Render `--debug`'s additional "every candidate considered" listing for
/// one formula, one line per candidate, the winner marked. `trace` is
/// `Solver::candidate_trace`'s per-formula record.
pub fn render_candidates(
    kb: &KnowledgeBase,
    trace: &HashMap<FormulaId, Vec<Justification>>,
    winner: &Justification,
) -> String {
    let mut lines = Vec::new();
    render_candidates_into(kb, trace, winner, 0, &mut lines);
    lines.join("\n")
}

fn render_candidates_into(
    kb: &KnowledgeBase,
    trace: &HashMap<FormulaId, Vec<Justification>>,
    justification: &Justification,
    depth: usize,
    lines: &mut Vec<String>,
) {
    for premise in premises(justification) {
        render_candidates_into(kb, trace, premise, depth + 1, lines);
    }
    let pad = INDENT.repeat(depth);
    if let Some(candidates) = trace.get(&justification.formula()) {
        for candidate in candidates {
            let marker = if candidates_match(candidate, justification) { "* " } else { "  " };
            lines.push(format!("{pad}{marker}{}", node_sentence(kb, candidate)));
        }
    } else {
        lines.push(format!("{pad}{}", node_sentence(kb, justification)));
    }
}

/// Candidates don't implement `PartialEq` (they carry boxed sub-justifications
/// that could legitimately differ in content while representing "the same
/// candidate shape"); identify the winner among a formula's candidates by
/// variant-and-cited-formula, which is unique per `enumerate_candidates`.
fn candidates_match(a: &Justification, b: &Justification) -> bool {
    use Justification::*;
    match (a, b) {
        (DefinedFact { formula: f1, .. }, DefinedFact { formula: f2, .. }) => f1 == f2,
        (Default { formula: f1 }, Default { formula: f2 }) => f1 == f2,
        (Equivalence { source: s1, .. }, Equivalence { source: s2, .. }) => s1 == s2,
        (ForwardImplication { source: s1, .. }, ForwardImplication { source: s2, .. }) => s1 == s2,
        (IndirectImplication { source: s1, .. }, IndirectImplication { source: s2, .. }) => s1 == s2,
        (ParentStructural { parent: p1, .. }, ParentStructural { parent: p2, .. }) => p1 == p2,
        (ChildStructural { formula: f1, .. }, ChildStructural { formula: f2, .. }) => f1 == f2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propsolve_core::Solver;

    #[test]
    fn value_line_matches_original_wording() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        assert_eq!(render_value_line(&kb, a, TruthValue::True), "A is True.");
    }

    #[test]
    fn tree_indents_premises_one_level_deeper() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let b = kb.atom('B');
        kb.set_initial_fact(a, TruthValue::True);
        kb.add_implication(a, b);
        let justification = Solver::new(&kb).solve(b).unwrap();
        let rendered = render_tree(&kb, &justification);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("  "), "premise line should be indented");
        assert!(!lines[1].starts_with(' '), "conclusion line should be at depth 0");
    }

    #[test]
    fn debug_listing_marks_the_winner() {
        let mut kb = KnowledgeBase::new();
        let a = kb.atom('A');
        let c = kb.atom('C');
        kb.set_initial_fact(a, TruthValue::True);
        kb.set_initial_fact(c, TruthValue::True);
        kb.add_implication(c, a);
        let mut solver = Solver::with_trace(&kb);
        let winner = solver.solve(a).unwrap();
        let rendered = render_candidates(&kb, solver.candidate_trace().unwrap(), &winner);
        assert!(rendered.lines().any(|l| l.starts_with("* ")));
    }
}
