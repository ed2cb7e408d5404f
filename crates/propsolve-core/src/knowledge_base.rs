use std::collections::{BTreeSet, HashMap};

use crate::equivalence::EquivalenceClasses;
use crate::formula::{Formula, FormulaId, InternKey, Operator};
use crate::tautology;
use crate::truth::TruthValue;

/// The relational store around formulas: the arena that owns every
/// interned node, plus the per-formula edge sets and equivalence classes
/// spec.md §3 describes. Edges are append-only; nothing is removed until
/// the `KnowledgeBase` itself is dropped (spec.md §5).
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    nodes: Vec<Formula>,
    intern_map: HashMap<InternKey, FormulaId>,
    implies: Vec<BTreeSet<FormulaId>>,
    implied_by: Vec<BTreeSet<FormulaId>>,
    defined_equivalences: Vec<BTreeSet<FormulaId>>,
    contained_by: Vec<BTreeSet<FormulaId>>,
    initial_fact: HashMap<FormulaId, TruthValue>,
    classes: EquivalenceClasses,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: FormulaId) -> &Formula {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get-or-create the atom for `letter`. Convenience wrapper around
    /// `intern` for the common case of resolving a bare atom from the
    /// parser.
    pub fn atom(&mut self, letter: char) -> FormulaId {
        self.intern(Formula::Atom(letter))
    }

    /// `intern(shape) -> Formula` from spec.md §4.1: return the canonical
    /// node for `shape`, creating it (and running equivalence discovery) on
    /// first encounter.
    pub fn intern(&mut self, shape: Formula) -> FormulaId {
        let key = shape.intern_key();
        if let Some(&existing) = self.intern_map.get(&key) {
            return existing;
        }

        let id = FormulaId::new(self.nodes.len());
        self.nodes.push(shape);
        self.implies.push(BTreeSet::new());
        self.implied_by.push(BTreeSet::new());
        self.defined_equivalences.push(BTreeSet::new());
        self.contained_by.push(BTreeSet::new());
        self.classes.enrol(id);
        self.intern_map.insert(key, id);

        for child in shape.children() {
            self.contained_by[child.index()].insert(id);
        }

        self.discover_equivalences(id);

        id
    }

    /// Equivalence-discovery pass from spec.md §4.2: compare the
    /// newly-interned `id` against every other previously-interned formula
    /// and merge classes on a tautological match.
    fn discover_equivalences(&mut self, id: FormulaId) {
        for other_idx in 0..id.index() {
            let other = FormulaId::new(other_idx);
            if tautology::is_tautologically_equivalent(self, id, other) {
                self.classes.union(id, other);
            }
        }
    }

    /// `=>` rule: add `rhs` to `lhs.implies`, `lhs` to `rhs.implied_by`.
    /// One-directional per spec.md §4.3.
    pub fn add_implication(&mut self, lhs: FormulaId, rhs: FormulaId) {
        self.implies[lhs.index()].insert(rhs);
        self.implied_by[rhs.index()].insert(lhs);
    }

    /// `<=>` rule: merge classes and record the pair as defined (as
    /// opposed to merely deduced) equivalent.
    pub fn add_equivalence(&mut self, a: FormulaId, b: FormulaId) {
        self.classes.mark_defined(a, b);
        self.defined_equivalences[a.index()].insert(b);
        self.defined_equivalences[b.index()].insert(a);
    }

    /// Initial fact line: assert `value` (always `True` per spec.md §4.3,
    /// but kept as a `TruthValue` parameter — see SPEC_FULL.md §3) for
    /// `id`.
    pub fn set_initial_fact(&mut self, id: FormulaId, value: TruthValue) {
        self.initial_fact.insert(id, value);
    }

    pub fn initial_fact(&self, id: FormulaId) -> Option<TruthValue> {
        self.initial_fact.get(&id).copied()
    }

    pub fn implies(&self, id: FormulaId) -> &BTreeSet<FormulaId> {
        &self.implies[id.index()]
    }

    pub fn implied_by(&self, id: FormulaId) -> &BTreeSet<FormulaId> {
        &self.implied_by[id.index()]
    }

    pub fn defined_equivalences(&self, id: FormulaId) -> &BTreeSet<FormulaId> {
        &self.defined_equivalences[id.index()]
    }

    pub fn contained_by(&self, id: FormulaId) -> &BTreeSet<FormulaId> {
        &self.contained_by[id.index()]
    }

    pub fn is_defined_pair(&self, a: FormulaId, b: FormulaId) -> bool {
        self.classes.is_defined_pair(a, b)
    }

    /// Every other member of `id`'s equivalence class, split into those
    /// declared via `<=>` (`DefinedEquivalence` candidates, spec.md §4.5)
    /// and the rest (`DeducedEquivalence` candidates). Read-only — used
    /// from `Solver::solve`, which never mutates the `KnowledgeBase`
    /// (spec.md §5), so this walks classes with `find_ro` rather than the
    /// path-compressing `find` used during construction.
    pub fn class_peers(&self, id: FormulaId) -> (Vec<FormulaId>, Vec<FormulaId>) {
        let root = self.classes.find_ro(id);
        let mut defined = Vec::new();
        let mut deduced = Vec::new();
        for idx in 0..self.nodes.len() {
            let other = FormulaId::new(idx);
            if other == id {
                continue;
            }
            if self.classes.find_ro(other) == root {
                if self.classes.is_defined_pair(id, other) {
                    defined.push(other);
                } else {
                    deduced.push(other);
                }
            }
        }
        (defined, deduced)
    }

    /// Render `id` back to the ASCII surface syntax from spec.md §6
    /// (`+ | ^ !`), with the minimum parenthesization needed to re-parse
    /// identically under the right-associative grammar in
    /// `parser::split_point`.
    pub fn display(&self, id: FormulaId) -> String {
        match *self.node(id) {
            Formula::Atom(c) => c.to_string(),
            Formula::Not(child) => {
                if self.node(child).as_binary().is_some() {
                    format!("!({})", self.display(child))
                } else {
                    format!("!{}", self.display(child))
                }
            }
            Formula::And(l, r) => self.display_binary(Operator::And, l, r),
            Formula::Or(l, r) => self.display_binary(Operator::Or, l, r),
            Formula::Xor(l, r) => self.display_binary(Operator::Xor, l, r),
        }
    }

    fn display_binary(&self, op: Operator, left: FormulaId, right: FormulaId) -> String {
        let lhs = self.display_operand(left, op, true);
        let rhs = self.display_operand(right, op, false);
        format!("{lhs} {} {rhs}", op.symbol())
    }

    fn display_operand(&self, id: FormulaId, parent_op: Operator, is_left: bool) -> String {
        let rendered = self.display(id);
        // Operator::precedence() is higher for looser-binding operators
        // (Xor > Or > And, matching the parser's split-point numbering), so
        // a child binds *looser* than its parent exactly when its number is
        // *greater* — that's when parens are required to re-parse correctly.
        // A same-precedence child on the left also needs parens, since the
        // grammar is right-associative for chains of one operator.
        let needs_parens = match self.node(id).as_binary() {
            Some((child_op, _, _)) => {
                child_op.precedence() > parent_op.precedence()
                    || (child_op.precedence() == parent_op.precedence() && is_left)
            }
            None => false,
        };
        if needs_parens {
            format!("({rendered})")
        } else {
            rendered
        }
    }
}
