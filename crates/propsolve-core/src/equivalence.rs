use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::formula::FormulaId;

/// Distinguishes a `<=>`-declared pair from one whose class membership was
/// only discovered by the tautology check. Carried on `Justification::Equivalence`
/// so the rendered sentence can say which kind of equivalence fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquivalenceKind {
    Defined,
    Deduced,
}

/// Union-find over formula ids, with path compression, plus a side table
/// recording which member pairs were *defined* equivalent (via `<=>`) as
/// opposed to merely *deduced* equivalent (via the tautology check in
/// `tautology::is_tautologically_equivalent`). Per spec.md §3: every
/// formula belongs to exactly one class, classes merge but never split.
#[derive(Debug, Default)]
pub struct EquivalenceClasses {
    parent: Vec<FormulaId>,
    rank: Vec<u8>,
    defined_pairs: HashSet<(FormulaId, FormulaId)>,
}

fn normalize(a: FormulaId, b: FormulaId) -> (FormulaId, FormulaId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl EquivalenceClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrol a freshly-interned formula in its own singleton class. Must be
    /// called exactly once per id, in id order (ids are assigned
    /// sequentially by the arena, so this is always a push).
    pub fn enrol(&mut self, id: FormulaId) {
        debug_assert_eq!(id.index(), self.parent.len(), "ids must be enrolled in order");
        self.parent.push(id);
        self.rank.push(0);
    }

    pub fn find(&mut self, id: FormulaId) -> FormulaId {
        let idx = id.index();
        if self.parent[idx] != id {
            let root = self.find(self.parent[idx]);
            self.parent[idx] = root;
        }
        self.parent[idx]
    }

    /// Root lookup without path compression, for callers that only have a
    /// shared borrow (`Solver::solve` never mutates the `KnowledgeBase` it
    /// solves against, per spec.md §5). Same result as `find`, just without
    /// the amortized speedup.
    pub fn find_ro(&self, id: FormulaId) -> FormulaId {
        let mut cur = id;
        while self.parent[cur.index()] != cur {
            cur = self.parent[cur.index()];
        }
        cur
    }

    /// Merge the classes containing `a` and `b`. No-op if already in the
    /// same class.
    pub fn union(&mut self, a: FormulaId, b: FormulaId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (lo, hi) = match (self.rank[ra.index()], self.rank[rb.index()]) {
            (x, y) if x < y => (ra, rb),
            (x, y) if x > y => (rb, ra),
            _ => (ra, rb),
        };
        self.parent[lo.index()] = hi;
        if self.rank[lo.index()] == self.rank[hi.index()] {
            self.rank[hi.index()] += 1;
        }
    }

    /// Record that `a` and `b` were declared equivalent via `<=>` in the
    /// source (as opposed to merely sharing a deduced class). Also unions
    /// their classes, since a defined equivalence implies class membership.
    pub fn mark_defined(&mut self, a: FormulaId, b: FormulaId) {
        self.union(a, b);
        self.defined_pairs.insert(normalize(a, b));
    }

    pub fn is_defined_pair(&self, a: FormulaId, b: FormulaId) -> bool {
        self.defined_pairs.contains(&normalize(a, b))
    }

    pub fn same_class(&mut self, a: FormulaId, b: FormulaId) -> bool {
        self.find(a) == self.find(b)
    }
}
