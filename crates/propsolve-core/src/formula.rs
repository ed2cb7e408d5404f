use serde::{Deserialize, Serialize};

/// Stable identifier for an interned formula node, indexing into the
/// `KnowledgeBase` arena. Never an owning reference — see spec.md §9's
/// "the arena owns; everything else borrows by id".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormulaId(pub(crate) u32);

impl FormulaId {
    pub(crate) fn new(idx: usize) -> Self {
        FormulaId(idx as u32)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for FormulaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The binary connectives, shared between `Formula`'s variant tags and the
/// truth-table combinator in `truth::combine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
    Xor,
}

impl Operator {
    /// ASCII symbol used by the file format and by rendering, per spec.md §6.
    pub fn symbol(self) -> char {
        match self {
            Operator::And => '+',
            Operator::Or => '|',
            Operator::Xor => '^',
        }
    }

    /// Precedence number used by the parser's top-down split (see
    /// `parser::split_point`). Higher binds looser. `!` is tightest and is
    /// handled outside this table since it's unary.
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Operator::And => 1,
            Operator::Or => 2,
            Operator::Xor => 3,
        }
    }
}

/// A propositional formula node. Children are referenced by `FormulaId`,
/// never owned inline — the tree lives entirely in the `KnowledgeBase`
/// arena, and children are never mutated once a node is interned (spec.md
/// §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Formula {
    Atom(char),
    Not(FormulaId),
    And(FormulaId, FormulaId),
    Or(FormulaId, FormulaId),
    Xor(FormulaId, FormulaId),
}

impl Formula {
    /// View a binary node as `(operator, left, right)`, for code that wants
    /// to treat And/Or/Xor uniformly (tautology evaluation, child-structural
    /// candidates).
    pub fn as_binary(&self) -> Option<(Operator, FormulaId, FormulaId)> {
        match *self {
            Formula::And(l, r) => Some((Operator::And, l, r)),
            Formula::Or(l, r) => Some((Operator::Or, l, r)),
            Formula::Xor(l, r) => Some((Operator::Xor, l, r)),
            Formula::Not(_) | Formula::Atom(_) => None,
        }
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Formula::Atom(_))
    }

    /// Direct children, in left-to-right order. Empty for atoms.
    pub(crate) fn children(&self) -> Vec<FormulaId> {
        match *self {
            Formula::Atom(_) => vec![],
            Formula::Not(c) => vec![c],
            Formula::And(l, r) | Formula::Or(l, r) | Formula::Xor(l, r) => vec![l, r],
        }
    }

    /// The interning key: atom letter, or `(operator-ish tag, unordered id
    /// pair)` for commutative binaries, or `("!", child)` for negation.
    /// Commutativity is implemented by sorting the pair before hashing, per
    /// spec.md §4.1.
    pub(crate) fn intern_key(&self) -> InternKey {
        match *self {
            Formula::Atom(c) => InternKey::Atom(c),
            Formula::Not(c) => InternKey::Not(c),
            Formula::And(l, r) => InternKey::Binary(Operator::And, order_pair(l, r)),
            Formula::Or(l, r) => InternKey::Binary(Operator::Or, order_pair(l, r)),
            Formula::Xor(l, r) => InternKey::Binary(Operator::Xor, order_pair(l, r)),
        }
    }
}

fn order_pair(a: FormulaId, b: FormulaId) -> (FormulaId, FormulaId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum InternKey {
    Atom(char),
    Not(FormulaId),
    Binary(Operator, (FormulaId, FormulaId)),
}
