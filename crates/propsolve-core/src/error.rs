use thiserror::Error;

/// Malformed input, per spec.md §7. Fatal — no queries are answered when
/// this is returned from the parser.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    #[error("unbalanced parentheses")]
    UnbalancedParens,

    #[error("expected an atom, negation, or parenthesized expression at position {position}")]
    ExpectedAtom { position: usize },

    #[error("atoms must be a single uppercase letter, found '{found}'")]
    InvalidAtom { found: String },

    #[error("rule line '{line}' must contain exactly one '=>' or '<=>'")]
    MalformedRule { line: String },

    #[error("unexpected non-empty line in a separator region: '{line}'")]
    UnexpectedLine { line: String },

    #[error("trailing input after a complete expression at position {position}")]
    TrailingInput { position: usize },
}

/// Errors surfaced from the solver, per spec.md §7. `Cycle` is deliberately
/// absent — it never escapes `Solver::solve` (spec.md §9).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("incoherent knowledge base: {0}")]
    Incoherence(#[from] IncoherenceKind),
}

/// The two ways selection (spec.md §4.7) or parent-structural inversion
/// (spec.md §4.5) can detect mutually contradictory definite values.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IncoherenceKind {
    #[error("both True and False candidates were found for the same formula")]
    ConflictingCandidates,
    #[error("a parent-structural inversion hit an impossible (parent, sibling) pair")]
    ImpossibleParentSibling,
}
