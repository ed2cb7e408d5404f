use crate::error::ParseError;
use crate::formula::{Formula, FormulaId, Operator};
use crate::knowledge_base::KnowledgeBase;
use crate::truth::TruthValue;

/// Strip a trailing `#`-comment and all whitespace, mirroring the original
/// parser's `clean_line` (a blanket whitespace-class regex substitution
/// plus a comment cut).
fn clean_line(line: &str) -> String {
    let without_comment = line.split('#').next().unwrap_or("");
    without_comment.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_empty_line(line: &str) -> bool {
    clean_line(line).is_empty()
}

/// Find the top-level split point for `chars`, replicating
/// `original_source/src/parsing.py::create_predicate`'s scan: walk left to
/// right tracking paren depth, and at depth 0 remember the operator with
/// the loosest (highest-numbered) precedence seen so far — an operator
/// only replaces the current best on a *strictly* looser precedence, so
/// ties keep the left-most candidate. That makes the split land on the
/// first occurrence of the single loosest operator present, which is what
/// produces a right-associative tree for a chain of same-precedence
/// operators (`A^B^C` → `Xor(A, Xor(B, C))`), not the conventional
/// left-associative reading.
fn split_point(chars: &[char]) -> Result<Option<(usize, Operator)>, ParseError> {
    let mut depth: i32 = 0;
    let mut best: Option<(usize, Operator)> = None;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ParseError::UnbalancedParens);
                }
            }
            '+' | '|' | '^' if depth == 0 => {
                let op = match c {
                    '+' => Operator::And,
                    '|' => Operator::Or,
                    '^' => Operator::Xor,
                    _ => unreachable!(),
                };
                let replace = match best {
                    None => true,
                    Some((_, best_op)) => op.precedence() > best_op.precedence(),
                };
                if replace {
                    best = Some((i, op));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParens);
    }
    Ok(best)
}

/// Recursive-descent-by-split-point parse of one expression, a direct
/// structural analogue of `create_predicate`. `base_pos` is the offset of
/// `chars[0]` in the original (cleaned) line, carried through purely for
/// error messages.
fn parse_chars(kb: &mut KnowledgeBase, chars: &[char], base_pos: usize) -> Result<FormulaId, ParseError> {
    if let Some((idx, op)) = split_point(chars)? {
        let left = parse_chars(kb, &chars[..idx], base_pos)?;
        let right = parse_chars(kb, &chars[idx + 1..], base_pos + idx + 1)?;
        let shape = match op {
            Operator::And => Formula::And(left, right),
            Operator::Or => Formula::Or(left, right),
            Operator::Xor => Formula::Xor(left, right),
        };
        return Ok(kb.intern(shape));
    }

    if chars.is_empty() {
        return Err(ParseError::ExpectedAtom { position: base_pos });
    }

    if chars[0] == '!' {
        let inner = parse_chars(kb, &chars[1..], base_pos + 1)?;
        return Ok(kb.intern(Formula::Not(inner)));
    }

    if chars[0] == '(' && chars[chars.len() - 1] == ')' {
        return parse_chars(kb, &chars[1..chars.len() - 1], base_pos + 1);
    }

    if chars.len() == 1 {
        let c = chars[0];
        if c.is_ascii_uppercase() {
            return Ok(kb.atom(c));
        }
        return Err(ParseError::InvalidAtom { found: c.to_string() });
    }

    // More than one char, no operator, no enclosing parens, no leading `!`:
    // either a stray unrecognized character, or two complete atoms run
    // together with nothing joining them (e.g. "AB").
    if let Some((offset, c)) = chars.iter().copied().enumerate().find(|(_, c)| !is_formula_char(*c)) {
        return Err(ParseError::UnexpectedChar { found: c, position: base_pos + offset });
    }
    if chars[0].is_ascii_uppercase() {
        return Err(ParseError::TrailingInput { position: base_pos + 1 });
    }

    Err(ParseError::ExpectedAtom { position: base_pos })
}

fn is_formula_char(c: char) -> bool {
    c.is_ascii_uppercase() || matches!(c, '!' | '+' | '|' | '^' | '(' | ')')
}

/// Parse a single expression (the grammar behind every rule operand and
/// every query/fact atom), per spec.md §6.
pub fn parse_expression(kb: &mut KnowledgeBase, raw: &str) -> Result<FormulaId, ParseError> {
    let cleaned = clean_line(raw);
    let chars: Vec<char> = cleaned.chars().collect();
    parse_chars(kb, &chars, 0)
}

enum RuleKind {
    Implication,
    Equivalence,
}

/// Split a rule line on its connective, preferring `<=>` over `=>` (the
/// former's substring contains the latter, so the original checks it
/// first too). Exactly one connective occurrence is required.
fn split_rule(line: &str) -> Result<(RuleKind, &str, &str), ParseError> {
    if line.contains("<=>") {
        let mut parts = line.splitn(3, "<=>");
        let lhs = parts.next().unwrap_or("");
        let rhs = parts.next().unwrap_or("");
        if parts.next().is_some() || line.matches("<=>").count() != 1 {
            return Err(ParseError::MalformedRule { line: line.to_string() });
        }
        return Ok((RuleKind::Equivalence, lhs, rhs));
    }
    if line.contains("=>") {
        let mut parts = line.splitn(3, "=>");
        let lhs = parts.next().unwrap_or("");
        let rhs = parts.next().unwrap_or("");
        if parts.next().is_some() || line.matches("=>").count() != 1 {
            return Err(ParseError::MalformedRule { line: line.to_string() });
        }
        return Ok((RuleKind::Implication, lhs, rhs));
    }
    Err(ParseError::MalformedRule { line: line.to_string() })
}

fn parse_rule_line(kb: &mut KnowledgeBase, line: &str) -> Result<(), ParseError> {
    let (kind, lhs, rhs) = split_rule(line)?;
    let lhs_id = parse_expression(kb, lhs)?;
    let rhs_id = parse_expression(kb, rhs)?;
    match kind {
        RuleKind::Implication => kb.add_implication(lhs_id, rhs_id),
        RuleKind::Equivalence => kb.add_equivalence(lhs_id, rhs_id),
    }
    Ok(())
}

/// One letter per atom, in the order they appear (duplicates collapse to
/// their first occurrence — the original stores these in a `set`, which
/// has no defined order at all; fixing the order to "first seen" keeps
/// CLI output deterministic without changing which atoms are touched).
fn parse_atom_letters(kb: &mut KnowledgeBase, line: &str) -> Result<Vec<FormulaId>, ParseError> {
    let cleaned = clean_line(line);
    let mut out = Vec::new();
    for c in cleaned.chars().skip(1) {
        if !c.is_ascii_uppercase() {
            return Err(ParseError::InvalidAtom { found: c.to_string() });
        }
        let id = kb.atom(c);
        if !out.contains(&id) {
            out.push(id);
        }
    }
    Ok(out)
}

/// Result of parsing a full source file: the constructed knowledge base
/// plus the ids to query, in file order.
pub struct ParsedSource {
    pub kb: KnowledgeBase,
    pub queries: Vec<FormulaId>,
}

/// Mirrors `original_source/src/parsing.py::parse`'s numbered states
/// one-for-one (0 leading blanks, 1 rules, 2 blank-after-rules, 3 facts
/// line, 4 mandatory-blank-after-facts, 5 blank-after-facts, 6 queries
/// line, 7 done), including its fall-through behavior: a single line can
/// advance through several of these in one pass (e.g. the very first
/// non-blank line of the file is both the 0→1 transition and an immediate
/// rule line).
#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    LeadingBlank,
    Rules,
    BlankAfterRules,
    Facts,
    MandatoryBlankAfterFacts,
    BlankAfterFacts,
    Queries,
    Done,
}

/// Parse a whole source file, per spec.md §6's format: an optional run of
/// blank lines, a block of rule lines (`=>` / `<=>`), a blank separator, an
/// optional initial-facts line (`=ABC`), another blank separator, and a
/// queries line (`?ABC`). A non-blank line where a separator is expected is
/// `ParseError::UnexpectedLine`. Trailing content after the queries line is
/// silently ignored, matching the original's `parse`: its own second
/// `if state == 6:` check for this case is dead code (the queries branch
/// already advances state to 7 and `continue`s first), so real trailing
/// garbage never actually gets rejected there (see SPEC_FULL.md §4.3).
pub fn parse_source(source: &str) -> Result<ParsedSource, ParseError> {
    let mut kb = KnowledgeBase::new();
    let mut queries = Vec::new();
    let mut state = State::LeadingBlank;

    for line in source.lines() {
        let cleaned = clean_line(line);
        let empty = cleaned.is_empty();

        if state == State::LeadingBlank && !empty {
            state = State::Rules;
        }

        if state == State::Rules {
            if cleaned.starts_with('?') {
                state = State::Queries;
            } else if cleaned.starts_with('=') {
                state = State::Facts;
            } else if empty {
                state = State::BlankAfterRules;
            } else {
                parse_rule_line(&mut kb, &cleaned)?;
            }
        }

        if state == State::BlankAfterRules && !empty {
            state = State::Facts;
        }

        if state == State::Facts {
            for id in parse_atom_letters(&mut kb, &cleaned)? {
                kb.set_initial_fact(id, TruthValue::True);
            }
            state = State::MandatoryBlankAfterFacts;
            continue;
        }

        if state == State::MandatoryBlankAfterFacts {
            if !empty {
                return Err(ParseError::UnexpectedLine { line: cleaned });
            }
            state = State::BlankAfterFacts;
        }

        if state == State::BlankAfterFacts && !empty {
            state = State::Queries;
        }

        if state == State::Queries {
            queries = parse_atom_letters(&mut kb, &cleaned)?;
            state = State::Done;
            continue;
        }

        // State::Done: anything after the queries line is ignored. The
        // original's `parse` has a second `if state == 6:` check here, but
        // it's dead — the queries branch above already advances state to 7
        // and `continue`s before that check runs, so trailing content is
        // silently accepted, not rejected.
    }

    Ok(ParsedSource { kb, queries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_atom() {
        let mut kb = KnowledgeBase::new();
        let a = parse_expression(&mut kb, "A").unwrap();
        assert_eq!(kb.display(a), "A");
    }

    #[test]
    fn negation_binds_tighter_than_any_binary() {
        let mut kb = KnowledgeBase::new();
        let id = parse_expression(&mut kb, "!A+B").unwrap();
        assert_eq!(kb.display(id), "!A + B");
    }

    #[test]
    fn xor_chain_is_right_associative() {
        let mut kb = KnowledgeBase::new();
        let id = parse_expression(&mut kb, "A^B^C").unwrap();
        match kb.node(id) {
            Formula::Xor(left, right) => {
                assert_eq!(kb.display(*left), "A");
                assert!(matches!(kb.node(*right), Formula::Xor(_, _)));
            }
            _ => panic!("expected a top-level Xor"),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let mut kb = KnowledgeBase::new();
        let id = parse_expression(&mut kb, "A+B|C").unwrap();
        match kb.node(id) {
            Formula::Or(left, _) => assert!(matches!(kb.node(*left), Formula::And(_, _))),
            _ => panic!("expected a top-level Or"),
        }
    }

    #[test]
    fn parens_override_precedence() {
        let mut kb = KnowledgeBase::new();
        let id = parse_expression(&mut kb, "(A|B)+C").unwrap();
        match kb.node(id) {
            Formula::And(left, _) => assert!(matches!(kb.node(*left), Formula::Or(_, _))),
            _ => panic!("expected a top-level And"),
        }
    }

    #[test]
    fn unbalanced_parens_is_an_error() {
        let mut kb = KnowledgeBase::new();
        assert_eq!(parse_expression(&mut kb, "(A+B").unwrap_err(), ParseError::UnbalancedParens);
    }

    #[test]
    fn lowercase_atom_is_rejected() {
        let mut kb = KnowledgeBase::new();
        let err = parse_expression(&mut kb, "a").unwrap_err();
        assert!(matches!(err, ParseError::InvalidAtom { found } if found == "a"));
    }

    #[test]
    fn two_atoms_with_no_operator_is_trailing_input() {
        let mut kb = KnowledgeBase::new();
        let err = parse_expression(&mut kb, "AB").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
    }

    #[test]
    fn stray_symbol_is_unexpected_char() {
        let mut kb = KnowledgeBase::new();
        let err = parse_expression(&mut kb, "A$B").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedChar { found: '$', .. }));
    }

    #[test]
    fn full_source_round_trips() {
        let source = "A=>B\n\n=A\n\n?B\n";
        let parsed = parse_source(source).unwrap();
        assert_eq!(parsed.queries.len(), 1);
        assert_eq!(parsed.kb.initial_fact(parsed.queries[0]), None);
    }

    #[test]
    fn rules_can_flow_directly_into_facts_without_a_blank_line() {
        let source = "A=>B\n=A\n?B\n";
        let parsed = parse_source(source).unwrap();
        assert_eq!(parsed.queries.len(), 1);
    }

    #[test]
    fn stray_line_after_queries_is_silently_ignored() {
        let source = "A=>B\n\n=A\n\n?B\nC\n";
        let parsed = parse_source(source).unwrap();
        assert_eq!(parsed.queries.len(), 1);
    }
}
