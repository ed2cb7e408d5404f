//! Built-in scenario fixtures for `propsolve test` — the six concrete
//! end-to-end examples from spec.md §8, run against the real parser and
//! solver rather than hand-built knowledge bases, so `test` exercises the
//! same path `run` does.

use propsolve_core::{parse_source, EquivalenceKind, Justification, Solver, TruthValue};

pub struct Scenario {
    pub name: &'static str,
    source: &'static str,
    check: fn(&Justification) -> Result<(), String>,
}

impl Scenario {
    pub fn run(&self) -> Result<(), String> {
        let parsed = parse_source(self.source).map_err(|e| format!("parse error: {e}"))?;
        let query = *parsed.queries.first().ok_or("scenario defines no query")?;
        let justification = Solver::new(&parsed.kb).solve(query).map_err(|e| format!("solve error: {e}"))?;
        (self.check)(&justification)
    }
}

fn expect_value(justification: &Justification, expected: TruthValue) -> Result<(), String> {
    if justification.value() != expected {
        return Err(format!("expected {expected:?}, got {:?}", justification.value()));
    }
    Ok(())
}

fn expect_length(justification: &Justification, expected: usize) -> Result<(), String> {
    if justification.length() != expected {
        return Err(format!("expected length {expected}, got {}", justification.length()));
    }
    Ok(())
}

pub static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "forward implication from a fact",
        source: "A=>B\n\n=A\n\n?B\n",
        check: |j| {
            expect_value(j, TruthValue::True)?;
            expect_length(j, 1)?;
            match j {
                Justification::ForwardImplication { .. } => Ok(()),
                other => Err(format!("expected ForwardImplication, got {other:?}")),
            }
        },
    },
    Scenario {
        name: "no facts falls back to default",
        source: "A=>B\n\n=\n\n?B\n",
        check: |j| {
            expect_value(j, TruthValue::False)?;
            match j {
                Justification::Default { .. } => Ok(()),
                other => Err(format!("expected Default, got {other:?}")),
            }
        },
    },
    Scenario {
        name: "conjunction premise satisfied by both facts",
        source: "A+B=>C\n\n=AB\n\n?C\n",
        check: |j| expect_value(j, TruthValue::True),
    },
    Scenario {
        name: "disjunction premise satisfied by one fact",
        source: "A|B=>C\n\n=A\n\n?C\n",
        check: |j| expect_value(j, TruthValue::True),
    },
    Scenario {
        name: "defined equivalence carries a fact across",
        source: "A<=>B\n\n=A\n\n?B\n",
        check: |j| {
            expect_value(j, TruthValue::True)?;
            expect_length(j, 1)?;
            match j {
                Justification::Equivalence { kind: EquivalenceKind::Defined, .. } => Ok(()),
                other => Err(format!("expected defined Equivalence, got {other:?}")),
            }
        },
    },
    Scenario {
        name: "contradictory premise never fires",
        source: "A+!A=>B\n\n=\n\n?B\n",
        check: |j| expect_value(j, TruthValue::False),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_scenario_passes() {
        for scenario in SCENARIOS {
            assert!(scenario.run().is_ok(), "scenario '{}' failed", scenario.name);
        }
    }
}
