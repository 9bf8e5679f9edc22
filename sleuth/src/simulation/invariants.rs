//! Invariant checking for deterministic simulation testing.
//!
//! Each check compares the engine against a plain reference: the facts the
//! simulator asserted, kept in insertion order in a `Vec`.

#![allow(clippy::disallowed_methods)]

use crate::binding::{BoundValue, LAction};
use crate::error::LogicError;
use crate::kb::{KnowledgeBase, Pattern};
use crate::query::LogicalQuery;
use crate::relation::{Datum, Tuple, TuplePattern};

/// A violated invariant.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Which invariant was violated.
    pub description: String,
    /// The operation that triggered the check.
    pub operation_index: usize,
    /// Details for reproducing the failure.
    pub context: String,
}

/// Snapshot of a cell: its value and the depth of its rollback stack.
type CellState = (Option<Datum>, usize);

/// Checks engine invariants and records violations.
#[derive(Debug, Default)]
pub struct InvariantChecker {
    violations: Vec<InvariantViolation>,
}

impl InvariantChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    pub fn add_violation(&mut self, violation: InvariantViolation) {
        tracing::warn!(
            operation = violation.operation_index,
            description = %violation.description,
            "invariant violated"
        );
        self.violations.push(violation);
    }

    fn violation(&mut self, operation_index: usize, description: &str, context: String) {
        self.add_violation(InvariantViolation {
            description: description.to_string(),
            operation_index,
            context,
        });
    }

    /// `assert_fact` reports a new fact iff the reference did not hold it.
    pub fn check_assert_result(
        &mut self,
        operation_index: usize,
        fact: &Tuple,
        was_known: bool,
        result: &Result<bool, LogicError>,
    ) {
        match result {
            Ok(added) if *added == was_known => self.violation(
                operation_index,
                "assert_fact disagrees with reference on duplicates",
                format!("fact={fact} added={added} was_known={was_known}"),
            ),
            Ok(_) => {}
            Err(error) => self.violation(
                operation_index,
                "assert_fact failed for a well-formed fact",
                format!("fact={fact} error={error}"),
            ),
        }
    }

    /// The stored fact count equals the reference count.
    pub fn check_fact_count(&mut self, operation_index: usize, kb: &KnowledgeBase, reference: &[Tuple]) {
        let Some(first) = reference.first() else {
            return;
        };
        let fact_type = first.relation().fact_type();
        let stored = kb.fact_count(fact_type);
        if stored != reference.len() {
            self.violation(
                operation_index,
                "stored fact count differs from reference",
                format!("fact_type={fact_type} stored={stored} reference={}", reference.len()),
            );
        }
    }

    /// Index candidates re-checked with `matches` equal a filtered scan of
    /// the reference, in insertion order.
    pub fn check_index_equivalence(
        &mut self,
        operation_index: usize,
        kb: &KnowledgeBase,
        sample: &TuplePattern,
        reference: &[Tuple],
    ) -> Result<(), LogicError> {
        let expected = matching(sample, reference)?;
        let mut found = Vec::new();
        if let Some(candidates) = kb.candidates(sample)? {
            for fact in candidates.iter() {
                if sample.matches(fact)? {
                    found.push(fact.clone());
                }
            }
        }

        if found != expected {
            self.violation(
                operation_index,
                "index lookup differs from linear scan",
                format!(
                    "sample={sample:?} found={} expected={}",
                    found.len(),
                    expected.len()
                ),
            );
        }
        Ok(())
    }

    /// A fact lookup enumerates exactly the matching facts, in insertion
    /// order, and leaves every cell as it found it.
    ///
    /// Returns the number of solutions seen.
    pub fn check_lookup_enumeration(
        &mut self,
        operation_index: usize,
        kb: &KnowledgeBase,
        sample: &TuplePattern,
        reference: &[Tuple],
    ) -> Result<usize, LogicError> {
        let expected: Vec<Vec<Option<Datum>>> = matching(sample, reference)?
            .iter()
            .map(|fact| (0..fact.len()).map(|attribute| fact.get(attribute).cloned()).collect())
            .collect();

        let before = snapshot(sample.cells());
        let mut query = LogicalQuery::new().with(LAction::facts(kb, sample));
        let mut solutions = Vec::new();
        while query.execute()? {
            solutions.push(sample.cells().iter().map(BoundValue::get).collect::<Vec<_>>());
        }
        let after = snapshot(sample.cells());

        if solutions != expected {
            self.violation(
                operation_index,
                "fact lookup solutions differ from matching facts",
                format!(
                    "sample={sample:?} solutions={} expected={}",
                    solutions.len(),
                    expected.len()
                ),
            );
        }
        self.check_rollback(operation_index, "fact lookup", &before, &after);
        Ok(solutions.len())
    }

    /// `not(lookup)` succeeds once iff nothing matches, and binds nothing.
    pub fn check_negation(
        &mut self,
        operation_index: usize,
        kb: &KnowledgeBase,
        sample: &TuplePattern,
        reference: &[Tuple],
    ) -> Result<(), LogicError> {
        let any_match = !matching(sample, reference)?.is_empty();
        let before = snapshot(sample.cells());

        let mut query = LogicalQuery::new().not(LogicalQuery::new().with(LAction::facts(kb, sample)));
        let solutions = query.count_solutions()?;
        let after = snapshot(sample.cells());

        let expected = usize::from(!any_match);
        if solutions != expected {
            self.violation(
                operation_index,
                "negation disagrees with reference",
                format!("sample={sample:?} solutions={solutions} expected={expected}"),
            );
        }
        self.check_rollback(operation_index, "negation", &before, &after);
        Ok(())
    }

    /// Draining a query restores every cell value and stack depth.
    fn check_rollback(&mut self, operation_index: usize, what: &str, before: &[CellState], after: &[CellState]) {
        if before != after {
            self.violation(
                operation_index,
                "cells not restored after exhausting query",
                format!("query={what} before={before:?} after={after:?}"),
            );
        }
    }
}

fn snapshot(cells: &[BoundValue<Datum>]) -> Vec<CellState> {
    cells.iter().map(|cell| (cell.get(), cell.depth())).collect()
}

fn matching(sample: &TuplePattern, reference: &[Tuple]) -> Result<Vec<Tuple>, LogicError> {
    let mut facts = Vec::new();
    for fact in reference {
        if sample.matches(fact)? {
            facts.push(fact.clone());
        }
    }
    Ok(facts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::Relation;

    fn edges() -> (Relation, KnowledgeBase, Vec<Tuple>) {
        let edge = Relation::builder("edge").attribute("from").attribute("to").build();
        let kb = KnowledgeBase::new();
        let mut reference = Vec::new();
        for (from, to) in [(1, 2), (1, 3), (2, 3)] {
            let fact = edge.fact([Datum::from(from), Datum::from(to)]).expect("edge fact");
            assert!(kb.assert_fact(fact.clone()).expect("assert edge"));
            reference.push(fact);
        }
        (edge, kb, reference)
    }

    #[test]
    fn test_checker_passes_on_consistent_kb() {
        let (edge, kb, reference) = edges();
        let sample = edge
            .pattern([BoundValue::bound(Datum::from(1)), BoundValue::unbound()])
            .expect("sample");

        let mut checker = InvariantChecker::new();
        checker.check_fact_count(0, &kb, &reference);
        checker.check_index_equivalence(0, &kb, &sample, &reference).expect("index check");
        let solutions = checker
            .check_lookup_enumeration(0, &kb, &sample, &reference)
            .expect("lookup check");
        checker.check_negation(0, &kb, &sample, &reference).expect("negation check");

        assert_eq!(solutions, 2);
        assert!(!checker.has_violations(), "{:?}", checker.violations());
    }

    #[test]
    fn test_checker_reports_stale_reference() {
        let (edge, kb, mut reference) = edges();
        reference.pop();

        let mut checker = InvariantChecker::new();
        checker.check_fact_count(3, &kb, &reference);
        checker
            .check_lookup_enumeration(3, &kb, &edge.unbound_pattern(), &reference)
            .expect("lookup check");

        assert_eq!(checker.violations().len(), 2);
        assert_eq!(checker.violations()[0].operation_index, 3);
    }

    #[test]
    fn test_duplicate_assert_must_report_false() {
        let (edge, _kb, _reference) = edges();
        let fact = edge.fact([Datum::from(1), Datum::from(2)]).expect("edge fact");

        let mut checker = InvariantChecker::new();
        checker.check_assert_result(0, &fact, true, &Ok(false));
        assert!(!checker.has_violations());
        checker.check_assert_result(1, &fact, true, &Ok(true));
        assert!(checker.has_violations());
    }
}
