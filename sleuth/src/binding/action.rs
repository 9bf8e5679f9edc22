//! Binding actions.
//!
//! An `LAction` pulls attempts from a `Backtrack` source and owns the undo log
//! of the attempt currently held. A successful attempt keeps its bindings
//! until the action is pulled again or rolled back; a failed one is undone
//! before the next attempt runs.

use std::fmt;

use super::undo::UndoLog;
use super::value::BoundValue;
use crate::backtrack::{Attempt, Attempts, Backtrack, Negation, Subquery};
use crate::error::LogicError;
use crate::kb::{FactLookup, KnowledgeBase, Pattern};
use crate::query::LogicalQuery;

/// A backtrackable step of a query.
pub struct LAction {
    source: Box<dyn Backtrack>,
    undo: UndoLog,
}

impl LAction {
    /// Wrap any backtrack source.
    pub fn new(source: impl Backtrack + 'static) -> Self {
        Self {
            source: Box::new(source),
            undo: UndoLog::new(),
        }
    }

    /// A step with exactly one attempt.
    pub fn attempt<F>(attempt: F) -> Self
    where
        F: FnMut(&mut UndoLog) -> Result<bool, LogicError> + 'static,
    {
        let mut attempts = Attempts::new();
        attempts.push(attempt);
        Self::new(attempts)
    }

    /// A step with one attempt per element, tried in order.
    pub fn attempts<I>(attempts: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Attempt>>,
    {
        Self::new(attempts.into_iter().collect::<Attempts>())
    }

    /// A step that succeeds once iff `predicate` holds.
    pub fn predicate<F>(mut predicate: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        Self::attempt(move |_undo: &mut UndoLog| Ok(predicate()))
    }

    /// A step that succeeds exactly once.
    #[must_use]
    pub fn succeed() -> Self {
        Self::predicate(|| true)
    }

    /// A step that never succeeds.
    #[must_use]
    pub fn fail() -> Self {
        Self::new(Attempts::new())
    }

    /// Bind a free `cell` to `value`, or check a bound one against it.
    pub fn unify<T>(cell: &BoundValue<T>, value: T) -> Self
    where
        T: Clone + PartialEq + 'static,
    {
        let cell = cell.clone();
        Self::attempt(move |undo: &mut UndoLog| Ok(cell.unify(&value, undo)))
    }

    /// One attempt per candidate value, each unifying `cell` with it.
    pub fn each<T, I>(cell: &BoundValue<T>, values: I) -> Self
    where
        T: Clone + PartialEq + 'static,
        I: IntoIterator<Item = T>,
    {
        Self::attempts(values.into_iter().map(|value| {
            let cell = cell.clone();
            Box::new(move |undo: &mut UndoLog| Ok::<_, LogicError>(cell.unify(&value, undo)))
                as Box<dyn Attempt>
        }))
    }

    /// Match `pattern` against the facts and rules of `kb`.
    ///
    /// Candidates are computed on the first pull of every generation, so the
    /// lookup sees whatever the preceding steps have bound.
    pub fn facts<P: Pattern>(kb: &KnowledgeBase, pattern: &P) -> Self {
        Self::new(FactLookup::new(kb.clone(), pattern.clone()))
    }

    /// Negation-as-failure of `query`.
    #[must_use]
    pub fn not(query: LogicalQuery) -> Self {
        Self::new(Negation::new(query))
    }

    /// Embed `query` as one backtrackable step.
    #[must_use]
    pub fn scope(query: LogicalQuery) -> Self {
        Self::new(Subquery::new(query))
    }

    /// Try attempts until one succeeds.
    ///
    /// Bindings held from a previous success are undone first. Returns
    /// `Ok(false)` with every binding restored once the source is exhausted.
    pub fn get_next(&mut self) -> Result<bool, LogicError> {
        self.undo.restore();
        let mut tried = 0_usize;
        while let Some(attempt) = self.source.next_attempt()? {
            tried += 1;
            match attempt.run(&mut self.undo) {
                Ok(true) => {
                    tracing::trace!(tried, held = self.undo.len(), "attempt succeeded");
                    return Ok(true);
                }
                Ok(false) => {
                    self.undo.restore();
                }
                Err(error) => {
                    self.undo.restore();
                    return Err(error);
                }
            }
        }
        tracing::trace!(tried, "attempts exhausted");
        Ok(false)
    }

    /// Undo held bindings and start the source over.
    pub fn rollback(&mut self) {
        self.undo.restore();
        self.source.reset();
    }

    /// Number of cells bound by the currently held attempt.
    #[must_use]
    pub fn held_bindings(&self) -> usize {
        self.undo.len()
    }
}

impl From<LogicalQuery> for LAction {
    fn from(query: LogicalQuery) -> Self {
        Self::scope(query)
    }
}

impl<P: Pattern> From<(&P, &KnowledgeBase)> for LAction {
    fn from((pattern, kb): (&P, &KnowledgeBase)) -> Self {
        Self::facts(kb, pattern)
    }
}

impl fmt::Debug for LAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LAction")
            .field("held", &self.undo)
            .finish_non_exhaustive()
    }
}
