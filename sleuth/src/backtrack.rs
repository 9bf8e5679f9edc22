//! Backtrack iterators: resettable lazy sources of attempts.
//!
//! A `Backtrack` source hands out zero or more `Attempt`s per generation.
//! `reset()` starts a fresh generation. Sources are single-consumer and keep
//! their position in an explicit cursor.
//!
//! Implementations:
//! - `Attempts` - a fixed ordered collection
//! - `Negation` - negation-as-failure of an inner query
//! - `Subquery` - an embedded query, re-entered on every pull

use std::fmt;

use crate::binding::UndoLog;
use crate::error::LogicError;
use crate::query::LogicalQuery;

/// One way of satisfying a step.
///
/// An attempt writes any bindings it needs through the undo log and reports
/// whether it succeeded. The caller rolls the log back on failure.
pub trait Attempt {
    fn run(&mut self, undo: &mut UndoLog) -> Result<bool, LogicError>;
}

impl<F> Attempt for F
where
    F: FnMut(&mut UndoLog) -> Result<bool, LogicError>,
{
    fn run(&mut self, undo: &mut UndoLog) -> Result<bool, LogicError> {
        self(undo)
    }
}

/// A resettable source of attempts.
pub trait Backtrack {
    /// The next untried attempt of the current generation.
    fn next_attempt(&mut self) -> Result<Option<&mut dyn Attempt>, LogicError>;

    /// Make a fresh generation available.
    fn reset(&mut self);
}

/// A fixed, ordered collection of attempts.
#[derive(Default)]
pub struct Attempts {
    attempts: Vec<Box<dyn Attempt>>,
    cursor: usize,
}

impl Attempts {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempt.
    pub fn push(&mut self, attempt: impl Attempt + 'static) {
        self.attempts.push(Box::new(attempt));
    }

    /// Total number of attempts in a generation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    /// Check if the collection holds no attempts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Attempts not yet handed out in the current generation.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.attempts.len().saturating_sub(self.cursor)
    }
}

impl FromIterator<Box<dyn Attempt>> for Attempts {
    fn from_iter<I: IntoIterator<Item = Box<dyn Attempt>>>(iter: I) -> Self {
        Self {
            attempts: iter.into_iter().collect(),
            cursor: 0,
        }
    }
}

impl Backtrack for Attempts {
    fn next_attempt(&mut self) -> Result<Option<&mut dyn Attempt>, LogicError> {
        let Some(attempt) = self.attempts.get_mut(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        Ok(Some(&mut **attempt))
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }
}

impl fmt::Debug for Attempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attempts")
            .field("len", &self.attempts.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

/// Negation-as-failure of an inner query.
///
/// The single attempt per generation succeeds iff the inner query cannot be
/// proved. The inner query is reset afterwards, so none of its bindings leak.
#[derive(Debug)]
pub struct Negation {
    query: LogicalQuery,
    pulled: bool,
}

impl Negation {
    #[must_use]
    pub const fn new(query: LogicalQuery) -> Self {
        Self {
            query,
            pulled: false,
        }
    }
}

impl Attempt for Negation {
    fn run(&mut self, _undo: &mut UndoLog) -> Result<bool, LogicError> {
        let proved = self.query.execute()?;
        self.query.reset();
        Ok(!proved)
    }
}

impl Backtrack for Negation {
    fn next_attempt(&mut self) -> Result<Option<&mut dyn Attempt>, LogicError> {
        if self.pulled {
            return Ok(None);
        }
        self.pulled = true;
        Ok(Some(self as &mut dyn Attempt))
    }

    fn reset(&mut self) {
        self.pulled = false;
        self.query.reset();
    }
}

/// An embedded query.
///
/// Every pull re-executes the inner query, which resumes from its last
/// solution. The generation ends once the inner query is exhausted.
#[derive(Debug)]
pub struct Subquery {
    query: LogicalQuery,
    exhausted: bool,
}

impl Subquery {
    #[must_use]
    pub const fn new(query: LogicalQuery) -> Self {
        Self {
            query,
            exhausted: false,
        }
    }
}

impl Attempt for Subquery {
    fn run(&mut self, _undo: &mut UndoLog) -> Result<bool, LogicError> {
        let proved = self.query.execute()?;
        if !proved {
            self.exhausted = true;
        }
        Ok(proved)
    }
}

impl Backtrack for Subquery {
    fn next_attempt(&mut self) -> Result<Option<&mut dyn Attempt>, LogicError> {
        if self.exhausted {
            return Ok(None);
        }
        Ok(Some(self as &mut dyn Attempt))
    }

    fn reset(&mut self) {
        self.exhausted = false;
        self.query.reset();
    }
}
