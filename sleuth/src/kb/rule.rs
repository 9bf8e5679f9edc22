//! Rules: facts concluded by running a sub-query.

use std::fmt;
use std::rc::Rc;

use super::KnowledgeBase;
use super::adapter::{FactType, Pattern};
use crate::error::LogicError;
use crate::query::LogicalQuery;

type RuleBody<P> = dyn Fn(&P, &KnowledgeBase) -> Result<LogicalQuery, LogicError>;

/// A function from a head pattern to the query that proves it.
///
/// The body receives a fresh copy of the caller's pattern and must bind its
/// free cells on success; the knowledge base copies them back afterwards.
pub struct Rule<P> {
    name: Option<String>,
    fact_type: FactType,
    body: Rc<RuleBody<P>>,
}

impl<P> Clone for Rule<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fact_type: self.fact_type.clone(),
            body: Rc::clone(&self.body),
        }
    }
}

impl<P: Pattern> Rule<P> {
    /// Create an anonymous rule for `fact_type`.
    pub fn new<F>(fact_type: FactType, body: F) -> Self
    where
        F: Fn(&P, &KnowledgeBase) -> Result<LogicalQuery, LogicError> + 'static,
    {
        Self {
            name: None,
            fact_type,
            body: Rc::new(body),
        }
    }

    /// Attach a name, used in logs.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn fact_type(&self) -> &FactType {
        &self.fact_type
    }

    /// Build the body query for `head`.
    pub fn instantiate(&self, head: &P, kb: &KnowledgeBase) -> Result<LogicalQuery, LogicError> {
        (self.body)(head, kb)
    }
}

impl<P> fmt::Debug for Rule<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("fact_type", &self.fact_type)
            .finish_non_exhaustive()
    }
}

/// The rules of one fact type, in assertion order.
#[derive(Debug)]
pub struct RuleStorage<P> {
    rules: Vec<Rc<Rule<P>>>,
}

impl<P> Default for RuleStorage<P> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<P> RuleStorage<P> {
    pub fn add(&mut self, rule: Rule<P>) {
        self.rules.push(Rc::new(rule));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Shared handles to every rule, so evaluation does not borrow the storage.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rc<Rule<P>>> {
        self.rules.clone()
    }
}
