//! The knowledge base: stored facts and rules, keyed by fact type.
//!
//! `KnowledgeBase` is a cheap, clonable handle. Lookups and rule bodies hold
//! clones of it, so a rule body can query the same knowledge base while an
//! outer query is still enumerating it.
//!
//! # Invariants
//!
//! - Facts and rules are tried in assertion order, facts first.
//! - No storage borrow is held while an attempt runs.
//! - Nested rule evaluation never exceeds `max_rule_depth`.

mod adapter;
mod rule;
mod storage;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub use adapter::{Fact, FactType, Pattern, attribute_hash};
pub use rule::{Rule, RuleStorage};
pub use storage::{Candidates, Cluster, FactStorage, Lookup};

use crate::backtrack::{Attempt, Attempts, Backtrack};
use crate::binding::UndoLog;
use crate::config::KnowledgeBaseConfig;
use crate::error::LogicError;

/// Type-erased per-type storage.
trait Stored {
    fn len(&self) -> usize;
    /// The Rust type of the stored facts or rule patterns.
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<F: Fact> Stored for FactStorage<F> {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<F>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<P: Pattern> Stored for RuleStorage<P> {
    fn len(&self) -> usize {
        Self::len(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<P>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Inner {
    config: KnowledgeBaseConfig,
    facts: RefCell<HashMap<FactType, Box<dyn Stored>>>,
    rules: RefCell<HashMap<FactType, Box<dyn Stored>>>,
    rule_depth: Cell<usize>,
}

/// Facts and rules available to queries.
#[derive(Clone)]
pub struct KnowledgeBase {
    inner: Rc<Inner>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    /// Create an empty knowledge base with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(KnowledgeBaseConfig::default())
    }

    #[must_use]
    pub fn with_config(config: KnowledgeBaseConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                config,
                facts: RefCell::new(HashMap::new()),
                rules: RefCell::new(HashMap::new()),
                rule_depth: Cell::new(0),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.inner.config
    }

    /// Check whether two handles refer to the same knowledge base.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Store a fact under its type.
    ///
    /// Returns `Ok(false)` if an equal fact is already stored.
    pub fn assert_fact<F: Fact>(&self, fact: F) -> Result<bool, LogicError> {
        let fact_type = fact.fact_type();
        let mut facts = self.inner.facts.borrow_mut();
        let stored = facts.entry(fact_type.clone()).or_insert_with(|| {
            let storage = fact.new_storage(self.inner.config.indexing);
            tracing::debug!(
                fact_type = %fact_type,
                hashable = ?storage.hashable_attributes(),
                "created fact storage"
            );
            Box::new(storage)
        });
        let stored_type = stored.type_name();
        let storage = stored
            .as_any_mut()
            .downcast_mut::<FactStorage<F>>()
            .ok_or_else(|| LogicError::AdapterConflict {
                fact_type: fact_type.clone(),
                stored: stored_type,
                requested: std::any::type_name::<F>(),
            })?;

        let added = storage.add(fact)?;
        tracing::debug!(fact_type = %fact_type, added, count = storage.len(), "asserted fact");
        Ok(added)
    }

    /// Store a rule under its declared fact type.
    pub fn assert_rule<P: Pattern>(&self, rule: Rule<P>) -> Result<(), LogicError> {
        let fact_type = rule.fact_type().clone();
        let name = rule.name().map(str::to_owned);
        let mut rules = self.inner.rules.borrow_mut();
        let stored = rules
            .entry(fact_type.clone())
            .or_insert_with(|| Box::new(RuleStorage::<P>::default()));
        let stored_type = stored.type_name();
        let storage = stored
            .as_any_mut()
            .downcast_mut::<RuleStorage<P>>()
            .ok_or_else(|| LogicError::AdapterConflict {
                fact_type: fact_type.clone(),
                stored: stored_type,
                requested: std::any::type_name::<P>(),
            })?;

        storage.add(rule);
        tracing::debug!(fact_type = %fact_type, name = ?name, count = storage.len(), "asserted rule");
        Ok(())
    }

    /// Raw storage answer for `sample`, or `None` if no fact of its type exists.
    pub fn candidates<P: Pattern>(&self, sample: &P) -> Result<Option<Candidates<P::Fact>>, LogicError> {
        let fact_type = sample.fact_type();
        let facts = self.inner.facts.borrow();
        let Some(stored) = facts.get(&fact_type) else {
            return Ok(None);
        };
        let storage = stored
            .as_any()
            .downcast_ref::<FactStorage<P::Fact>>()
            .ok_or_else(|| LogicError::AdapterConflict {
                fact_type: fact_type.clone(),
                stored: stored.type_name(),
                requested: std::any::type_name::<P::Fact>(),
            })?;
        storage.filtered_by_sample(sample).map(Some)
    }

    fn rules_for<P: Pattern>(&self, fact_type: &FactType) -> Result<Vec<Rc<Rule<P>>>, LogicError> {
        let rules = self.inner.rules.borrow();
        let Some(stored) = rules.get(fact_type) else {
            return Ok(Vec::new());
        };
        stored
            .as_any()
            .downcast_ref::<RuleStorage<P>>()
            .map(RuleStorage::snapshot)
            .ok_or_else(|| LogicError::AdapterConflict {
                fact_type: fact_type.clone(),
                stored: stored.type_name(),
                requested: std::any::type_name::<P>(),
            })
    }

    /// One attempt per candidate fact, then one per rule, for `sample`.
    ///
    /// A fact attempt binds the free cells of `sample` and succeeds iff the
    /// fact equals the now bound sample. A rule attempt runs the rule body
    /// against a fresh head and copies the head back into `sample` on success.
    pub fn check_for_facts<P: Pattern>(&self, sample: &P) -> Result<Attempts, LogicError> {
        let fact_type = sample.fact_type();
        let mut attempts = Attempts::new();

        if let Some(candidates) = self.candidates(sample)? {
            tracing::trace!(
                fact_type = %fact_type,
                strategy = ?candidates.strategy(),
                candidates = candidates.len(),
                "fact lookup"
            );
            for fact in candidates.into_facts() {
                let sample = sample.clone();
                attempts.push(move |undo: &mut UndoLog| -> Result<bool, LogicError> {
                    sample.bind(&fact, undo)?;
                    sample.matches(&fact)
                });
            }
        }

        for rule in self.rules_for::<P>(&fact_type)? {
            attempts.push(rule_attempt(self.clone(), rule, sample.clone()));
        }
        Ok(attempts)
    }

    /// Enter one level of rule evaluation.
    fn enter_rule(&self, fact_type: &FactType) -> Result<RuleDepthGuard<'_>, LogicError> {
        let depth = self.inner.rule_depth.get();
        let limit = self.inner.config.max_rule_depth;
        if depth >= limit {
            tracing::warn!(fact_type = %fact_type, limit, "rule depth limit reached");
            return Err(LogicError::RuleDepthExceeded {
                fact_type: fact_type.clone(),
                limit,
            });
        }
        self.inner.rule_depth.set(depth + 1);
        Ok(RuleDepthGuard {
            depth: &self.inner.rule_depth,
        })
    }

    /// Number of stored facts of `fact_type`.
    #[must_use]
    pub fn fact_count(&self, fact_type: &FactType) -> usize {
        self.inner.facts.borrow().get(fact_type).map_or(0, |stored| stored.len())
    }

    /// Number of stored rules of `fact_type`.
    #[must_use]
    pub fn rule_count(&self, fact_type: &FactType) -> usize {
        self.inner.rules.borrow().get(fact_type).map_or(0, |stored| stored.len())
    }

    /// Every fact type with at least one stored fact, sorted by name.
    #[must_use]
    pub fn fact_types(&self) -> Vec<FactType> {
        let mut types: Vec<FactType> = self.inner.facts.borrow().keys().cloned().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let facts = self.inner.facts.borrow();
        let rules = self.inner.rules.borrow();
        f.debug_struct("KnowledgeBase")
            .field("config", &self.inner.config)
            .field("fact_types", &facts.len())
            .field("facts", &facts.values().map(|stored| stored.len()).sum::<usize>())
            .field("rules", &rules.values().map(|stored| stored.len()).sum::<usize>())
            .finish()
    }
}

/// Decrements the rule depth when dropped.
struct RuleDepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for RuleDepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

fn rule_attempt<P: Pattern>(kb: KnowledgeBase, rule: Rc<Rule<P>>, sample: P) -> impl Attempt {
    move |undo: &mut UndoLog| -> Result<bool, LogicError> {
        let _depth = kb.enter_rule(rule.fact_type())?;
        let head = sample.fresh();
        let mut body = rule.instantiate(&head, &kb)?;
        if !body.execute()? {
            tracing::trace!(rule = ?rule.name(), "rule body failed");
            return Ok(false);
        }
        let proved = sample
            .bind_pattern(&head, undo)
            .and_then(|()| sample.matches_pattern(&head));
        body.reset();
        proved
    }
}

/// Backtrack source matching one pattern against a knowledge base.
///
/// Candidates are computed on the first pull after construction or `reset`.
pub struct FactLookup<P> {
    kb: KnowledgeBase,
    sample: P,
    generation: Option<Attempts>,
}

impl<P: Pattern> FactLookup<P> {
    #[must_use]
    pub const fn new(kb: KnowledgeBase, sample: P) -> Self {
        Self {
            kb,
            sample,
            generation: None,
        }
    }
}

impl<P: Pattern> Backtrack for FactLookup<P> {
    fn next_attempt(&mut self) -> Result<Option<&mut dyn Attempt>, LogicError> {
        if self.generation.is_none() {
            self.generation = Some(self.kb.check_for_facts(&self.sample)?);
        }
        match self.generation.as_mut() {
            Some(attempts) => attempts.next_attempt(),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.generation = None;
    }
}

impl<P: Pattern> fmt::Debug for FactLookup<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactLookup")
            .field("sample", &self.sample)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
