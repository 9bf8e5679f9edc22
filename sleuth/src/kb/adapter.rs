//! The capability contract between the engine and fact types.
//!
//! A fact type provides two halves:
//! - `Fact` - the immutable stored tuple of `Value`s
//! - `Pattern` - the query-time tuple of `BoundValue`s matched against it
//!
//! Implementations can be hand-written (see `testing`) or built at runtime
//! through `relation::Relation`.

use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::rc::Rc;

use super::storage::FactStorage;
use crate::binding::UndoLog;
use crate::error::LogicError;

/// Runtime tag identifying a fact type.
///
/// Storage is keyed by it and patterns are checked against it before any
/// comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactType(Rc<str>);

impl FactType {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Rc::from(name))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash used to cluster facts by one attribute.
///
/// Facts and patterns must both hash attribute values through this function
/// so their cluster keys agree.
pub fn attribute_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// A stored, immutable tuple.
pub trait Fact: Eq + Hash + fmt::Debug + 'static {
    /// The tag of this fact's type.
    fn fact_type(&self) -> FactType;

    /// Attribute positions the storage clusters on.
    ///
    /// Returning an empty list opts the type out of indexing.
    fn hashable_attributes(&self) -> Vec<usize>;

    /// `attribute_hash` of the value at `attribute`.
    fn attribute_hash(&self, attribute: usize) -> u64;

    /// Create the storage that will hold facts of this type.
    fn new_storage(&self, indexing: bool) -> FactStorage<Self>
    where
        Self: Sized,
    {
        let hashable = if indexing {
            self.hashable_attributes()
        } else {
            Vec::new()
        };
        FactStorage::new(self.fact_type(), hashable)
    }
}

/// A query pattern matched against facts of one type.
///
/// Cloning a pattern shares its cells; `fresh` makes independent ones.
pub trait Pattern: Clone + fmt::Debug + 'static {
    type Fact: Fact;

    /// The tag of the fact type this pattern matches.
    fn fact_type(&self) -> FactType;

    /// `attribute_hash` of the cell at `attribute`, or `None` while it is free.
    fn attribute_hash(&self, attribute: usize) -> Option<u64>;

    /// Check whether every cell is bound.
    fn is_fully_bound(&self) -> bool {
        self.to_fact().is_some()
    }

    /// Check whether every bound cell equals the fact's value.
    fn matches(&self, fact: &Self::Fact) -> Result<bool, LogicError>;

    /// Check whether the two patterns agree wherever both are bound.
    fn matches_pattern(&self, other: &Self) -> Result<bool, LogicError>;

    /// Bind every free cell to the fact's value at the same position.
    fn bind(&self, fact: &Self::Fact, undo: &mut UndoLog) -> Result<(), LogicError>;

    /// Bind every free cell to the bound value of `other` at the same position.
    fn bind_pattern(&self, other: &Self, undo: &mut UndoLog) -> Result<(), LogicError>;

    /// The fact this pattern describes, if every cell is bound.
    fn to_fact(&self) -> Option<Self::Fact>;

    /// A copy with fresh cells holding the current values.
    ///
    /// Positions that share one cell in `self` must share one fresh cell in
    /// the copy, so a rule body sees the same constraints as the caller.
    /// Used as a rule head so the body cannot write into the caller's cells.
    #[must_use]
    fn fresh(&self) -> Self;
}
