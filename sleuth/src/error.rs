//! Errors reported by the logic engine.
//!
//! Search exhaustion is never an error: `get_next()` and `execute()` report it
//! as `Ok(false)`. The variants here are contract violations that surface
//! immediately to the caller.

use std::fmt;

use crate::kb::FactType;

/// Ways a query tree can be assembled incorrectly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedQuery {
    /// `or_with` was called before any main-branch step was added.
    EmptyMainBranch,
    /// `or_with` was called on a query whose root already has an alternative.
    AlternativeAlreadyAttached,
}

impl fmt::Display for MalformedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMainBranch => write!(f, "or_with requires at least one main-branch step"),
            Self::AlternativeAlreadyAttached => {
                write!(f, "the query root already has an alternative branch")
            }
        }
    }
}

/// Errors that can occur while building or evaluating a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    /// A pattern or storage was compared against a counterpart of another type.
    TypeMismatch {
        /// The type the operation was declared for.
        expected: FactType,
        /// The type that was actually supplied.
        found: FactType,
    },
    /// A pattern or fact was built with the wrong number of attributes.
    ArityMismatch {
        /// The type being constructed.
        fact_type: FactType,
        /// Attributes declared by the type.
        expected: usize,
        /// Attributes supplied.
        found: usize,
    },
    /// The query tree was assembled incorrectly.
    MalformedQuery(MalformedQuery),
    /// Two adapter types were used under one fact type name.
    AdapterConflict {
        /// The shared fact type name.
        fact_type: FactType,
        /// The Rust type already stored under the name.
        stored: &'static str,
        /// The Rust type the operation was called with.
        requested: &'static str,
    },
    /// Rule evaluation nested deeper than the configured limit.
    RuleDepthExceeded {
        /// The rule type whose evaluation crossed the limit.
        fact_type: FactType,
        /// The configured limit.
        limit: usize,
    },
}

impl fmt::Display for LogicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::ArityMismatch {
                fact_type,
                expected,
                found,
            } => write!(
                f,
                "arity mismatch for {fact_type}: expected {expected} attributes, found {found}"
            ),
            Self::MalformedQuery(reason) => write!(f, "malformed query: {reason}"),
            Self::AdapterConflict {
                fact_type,
                stored,
                requested,
            } => write!(
                f,
                "fact type {fact_type} is stored as {stored} but was used as {requested}"
            ),
            Self::RuleDepthExceeded { fact_type, limit } => {
                write!(f, "rule depth limit of {limit} exceeded while evaluating {fact_type}")
            }
        }
    }
}

impl std::error::Error for LogicError {}

impl From<MalformedQuery> for LogicError {
    fn from(reason: MalformedQuery) -> Self {
        Self::MalformedQuery(reason)
    }
}

/// Fail with `TypeMismatch` unless both tags agree.
pub fn ensure_same_type(expected: &FactType, found: &FactType) -> Result<(), LogicError> {
    if expected == found {
        Ok(())
    } else {
        Err(LogicError::TypeMismatch {
            expected: expected.clone(),
            found: found.clone(),
        })
    }
}
