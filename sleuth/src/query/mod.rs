//! Logical queries.
//!
//! A `LogicalQuery` is built fluently from steps and executed repeatedly to
//! enumerate its solutions:
//! - `with` - conjunction, a required next step
//! - `or_with` - whole-query disjunction, tried once the main branch fails
//! - `scope` / `not` - embedded query and negation-as-failure
//! - `cut` - commit to the choices made so far
//! - `fail` - force backtracking
//!
//! `collect` and `count_solutions` drive a query to exhaustion.

mod results;
mod tree;

pub use results::{QueryResult, QueryRow};
pub use tree::{LogicalQuery, NodeId};
