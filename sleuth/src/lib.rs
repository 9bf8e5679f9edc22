//! Sleuth: an embeddable backtracking logic engine.
//!
//! Facts are asserted into a `KnowledgeBase`, queries are assembled from
//! backtrackable steps and executed repeatedly to enumerate solutions.
//!
//! System components:
//!  - Variable cells with rollback stacks (`binding`)
//!  - Backtrack sources and the actions that drive them (`backtrack`, `binding`)
//!  - The query tree and its depth-first driver (`query`)
//!  - Fact and rule storage with attribute clustering (`kb`)
//!  - Runtime-declared relations (`relation`)
//!
//! Everything is single-threaded: cells and knowledge bases are `Rc`-shared
//! and a query must not be executed re-entrantly.
//!
//! # Example
//!
//! ```
//! use sleuth::{BoundValue, Datum, KnowledgeBase, LAction, LogicalQuery, Relation};
//!
//! let person = Relation::builder("person")
//!     .attribute("name")
//!     .unhashed_attribute("age")
//!     .build();
//! let kb = KnowledgeBase::new();
//! kb.assert_fact(person.fact([Datum::from("Alice"), Datum::from(30)]).unwrap()).unwrap();
//! kb.assert_fact(person.fact([Datum::from("Bob"), Datum::from(25)]).unwrap()).unwrap();
//!
//! let age = BoundValue::unbound();
//! let pattern = person
//!     .pattern([BoundValue::bound(Datum::from("Alice")), age.clone()])
//!     .unwrap();
//! let mut query = LogicalQuery::new().with(LAction::facts(&kb, &pattern));
//!
//! assert!(query.execute().unwrap());
//! assert_eq!(age.get(), Some(Datum::Integer(30)));
//! assert!(!query.execute().unwrap());
//! ```

pub mod backtrack;
pub mod binding;
pub mod config;
pub mod error;
pub mod kb;
pub mod query;
pub mod relation;


pub use backtrack::{Attempt, Attempts, Backtrack};
pub use binding::{BoundValue, LAction, UndoLog, Value};
pub use config::{ConfigError, KnowledgeBaseConfig};
pub use error::{LogicError, MalformedQuery};
pub use kb::{Fact, FactType, KnowledgeBase, Pattern, Rule};
pub use query::{LogicalQuery, QueryResult};
pub use relation::{Datum, Relation, Tuple, TuplePattern};
