//! Relations declared at runtime.
//!
//! A `Relation` is a named schema of attributes. Its facts are `Tuple`s of
//! `Datum` values and its patterns are `TuplePattern`s of `BoundValue<Datum>`
//! cells, so relations can be used without writing an adapter per type.
//!
//! # Indexing
//!
//! - every attribute is hashable unless declared with `unhashed_attribute`
//! - `unindexed()` opts the whole relation out of clustering

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::binding::{BoundValue, CellId, UndoLog, Value};
use crate::error::{LogicError, ensure_same_type};
use crate::kb::{Fact, FactType, KnowledgeBase, Pattern, Rule};
use crate::query::LogicalQuery;

/// A value stored in a relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Datum {
    Null,
    Boolean(bool),
    Integer(i64),
    String(String),
}

impl Datum {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug)]
struct Attribute {
    name: String,
    hashable: bool,
}

#[derive(Debug)]
struct Schema {
    fact_type: FactType,
    attributes: Vec<Attribute>,
    indexed: bool,
}

/// A named relation schema. Clones share the schema.
#[derive(Debug, Clone)]
pub struct Relation {
    schema: Rc<Schema>,
}

/// Builder for `Relation`.
#[derive(Debug)]
pub struct RelationBuilder {
    name: String,
    attributes: Vec<Attribute>,
    indexed: bool,
}

impl RelationBuilder {
    /// Add a hashable attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            hashable: true,
        });
        self
    }

    /// Add an attribute the storage does not cluster on.
    #[must_use]
    pub fn unhashed_attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Attribute {
            name: name.into(),
            hashable: false,
        });
        self
    }

    /// Store this relation's facts without clustering.
    #[must_use]
    pub const fn unindexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    #[must_use]
    pub fn build(self) -> Relation {
        Relation {
            schema: Rc::new(Schema {
                fact_type: FactType::new(&self.name),
                attributes: self.attributes,
                indexed: self.indexed,
            }),
        }
    }
}

impl Relation {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RelationBuilder {
        RelationBuilder {
            name: name.into(),
            attributes: Vec::new(),
            indexed: true,
        }
    }

    #[must_use]
    pub fn fact_type(&self) -> &FactType {
        &self.schema.fact_type
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.schema.attributes.len()
    }

    /// Position of the attribute called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.schema
            .attributes
            .iter()
            .position(|attribute| attribute.name == name)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.schema.attributes.iter().map(|attribute| attribute.name.as_str())
    }

    /// Build a fact of this relation.
    pub fn fact<I>(&self, values: I) -> Result<Tuple, LogicError>
    where
        I: IntoIterator,
        I::Item: Into<Datum>,
    {
        let values: Vec<Value<Datum>> = values.into_iter().map(|value| Value::new(value.into())).collect();
        self.check_arity(values.len())?;
        Ok(Tuple {
            relation: self.clone(),
            values,
        })
    }

    /// Build a pattern of this relation over the given cells.
    pub fn pattern<I>(&self, cells: I) -> Result<TuplePattern, LogicError>
    where
        I: IntoIterator<Item = BoundValue<Datum>>,
    {
        let cells: Vec<BoundValue<Datum>> = cells.into_iter().collect();
        self.check_arity(cells.len())?;
        Ok(TuplePattern {
            relation: self.clone(),
            cells,
        })
    }

    /// A pattern with every cell free.
    #[must_use]
    pub fn unbound_pattern(&self) -> TuplePattern {
        TuplePattern {
            relation: self.clone(),
            cells: (0..self.arity()).map(|_| BoundValue::unbound()).collect(),
        }
    }

    /// A rule concluding facts of this relation.
    pub fn rule<F>(&self, body: F) -> Rule<TuplePattern>
    where
        F: Fn(&TuplePattern, &KnowledgeBase) -> Result<LogicalQuery, LogicError> + 'static,
    {
        Rule::new(self.fact_type().clone(), body)
    }

    fn check_arity(&self, found: usize) -> Result<(), LogicError> {
        let expected = self.arity();
        if found == expected {
            return Ok(());
        }
        Err(LogicError::ArityMismatch {
            fact_type: self.fact_type().clone(),
            expected,
            found,
        })
    }
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.fact_type() == other.fact_type()
    }
}

impl Eq for Relation {}

/// A fact of a `Relation`.
#[derive(Debug, Clone)]
pub struct Tuple {
    relation: Relation,
    values: Vec<Value<Datum>>,
}

impl Tuple {
    #[must_use]
    pub const fn relation(&self) -> &Relation {
        &self.relation
    }

    #[must_use]
    pub fn get(&self, attribute: usize) -> Option<&Datum> {
        self.values.get(attribute).map(Value::get)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation && self.values == other.values
    }
}

impl Eq for Tuple {}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.fact_type().hash(state);
        self.values.hash(state);
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.relation.fact_type())?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

impl Fact for Tuple {
    fn fact_type(&self) -> FactType {
        self.relation.fact_type().clone()
    }

    fn hashable_attributes(&self) -> Vec<usize> {
        let schema = &self.relation.schema;
        if !schema.indexed {
            return Vec::new();
        }
        schema
            .attributes
            .iter()
            .enumerate()
            .filter(|(_, attribute)| attribute.hashable)
            .map(|(position, _)| position)
            .collect()
    }

    fn attribute_hash(&self, attribute: usize) -> u64 {
        self.values.get(attribute).map_or(0, Value::hash_key)
    }
}

/// A pattern over a `Relation`. Clones share cells.
#[derive(Debug, Clone)]
pub struct TuplePattern {
    relation: Relation,
    cells: Vec<BoundValue<Datum>>,
}

impl TuplePattern {
    #[must_use]
    pub const fn relation(&self) -> &Relation {
        &self.relation
    }

    #[must_use]
    pub fn cell(&self, attribute: usize) -> Option<&BoundValue<Datum>> {
        self.cells.get(attribute)
    }

    /// The cell of the attribute called `name`.
    #[must_use]
    pub fn cell_named(&self, name: &str) -> Option<&BoundValue<Datum>> {
        self.relation.position(name).and_then(|position| self.cells.get(position))
    }

    #[must_use]
    pub fn cells(&self) -> &[BoundValue<Datum>] {
        &self.cells
    }

    fn check_fact(&self, fact: &Tuple) -> Result<(), LogicError> {
        ensure_same_type(self.relation.fact_type(), fact.relation.fact_type())?;
        self.check_len(fact.values.len())
    }

    fn check_len(&self, found: usize) -> Result<(), LogicError> {
        if found == self.cells.len() {
            return Ok(());
        }
        Err(LogicError::ArityMismatch {
            fact_type: self.relation.fact_type().clone(),
            expected: self.cells.len(),
            found,
        })
    }
}

impl Pattern for TuplePattern {
    type Fact = Tuple;

    fn fact_type(&self) -> FactType {
        self.relation.fact_type().clone()
    }

    fn attribute_hash(&self, attribute: usize) -> Option<u64> {
        self.cells.get(attribute).and_then(BoundValue::hash_key)
    }

    fn is_fully_bound(&self) -> bool {
        self.cells.iter().all(BoundValue::is_bound)
    }

    fn matches(&self, fact: &Tuple) -> Result<bool, LogicError> {
        self.check_fact(fact)?;
        Ok(self
            .cells
            .iter()
            .zip(&fact.values)
            .all(|(cell, value)| cell.matches(value)))
    }

    fn matches_pattern(&self, other: &Self) -> Result<bool, LogicError> {
        ensure_same_type(self.relation.fact_type(), other.relation.fact_type())?;
        self.check_len(other.cells.len())?;
        Ok(self
            .cells
            .iter()
            .zip(&other.cells)
            .all(|(cell, other)| cell.agrees_with(other)))
    }

    fn bind(&self, fact: &Tuple, undo: &mut UndoLog) -> Result<(), LogicError> {
        self.check_fact(fact)?;
        for (cell, value) in self.cells.iter().zip(&fact.values) {
            cell.bind_free(value, undo);
        }
        Ok(())
    }

    fn bind_pattern(&self, other: &Self, undo: &mut UndoLog) -> Result<(), LogicError> {
        ensure_same_type(self.relation.fact_type(), other.relation.fact_type())?;
        self.check_len(other.cells.len())?;
        for (cell, source) in self.cells.iter().zip(&other.cells) {
            cell.bind_from(source, undo);
        }
        Ok(())
    }

    fn to_fact(&self) -> Option<Tuple> {
        let values = self
            .cells
            .iter()
            .map(BoundValue::to_value)
            .collect::<Option<Vec<_>>>()?;
        Some(Tuple {
            relation: self.relation.clone(),
            values,
        })
    }

    fn fresh(&self) -> Self {
        let mut copies: HashMap<CellId, BoundValue<Datum>> = HashMap::new();
        let cells = self
            .cells
            .iter()
            .map(|cell| copies.entry(cell.id()).or_insert_with(|| cell.detached()).clone())
            .collect();
        Self {
            relation: self.relation.clone(),
            cells,
        }
    }
}
