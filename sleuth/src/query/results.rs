//! Collecting solutions into result tables.

use std::fmt;

use super::tree::LogicalQuery;
use crate::binding::BoundValue;
use crate::error::LogicError;
use crate::relation::Datum;

/// A row of query results, one entry per column. `None` is a free cell.
pub type QueryRow<T = Datum> = Vec<Option<T>>;

/// Query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult<T = Datum> {
    /// The column names in order.
    pub columns: Vec<String>,
    /// One row per solution, in enumeration order.
    pub rows: Vec<QueryRow<T>>,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }
}

impl<T> QueryResult<T> {
    /// Create results with columns.
    #[must_use]
    pub const fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Add a row.
    pub fn push(&mut self, row: QueryRow<T>) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column called `name`, if it exists.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<Option<&T>>> {
        let index = self.columns.iter().position(|column| column == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(index).and_then(Option::as_ref))
                .collect(),
        )
    }
}

impl<T: fmt::Display> fmt::Display for QueryResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join(" | "))?;
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, " | ")?;
                }
                match cell {
                    Some(value) => write!(f, "{value}")?,
                    None => write!(f, "_")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl LogicalQuery {
    /// Enumerate every solution and count them. The query is left reset.
    pub fn count_solutions(&mut self) -> Result<usize, LogicError> {
        self.reset();
        let mut count = 0;
        while self.execute()? {
            count += 1;
        }
        self.reset();
        Ok(count)
    }

    /// Enumerate every solution, recording the projected cells of each.
    ///
    /// The query is reset before and after, so every solution is included
    /// and no binding survives.
    pub fn collect<T>(&mut self, projection: &[(&str, &BoundValue<T>)]) -> Result<QueryResult<T>, LogicError>
    where
        T: Clone + 'static,
    {
        let mut result =
            QueryResult::with_columns(projection.iter().map(|(name, _)| (*name).to_owned()).collect());
        self.reset();
        while self.execute()? {
            result.push(projection.iter().map(|(_, cell)| cell.get()).collect());
        }
        self.reset();
        Ok(result)
    }
}
