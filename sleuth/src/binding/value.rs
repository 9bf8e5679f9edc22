//! Typed variable cells.
//!
//! - `Value<T>` - an immutable cell holding a domain value (stored facts)
//! - `BoundValue<T>` - a mutable, shareable cell with a rollback stack (patterns)
//!
//! A `BoundValue` is unbound while its stack is empty. Every write goes through
//! an `UndoLog` so the enclosing attempt can roll it back.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::undo::{Restore, UndoLog};
use crate::kb::attribute_hash;

/// Counter for generating unique cell identifiers.
static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a `BoundValue`, shared by all of its handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    fn next() -> Self {
        Self(NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An immutable typed cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value<T>(T);

impl<T> Value<T> {
    /// Wrap a domain value.
    pub const fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the wrapped value.
    pub const fn get(&self) -> &T {
        &self.0
    }

    /// Unwrap the cell.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: Hash> Value<T> {
    /// Hash used to cluster facts on this attribute.
    #[must_use]
    pub fn hash_key(&self) -> u64 {
        attribute_hash(&self.0)
    }
}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T: fmt::Display> fmt::Display for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct Slot<T> {
    id: CellId,
    stack: RefCell<Vec<T>>,
}

impl<T> Restore for Slot<T> {
    fn restore_to(&self, depth: usize) {
        self.stack.borrow_mut().truncate(depth);
    }
}

/// A mutable typed cell with a rollback history.
///
/// Cloning a `BoundValue` yields another handle to the same cell, which is how
/// one variable is shared between several patterns and predicates of a query.
pub struct BoundValue<T> {
    slot: Rc<Slot<T>>,
}

impl<T> Clone for BoundValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: Clone + 'static> BoundValue<T> {
    /// Create a free variable.
    #[must_use]
    pub fn unbound() -> Self {
        Self::from_stack(Vec::new())
    }

    /// Create a variable already bound to `value`.
    ///
    /// The initial binding sits at depth one and is never rolled back.
    #[must_use]
    pub fn bound(value: T) -> Self {
        Self::from_stack(vec![value])
    }

    fn from_stack(stack: Vec<T>) -> Self {
        Self {
            slot: Rc::new(Slot {
                id: CellId::next(),
                stack: RefCell::new(stack),
            }),
        }
    }

    /// The identity of this cell.
    #[must_use]
    pub fn id(&self) -> CellId {
        self.slot.id
    }

    /// Check if the cell currently holds a value.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.slot.stack.borrow().is_empty()
    }

    /// Depth of the rollback stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.slot.stack.borrow().len()
    }

    /// A copy of the current value, if bound.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.slot.stack.borrow().last().cloned()
    }

    /// Inspect the current value without cloning it.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.slot.stack.borrow().last())
    }

    /// The current value as an immutable cell, if bound.
    #[must_use]
    pub fn to_value(&self) -> Option<Value<T>> {
        self.get().map(Value::new)
    }

    /// Push `value` as the current value.
    ///
    /// The first write within the current attempt records the prior depth in
    /// `undo`.
    pub fn update(&self, value: T, undo: &mut UndoLog) {
        let depth = self.depth();
        undo.snapshot(
            self.slot.id,
            || Rc::clone(&self.slot) as Rc<dyn Restore>,
            depth,
        );
        self.slot.stack.borrow_mut().push(value);
    }

    /// Bind the cell to `value` if it is currently free.
    pub fn bind_free(&self, value: &Value<T>, undo: &mut UndoLog) {
        if !self.is_bound() {
            self.update(value.get().clone(), undo);
        }
    }

    /// Copy the value of `source` into this cell if this cell is free.
    pub fn bind_from(&self, source: &Self, undo: &mut UndoLog) {
        if self.is_bound() {
            return;
        }
        if let Some(value) = source.get() {
            self.update(value, undo);
        }
    }

    /// A new, independent cell holding the current value (or free).
    #[must_use]
    pub fn detached(&self) -> Self {
        self.get().map_or_else(Self::unbound, Self::bound)
    }
}

impl<T: Clone + PartialEq + 'static> BoundValue<T> {
    /// Check whether the cell is free or holds `value`.
    #[must_use]
    pub fn matches(&self, value: &Value<T>) -> bool {
        self.with_value(|current| current.is_none_or(|current| current == value.get()))
    }

    /// Check whether two cells agree wherever both are bound.
    #[must_use]
    pub fn agrees_with(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.slot, &other.slot) {
            return true;
        }
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Bind a free cell to `value`, or compare a bound one against it.
    pub fn unify(&self, value: &T, undo: &mut UndoLog) -> bool {
        let agrees = self.with_value(|current| current.map(|current| current == value));
        match agrees {
            Some(agrees) => agrees,
            None => {
                self.update(value.clone(), undo);
                true
            }
        }
    }
}

impl<T: Clone + Hash + 'static> BoundValue<T> {
    /// Hash of the current value, if bound.
    #[must_use]
    pub fn hash_key(&self) -> Option<u64> {
        self.with_value(|current| current.map(attribute_hash))
    }
}

impl<T: fmt::Debug> fmt::Debug for BoundValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stack = self.slot.stack.borrow();
        match stack.last() {
            Some(value) => write!(f, "?{}={value:?}", self.slot.id.0),
            None => write!(f, "?{}", self.slot.id.0),
        }
    }
}
