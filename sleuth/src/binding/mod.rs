//! Variable cells and the actions that bind them.
//!
//! - `Value` / `BoundValue` - typed cells, the latter with a rollback stack
//! - `UndoLog` - per-attempt record of which cells to restore
//! - `LAction` - a backtrackable step that owns its attempt's undo log

mod action;
mod undo;
mod value;

pub use action::LAction;
pub use undo::UndoLog;
pub use value::{BoundValue, CellId, Value};
