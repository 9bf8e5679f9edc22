//! Per-attempt undo log.
//!
//! The log maps every cell written during an attempt to the depth its
//! rollback stack had before the first write. Restoring truncates each stack
//! back to that depth, so the order in which cells are restored is irrelevant.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::value::CellId;

/// A cell whose rollback stack can be truncated back to an earlier depth.
pub(crate) trait Restore {
    fn restore_to(&self, depth: usize);
}

struct Checkpoint {
    cell: Rc<dyn Restore>,
    depth: usize,
}

/// Record of prior cell depths enabling exact rollback of one attempt.
#[derive(Default)]
pub struct UndoLog {
    checkpoints: HashMap<CellId, Checkpoint>,
}

impl UndoLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `depth` for `id` unless the cell was already touched.
    ///
    /// The first write within an attempt wins: later writes to the same cell
    /// restore to the depth recorded before the attempt began.
    pub(crate) fn snapshot(&mut self, id: CellId, cell: impl FnOnce() -> Rc<dyn Restore>, depth: usize) {
        self.checkpoints
            .entry(id)
            .or_insert_with(|| Checkpoint { cell: cell(), depth });
    }

    /// Check whether a cell has been written since the last restore.
    #[must_use]
    pub fn touched(&self, id: CellId) -> bool {
        self.checkpoints.contains_key(&id)
    }

    /// Number of distinct cells written since the last restore.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    /// Check if no cell has been written since the last restore.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    /// Undo every recorded write and clear the log.
    ///
    /// Returns the number of cells restored.
    pub fn restore(&mut self) -> usize {
        let restored = self.checkpoints.len();
        for (_, checkpoint) in self.checkpoints.drain() {
            checkpoint.cell.restore_to(checkpoint.depth);
        }
        restored
    }
}

impl fmt::Debug for UndoLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.checkpoints.iter().map(|(id, cp)| (id, cp.depth)))
            .finish()
    }
}
