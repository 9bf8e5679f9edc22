//! The query tree and its depth-first driver.
//!
//! Nodes live in an arena addressed by index. Node 0 is a sentinel root that
//! succeeds once per generation; every `with` step hangs off the previous
//! step's "true" edge, and `or_with` attaches a single alternative branch to
//! the root's "false" edge.
//!
//! # Transitions
//!
//! - hidden node: clear the flag, roll it back, move to the parent
//! - success: move along the "true" edge, or stop with a solution at a leaf
//! - failure with a "false" edge: move there (root only)
//! - failure otherwise: roll back, move to the parent, or stop exhausted
//!   when there is none
//!
//! # Cut
//!
//! A cut node succeeds once per generation and, on success, hides every
//! ancestor except the root. Backtracking into a hidden node unwinds it
//! without retrying it, so the choices made before the cut are committed.

#![allow(clippy::option_if_let_else)] // if-let reads better for the arena walk

use std::fmt;

use crate::binding::LAction;
use crate::error::{LogicError, MalformedQuery};

/// Index of a node in the arena.
pub type NodeId = usize;

/// The sentinel root.
const ROOT: NodeId = 0;

enum Step {
    /// The sentinel root.
    Start { fired: bool },
    /// A backtrackable action.
    Action(LAction),
    /// Commit to every choice made on the path to this node.
    Cut { fired: bool },
}

impl Step {
    fn get_next(&mut self) -> Result<bool, LogicError> {
        match self {
            Self::Start { fired } | Self::Cut { fired } => Ok(!std::mem::replace(fired, true)),
            Self::Action(action) => action.get_next(),
        }
    }

    fn rollback(&mut self) {
        match self {
            Self::Start { fired } | Self::Cut { fired } => *fired = false,
            Self::Action(action) => action.rollback(),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Action(_) => "action",
            Self::Cut { .. } => "cut",
        }
    }
}

struct Node {
    step: Step,
    parent: Option<NodeId>,
    on_true: Option<NodeId>,
    on_false: Option<NodeId>,
    hidden: bool,
}

impl Node {
    const fn new(step: Step, parent: Option<NodeId>) -> Self {
        Self {
            step,
            parent,
            on_true: None,
            on_false: None,
            hidden: false,
        }
    }
}

/// Where the next `execute()` resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Nothing tried yet: start at the root.
    Fresh,
    /// The last call stopped with a solution at this leaf.
    Solved(NodeId),
    /// The search is exhausted until `reset()`.
    Exhausted,
}

/// A query assembled from backtrackable steps.
///
/// # Example
///
/// ```
/// use sleuth::{BoundValue, LAction, LogicalQuery};
///
/// let x = BoundValue::<u32>::unbound();
/// let mut query = LogicalQuery::new()
///     .with(LAction::each(&x, [1, 2, 3]))
///     .with_predicate({
///         let x = x.clone();
///         move || x.get().is_some_and(|x| x % 2 == 1)
///     });
///
/// assert!(query.execute().unwrap());
/// assert_eq!(x.get(), Some(1));
/// assert!(query.execute().unwrap());
/// assert_eq!(x.get(), Some(3));
/// assert!(!query.execute().unwrap());
/// assert!(!x.is_bound());
/// ```
pub struct LogicalQuery {
    nodes: Vec<Node>,
    /// The node the next `with` step attaches to.
    tail: NodeId,
    cursor: Cursor,
}

impl Default for LogicalQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl LogicalQuery {
    /// Create a query with no steps. It has exactly one (empty) solution.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(Step::Start { fired: false }, None)],
            tail: ROOT,
            cursor: Cursor::Fresh,
        }
    }

    fn append(&mut self, step: Step) {
        let id = self.nodes.len();
        self.nodes.push(Node::new(step, Some(self.tail)));
        debug_assert!(self.nodes[self.tail].on_true.is_none());
        self.nodes[self.tail].on_true = Some(id);
        self.tail = id;
    }

    /// Add a required next step (conjunction).
    #[must_use]
    pub fn with(mut self, action: impl Into<LAction>) -> Self {
        self.append(Step::Action(action.into()));
        self
    }

    /// Add a step that succeeds once iff `predicate` holds.
    #[must_use]
    pub fn with_predicate<F>(self, predicate: F) -> Self
    where
        F: FnMut() -> bool + 'static,
    {
        self.with(LAction::predicate(predicate))
    }

    /// Attach the alternative branch to the root (whole-query disjunction).
    ///
    /// The alternative is tried once the main branch has no more solutions.
    /// Later `with` steps extend the alternative branch.
    pub fn or_with(mut self, action: impl Into<LAction>) -> Result<Self, LogicError> {
        if self.nodes.len() == 1 {
            return Err(MalformedQuery::EmptyMainBranch.into());
        }
        if self.nodes[ROOT].on_false.is_some() {
            return Err(MalformedQuery::AlternativeAlreadyAttached.into());
        }
        let id = self.nodes.len();
        self.nodes.push(Node::new(Step::Action(action.into()), None));
        self.nodes[ROOT].on_false = Some(id);
        self.tail = id;
        Ok(self)
    }

    /// Embed `inner` as a single backtrackable step.
    #[must_use]
    pub fn scope(self, inner: Self) -> Self {
        self.with(LAction::scope(inner))
    }

    /// Add a step that succeeds iff `inner` cannot be proved.
    #[must_use]
    pub fn not(self, inner: Self) -> Self {
        self.with(LAction::not(inner))
    }

    /// Commit to the choices made so far.
    #[must_use]
    pub fn cut(mut self) -> Self {
        self.append(Step::Cut { fired: false });
        self
    }

    /// Add a step that always fails.
    #[must_use]
    pub fn fail(self) -> Self {
        self.with(LAction::fail())
    }

    /// Search for the next solution.
    ///
    /// The first call starts at the root; each later call resumes from the
    /// last solution. Returns `Ok(false)` once the search is exhausted, with
    /// every binding undone. On error the query is reset before the error is
    /// returned.
    pub fn execute(&mut self) -> Result<bool, LogicError> {
        let start = match self.cursor {
            Cursor::Fresh => ROOT,
            Cursor::Solved(leaf) => leaf,
            Cursor::Exhausted => return Ok(false),
        };
        match self.walk(start) {
            Ok(Some(leaf)) => {
                self.cursor = Cursor::Solved(leaf);
                Ok(true)
            }
            Ok(None) => {
                tracing::trace!(nodes = self.nodes.len(), "query exhausted");
                self.cursor = Cursor::Exhausted;
                Ok(false)
            }
            Err(error) => {
                self.reset();
                Err(error)
            }
        }
    }

    /// Drive the state machine from `start`; returns the leaf of a solution.
    fn walk(&mut self, start: NodeId) -> Result<Option<NodeId>, LogicError> {
        let mut current = Some(start);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            if node.hidden {
                node.hidden = false;
                node.step.rollback();
                current = node.parent;
                continue;
            }
            if node.step.get_next()? {
                let is_cut = matches!(node.step, Step::Cut { .. });
                let next = node.on_true;
                if is_cut {
                    self.prune_ancestors(id);
                }
                match next {
                    Some(next) => current = Some(next),
                    None => return Ok(Some(id)),
                }
            } else if let Some(alternative) = node.on_false {
                current = Some(alternative);
            } else {
                node.step.rollback();
                current = node.parent;
            }
        }
        Ok(None)
    }

    /// Hide every ancestor of `cut` strictly below the root.
    fn prune_ancestors(&mut self, cut: NodeId) {
        let mut pruned = 0_usize;
        let mut ancestor = self.nodes[cut].parent;
        while let Some(id) = ancestor {
            if id == ROOT {
                break;
            }
            let node = &mut self.nodes[id];
            node.hidden = true;
            ancestor = node.parent;
            pruned += 1;
        }
        tracing::trace!(cut, pruned, "cut committed");
    }

    /// Undo every binding held by the query and re-arm it.
    pub fn reset(&mut self) {
        for node in self.nodes.iter_mut().rev() {
            node.hidden = false;
            node.step.rollback();
        }
        self.cursor = Cursor::Fresh;
    }

    /// Number of nodes, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the search has run out of solutions.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Check whether the root has an alternative branch.
    #[must_use]
    pub fn has_alternative(&self) -> bool {
        self.nodes[ROOT].on_false.is_some()
    }
}

impl fmt::Debug for LogicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (id, node) in self.nodes.iter().enumerate() {
            list.entry(&format_args!(
                "#{id} {} parent={:?} true={:?} false={:?}{}",
                node.step.kind(),
                node.parent,
                node.on_true,
                node.on_false,
                if node.hidden { " hidden" } else { "" }
            ));
        }
        list.finish()
    }
}
