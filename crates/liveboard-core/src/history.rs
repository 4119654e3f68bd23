//! Undo/redo history with gesture batching.
//!
//! Entries hold the *inverse* of what was done, in the order it was done.
//! Undoing an entry applies its ops back to front and yields a new entry
//! (the inverses of the inverses) for the opposite stack.

use crate::config::MAX_HISTORY;
use crate::crdt::DocumentMutation;
use crate::layer::LayerId;
use thiserror::Error;

/// One undoable change.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOp {
    /// Apply a mutation to the shared document.
    Document(DocumentMutation),
    /// Restore the local connection's selection.
    Selection(Vec<LayerId>),
}

/// A group of ops undone and redone together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoryEntry {
    ops: Vec<HistoryOp>,
}

impl HistoryEntry {
    pub fn new(ops: Vec<HistoryOp>) -> Self {
        Self { ops }
    }

    /// Ops in recording order.
    pub fn ops(&self) -> &[HistoryOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<HistoryOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Batch boundary misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("a history batch is already open")]
    BatchAlreadyOpen,
    #[error("no history batch is open")]
    NoOpenBatch,
}

/// Bounded undo and redo stacks.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Ops recorded since `begin_batch`.
    batch: Option<Vec<HistoryOp>>,
    max_history: usize,
}

impl HistoryManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            batch: None,
            max_history: max_history.max(1),
        }
    }

    /// Start collecting recorded ops into a single entry.
    pub fn begin_batch(&mut self) -> Result<(), HistoryError> {
        if self.batch.is_some() {
            return Err(HistoryError::BatchAlreadyOpen);
        }
        self.batch = Some(Vec::new());
        Ok(())
    }

    /// Close the open batch. A batch with no ops leaves history untouched.
    pub fn commit_batch(&mut self) -> Result<(), HistoryError> {
        let ops = self.batch.take().ok_or(HistoryError::NoOpenBatch)?;
        if !ops.is_empty() {
            self.push_undo(HistoryEntry::new(ops));
        }
        Ok(())
    }

    /// Open a batch unless one is already open.
    pub fn pause(&mut self) {
        if self.begin_batch().is_err() {
            log::debug!("history already paused, keeping the open batch");
        }
    }

    /// Commit the open batch, if any.
    pub fn resume(&mut self) {
        if self.commit_batch().is_err() {
            log::debug!("history resumed without an open batch");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.batch.is_some()
    }

    /// Record the inverse of a change that was just applied.
    ///
    /// Goes into the open batch if there is one, otherwise becomes its own
    /// entry. Either way the redo stack is cleared.
    pub fn record(&mut self, op: HistoryOp) {
        self.redo_stack.clear();
        match &mut self.batch {
            Some(ops) => ops.push(op),
            None => self.push_undo(HistoryEntry::new(vec![op])),
        }
    }

    /// Push an entry onto the undo stack without touching redo.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    /// Push an entry onto the redo stack.
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo_stack.push(entry);
        if self.redo_stack.len() > self.max_history {
            self.redo_stack.remove(0);
        }
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo_stack.pop()
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo_stack.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Drop both stacks and any open batch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch = None;
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}
