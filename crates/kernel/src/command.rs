use serde::{Deserialize, Serialize};
use tilespace_common::TileRef;

/// One cell change, carrying enough context to undo itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileEdit {
    pub layer: usize,
    pub x: usize,
    pub y: usize,
    pub old: TileRef,
    pub new: TileRef,
}

impl TileEdit {
    /// Same cell with old and new swapped.
    pub fn inverse(&self) -> Self {
        Self {
            old: self.new,
            new: self.old,
            ..*self
        }
    }
}

/// An editing command that can be applied to a grid and reversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditCommand {
    /// A single cell change.
    Single(TileEdit),
    /// Ordered cell changes applied and reverted as one unit.
    Batch(Vec<TileEdit>),
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    ///
    /// A batch is inverted back to front so a cell edited twice inside one
    /// batch ends at its original value.
    pub fn inverse(&self) -> Self {
        match self {
            Self::Single(edit) => Self::Single(edit.inverse()),
            Self::Batch(edits) => Self::Batch(edits.iter().rev().map(TileEdit::inverse).collect()),
        }
    }

    /// The cell changes in application order.
    pub fn edits(&self) -> &[TileEdit] {
        match self {
            Self::Single(edit) => std::slice::from_ref(edit),
            Self::Batch(edits) => edits,
        }
    }

    /// Number of cell changes.
    pub fn len(&self) -> usize {
        self.edits().len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits().is_empty()
    }
}

/// Undo/redo stacks plus the batch being collected.
#[derive(Debug, Clone, Default)]
pub struct History {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
    pending: Option<Vec<TileEdit>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an applied edit. Any new edit invalidates the redo stack.
    pub fn record(&mut self, edit: TileEdit) {
        match &mut self.pending {
            Some(batch) => batch.push(edit),
            None => self.undo_stack.push(EditCommand::Single(edit)),
        }
        self.redo_stack.clear();
    }

    /// Start collecting edits into one unit. Returns the edits of a pending
    /// batch that was replaced, if it had any.
    pub fn begin_batch(&mut self) -> Option<Vec<TileEdit>> {
        self.pending
            .replace(Vec::new())
            .filter(|discarded| !discarded.is_empty())
    }

    /// Close the pending batch. Returns the number of edits committed as one
    /// undo entry; an empty batch commits nothing.
    pub fn end_batch(&mut self) -> usize {
        match self.pending.take() {
            Some(edits) if !edits.is_empty() => {
                let count = edits.len();
                self.undo_stack.push(EditCommand::Batch(edits));
                count
            }
            _ => 0,
        }
    }

    pub fn is_batching(&self) -> bool {
        self.pending.is_some()
    }

    /// Move the latest command to the redo stack and return it.
    pub fn undo(&mut self) -> Option<&EditCommand> {
        let cmd = self.undo_stack.pop()?;
        self.redo_stack.push(cmd);
        self.redo_stack.last()
    }

    /// Move the latest undone command back to the undo stack and return it.
    pub fn redo(&mut self) -> Option<&EditCommand> {
        let cmd = self.redo_stack.pop()?;
        self.undo_stack.push(cmd);
        self.undo_stack.last()
    }

    /// Command that the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&EditCommand> {
        self.undo_stack.last()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }
}
