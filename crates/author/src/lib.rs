//! Authoring: the editing session that turns actions into grid edits.
//!
//! # Invariants
//! - Every grid change goes through a `Map` edit and is undoable.
//! - A stroke commits at most one undo entry per map it touched.
//! - A stroke creates at most one new map across an edge.
//! - Positions past a map border land on the facing border cell of the neighbour.

pub mod edge;
pub mod editor;

pub use edge::{MapEdge, Redirect, redirect};
pub use editor::{EditError, Editor, EditorState};

pub fn crate_info() -> &'static str {
    "tilespace-author v0.1.0"
}
