//! Editor Input: pointer, keyboard and camera input mapped to shared actions.
//!
//! # Invariants
//! - The authoring layer consumes actions, never raw input events.
//! - Grid positions may lie outside the addressed map; resolving them is the editor's job.

pub mod action;

pub use action::{Action, GridPos, Tool};

pub fn crate_info() -> &'static str {
    "tilespace-input v0.1.0"
}
