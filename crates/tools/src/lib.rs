//! Developer Tooling: area inspector and rolling frame timing.
//!
//! # Invariants
//! - Tools only read editor state; they never mutate an area.

pub mod inspector;
pub mod timer;

pub use inspector::{AreaInspector, AreaSummary, MapInfo};
pub use timer::{FrameTimer, FrameTimings};

pub fn crate_info() -> &'static str {
    "tilespace-tools v0.1.0"
}
