//! Software Renderer: orbit camera, world-to-screen transform, depth-buffered
//! triangle rasterizer and map previews.
//!
//! # Invariants
//! - Rendering reads the area; it never mutates grid state.
//! - Depth is cleared to 1.0 and colour to an opaque background once per frame.
//! - Triangles with any vertex depth outside `[0, 1]` are dropped, not clipped.
//! - Dangling tile references render as empty.

pub mod camera;
pub mod config;
pub mod preview;
pub mod raster;
pub mod renderer;
pub mod transform;

pub use camera::OrbitCamera;
pub use config::{CameraConfig, ConfigError, RenderConfig, ViewportConfig};
pub use preview::{MapPreviews, PreviewCache, content_hash, map_preview};
pub use raster::{Framebuffer, ScreenVertex};
pub use renderer::{FrameStats, Renderer, SoftwareRenderer, tile_origin};
pub use transform::Projector;

pub fn crate_info() -> &'static str {
    "tilespace-render v0.1.0"
}
