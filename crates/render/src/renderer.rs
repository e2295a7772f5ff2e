use std::time::{Duration, Instant};

use glam::Vec3;
use tilespace_common::{MAP_HEIGHT, MAP_WIDTH, MapCoord, RenderPrimitive};
use tilespace_kernel::Area;

use crate::camera::OrbitCamera;
use crate::config::RenderConfig;
use crate::raster::{Framebuffer, ScreenVertex, draw_triangle, lambert};
use crate::transform::{Projector, depth_visible};

/// Renderer-agnostic interface.
///
/// A renderer reads the area and a camera and produces output. It never
/// mutates the area.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, area: &Area, camera: &OrbitCamera) -> Self::Output;
}

/// Counters for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub maps: usize,
    /// Placed tiles that resolved to a primitive.
    pub tiles_drawn: usize,
    /// Placed tiles whose reference resolved to nothing.
    pub unresolved: usize,
    pub triangles_submitted: usize,
    pub triangles_culled: usize,
    pub pixels_written: usize,
    pub duration: Duration,
}

/// World-space origin of a tile: columns along X, layers along Y, rows along Z.
pub fn tile_origin(map: MapCoord, layer: usize, x: usize, y: usize) -> Vec3 {
    Vec3::new(
        (map.x * MAP_WIDTH + x) as f32,
        layer as f32,
        (map.y * MAP_HEIGHT + y) as f32,
    )
}

/// Single-threaded depth-buffered rasterizer.
#[derive(Debug)]
pub struct SoftwareRenderer {
    framebuffer: Framebuffer,
    config: RenderConfig,
    last_unresolved: usize,
}

impl SoftwareRenderer {
    pub fn new(width: usize, height: usize, config: RenderConfig) -> Self {
        Self {
            framebuffer: Framebuffer::new(width, height),
            config,
            last_unresolved: 0,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.framebuffer.resize(width, height);
    }

    /// The most recent frame.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    fn draw_primitive(
        &mut self,
        primitive: &RenderPrimitive,
        origin: Vec3,
        projector: &Projector,
        stats: &mut FrameStats,
    ) {
        let mesh = &primitive.mesh;
        for tri in mesh.triangles() {
            stats.triangles_submitted += 1;
            let [Some(a), Some(b), Some(c)] = tri.map(|i| mesh.vertices.get(i).copied()) else {
                stats.triangles_culled += 1;
                continue;
            };

            let world = [a.position + origin, b.position + origin, c.position + origin];
            let screen = [
                projector.to_screen(world[0]),
                projector.to_screen(world[1]),
                projector.to_screen(world[2]),
            ];
            let [Some(s0), Some(s1), Some(s2)] = screen else {
                stats.triangles_culled += 1;
                continue;
            };
            if ![s0.z, s1.z, s2.z].into_iter().all(depth_visible) {
                stats.triangles_culled += 1;
                continue;
            }

            let normal = (world[1] - world[0]).cross(world[2] - world[0]);
            let intensity = lambert(normal, self.config.light_dir, self.config.ambient);
            let verts = [
                ScreenVertex { pos: s0, uv: a.uv },
                ScreenVertex { pos: s1, uv: b.uv },
                ScreenVertex { pos: s2, uv: c.uv },
            ];
            stats.pixels_written +=
                draw_triangle(&mut self.framebuffer, &verts, &primitive.texture, intensity);
        }
    }
}

impl Renderer for SoftwareRenderer {
    type Output = FrameStats;

    fn render(&mut self, area: &Area, camera: &OrbitCamera) -> FrameStats {
        let _span = tracing::info_span!("render_frame", area = area.name()).entered();
        let start = Instant::now();
        let mut stats = FrameStats::default();

        self.framebuffer.clear(self.config.background);
        let projector =
            Projector::from_camera(camera, self.framebuffer.width(), self.framebuffer.height());

        for (coord, map) in area.maps() {
            stats.maps += 1;
            for (layer, x, y, tile) in map.placed() {
                let Some(def) = area.resolve(tile) else {
                    stats.unresolved += 1;
                    continue;
                };
                let Some(primitive) = &def.primitive else {
                    continue;
                };
                if primitive.mesh.is_empty() || primitive.texture.is_empty() {
                    continue;
                }
                stats.tiles_drawn += 1;
                self.draw_primitive(primitive, tile_origin(coord, layer, x, y), &projector, &mut stats);
            }
        }

        if stats.unresolved != self.last_unresolved {
            if stats.unresolved > 0 {
                tracing::warn!(count = stats.unresolved, "tiles reference missing tileset data");
            }
            self.last_unresolved = stats.unresolved;
        }

        stats.duration = start.elapsed();
        tracing::trace!(
            maps = stats.maps,
            tiles = stats.tiles_drawn,
            triangles = stats.triangles_submitted,
            culled = stats.triangles_culled,
            pixels = stats.pixels_written,
            elapsed_us = stats.duration.as_micros() as u64,
            "frame rendered"
        );
        stats
    }
}
