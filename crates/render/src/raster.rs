use glam::{Vec2, Vec3};
use tilespace_common::Texture;

/// Triangles with less signed screen area than this are skipped.
const DEGENERATE_AREA: f32 = 1e-6;

/// ARGB colour buffer plus a depth buffer of the same size.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    depth: Vec<f32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            depth: vec![1.0; width * height],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }

    /// Fill colour with `argb` and reset depth to the far plane.
    pub fn clear(&mut self, argb: u32) {
        self.pixels.fill(argb);
        self.depth.fill(1.0);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Native-endian pixel bytes, ready for a blit.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.width && y < self.height).then(|| self.depth[y * self.width + x])
    }

    /// Depth-tested write. Returns true if the fragment was kept; writes
    /// outside the buffer are rejected.
    pub fn set_pixel_with_depth(&mut self, x: usize, y: usize, z: f32, argb: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = y * self.width + x;
        if z < self.depth[idx] {
            self.depth[idx] = z;
            self.pixels[idx] = argb;
            return true;
        }
        false
    }
}

/// A vertex after projection: pixel x/y, depth in `[0, 1]`, texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub pos: Vec3,
    pub uv: Vec2,
}

/// Signed edge function of `c` against the directed edge `a -> b`.
pub fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Flat Lambert term with an ambient floor.
pub fn lambert(normal: Vec3, light_dir: Vec3, ambient: f32) -> f32 {
    let n = normal.normalize_or_zero();
    let diffuse = n.dot(-light_dir.normalize_or_zero()).max(0.0);
    ambient + diffuse * (1.0 - ambient)
}

/// Scale the RGB channels of an ARGB colour, clamping each to 255. Alpha is kept.
pub fn shade(argb: u32, intensity: f32) -> u32 {
    let scale = |shift: u32| {
        let c = ((argb >> shift) & 0xFF) as f32;
        ((c * intensity).clamp(0.0, 255.0) as u32) << shift
    };
    (argb & 0xFF00_0000) | scale(16) | scale(8) | scale(0)
}

/// Scan-convert one textured triangle with a depth test.
///
/// Pixels are sampled at their centres and are inside when no two edge
/// functions disagree in sign, so either winding is drawn. Depth and UV use
/// affine barycentric weights. Returns the number of pixels written.
pub fn draw_triangle(
    fb: &mut Framebuffer,
    verts: &[ScreenVertex; 3],
    texture: &Texture,
    intensity: f32,
) -> usize {
    if fb.width == 0 || fb.height == 0 || texture.is_empty() {
        return 0;
    }

    let [p0, p1, p2] = verts.map(|v| v.pos.truncate());
    let area = edge(p0, p1, p2);
    if area.abs() < DEGENERATE_AREA {
        return 0;
    }

    let min = p0.min(p1).min(p2);
    let max = p0.max(p1).max(p2);
    let max_x = fb.width as i64 - 1;
    let max_y = fb.height as i64 - 1;
    let x0 = (min.x.floor() as i64).clamp(0, max_x);
    let x1 = (max.x.ceil() as i64).clamp(0, max_x);
    let y0 = (min.y.floor() as i64).clamp(0, max_y);
    let y1 = (max.y.ceil() as i64).clamp(0, max_y);

    let mut written = 0;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(p1, p2, p);
            let w1 = edge(p2, p0, p);
            let w2 = edge(p0, p1, p);

            let has_neg = w0 < 0.0 || w1 < 0.0 || w2 < 0.0;
            let has_pos = w0 > 0.0 || w1 > 0.0 || w2 > 0.0;
            if has_neg && has_pos {
                continue;
            }

            let (b0, b1, b2) = (w0 / area, w1 / area, w2 / area);
            let z = b0 * verts[0].pos.z + b1 * verts[1].pos.z + b2 * verts[2].pos.z;
            if z >= fb.depth[y as usize * fb.width + x as usize] {
                continue;
            }

            let uv = verts[0].uv * b0 + verts[1].uv * b1 + verts[2].uv * b2;
            let Some(texel) = texture.sample(uv.x, uv.y) else {
                continue;
            };
            if fb.set_pixel_with_depth(x as usize, y as usize, z, shade(texel, intensity)) {
                written += 1;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vert(x: f32, y: f32, z: f32) -> ScreenVertex {
        ScreenVertex {
            pos: Vec3::new(x, y, z),
            uv: Vec2::ZERO,
        }
    }

    fn quad(z: f32) -> [[ScreenVertex; 3]; 2] {
        [
            [vert(0.0, 0.0, z), vert(8.0, 0.0, z), vert(8.0, 8.0, z)],
            [vert(0.0, 0.0, z), vert(8.0, 8.0, z), vert(0.0, 8.0, z)],
        ]
    }

    #[test]
    fn out_of_bounds_write_is_rejected() {
        let mut fb = Framebuffer::new(4, 4);
        assert!(!fb.set_pixel_with_depth(0, 4, 0.5, 0xFFFF_FFFF));
        assert!(!fb.set_pixel_with_depth(4, 0, 0.5, 0xFFFF_FFFF));
        assert!(fb.set_pixel_with_depth(3, 3, 0.5, 0xFFFF_FFFF));
        assert_eq!(fb.pixel(3, 3), Some(0xFFFF_FFFF));
    }

    #[test]
    fn clear_resets_depth_and_colour() {
        let mut fb = Framebuffer::new(4, 4);
        fb.set_pixel_with_depth(1, 1, 0.3, 7);
        fb.clear(0xFF00_0000);
        assert_eq!(fb.pixel(1, 1), Some(0xFF00_0000));
        assert_eq!(fb.depth(1, 1), Some(1.0));
        assert_eq!(fb.as_bytes().len(), 4 * 4 * 4);
    }

    #[test]
    fn edge_sign_flips_with_side() {
        let a = Vec2::ZERO;
        let b = Vec2::new(1.0, 0.0);
        let above = edge(a, b, Vec2::new(0.5, 1.0));
        let below = edge(a, b, Vec2::new(0.5, -1.0));
        assert!(above * below < 0.0);
        assert_eq!(edge(a, b, Vec2::new(0.5, 0.0)), 0.0);
    }

    #[test]
    fn lambert_bounds() {
        let down = Vec3::NEG_Y;
        assert_eq!(lambert(Vec3::Y, down, 0.25), 1.0);
        assert_eq!(lambert(Vec3::NEG_Y, down, 0.25), 0.25);
        assert_eq!(lambert(Vec3::X, down, 0.25), 0.25);
    }

    #[test]
    fn shade_scales_rgb_and_keeps_alpha() {
        assert_eq!(shade(0x80FF_8040, 0.5), 0x807F_4020);
        assert_eq!(shade(0xFF80_8080, 4.0), 0xFFFF_FFFF);
        assert_eq!(shade(0xFF12_3456, 0.0), 0xFF00_0000);
    }

    #[test]
    fn both_windings_fill_pixels() {
        let tex = Texture::solid(1, 1, 0xFFFF_FFFF);
        let mut cw = Framebuffer::new(8, 8);
        let mut ccw = Framebuffer::new(8, 8);
        let t = [vert(0.0, 0.0, 0.5), vert(8.0, 0.0, 0.5), vert(0.0, 8.0, 0.5)];
        let r = [t[0], t[2], t[1]];
        let a = draw_triangle(&mut cw, &t, &tex, 1.0);
        let b = draw_triangle(&mut ccw, &r, &tex, 1.0);
        assert!(a > 0);
        assert_eq!(a, b);
        assert_eq!(cw.pixels(), ccw.pixels());
    }

    #[test]
    fn degenerate_triangle_draws_nothing() {
        let tex = Texture::solid(1, 1, 0xFFFF_FFFF);
        let mut fb = Framebuffer::new(8, 8);
        let line = [vert(0.0, 0.0, 0.5), vert(4.0, 4.0, 0.5), vert(8.0, 8.0, 0.5)];
        assert_eq!(draw_triangle(&mut fb, &line, &tex, 1.0), 0);
    }

    #[test]
    fn depth_test_is_order_independent() {
        let near = Texture::solid(1, 1, 0xFFFF_0000);
        let far = Texture::solid(1, 1, 0xFF00_00FF);

        let mut a = Framebuffer::new(8, 8);
        a.clear(0xFF00_0000);
        for t in quad(0.2) {
            draw_triangle(&mut a, &t, &near, 1.0);
        }
        for t in quad(0.7) {
            draw_triangle(&mut a, &t, &far, 1.0);
        }

        let mut b = Framebuffer::new(8, 8);
        b.clear(0xFF00_0000);
        for t in quad(0.7) {
            draw_triangle(&mut b, &t, &far, 1.0);
        }
        for t in quad(0.2) {
            draw_triangle(&mut b, &t, &near, 1.0);
        }

        assert_eq!(a.pixels(), b.pixels());
        assert!(a.pixels().iter().all(|p| *p == 0xFFFF_0000));
    }

    #[test]
    fn equal_depth_keeps_first_fragment() {
        let first = Texture::solid(1, 1, 0xFF11_1111);
        let second = Texture::solid(1, 1, 0xFF22_2222);
        let mut fb = Framebuffer::new(8, 8);
        for t in quad(0.5) {
            draw_triangle(&mut fb, &t, &first, 1.0);
        }
        for t in quad(0.5) {
            draw_triangle(&mut fb, &t, &second, 1.0);
        }
        assert_eq!(fb.pixel(4, 4), Some(0xFF11_1111));
    }

    #[test]
    fn offscreen_triangle_is_clipped_to_bounds() {
        let tex = Texture::solid(1, 1, 0xFFFF_FFFF);
        let mut fb = Framebuffer::new(4, 4);
        let big = [vert(-50.0, -50.0, 0.5), vert(50.0, -50.0, 0.5), vert(0.0, 50.0, 0.5)];
        assert_eq!(draw_triangle(&mut fb, &big, &tex, 1.0), 16);
    }

    #[test]
    fn uv_interpolation_samples_texture() {
        // Texel i encodes its own column; u runs 0..1 across the quad.
        let tex = Texture::new(9, 1, (0..9).map(|i| 0xFF00_0000 | i).collect()).unwrap();
        let mut fb = Framebuffer::new(8, 8);
        let uv = |x: f32, y: f32| ScreenVertex {
            pos: Vec3::new(x, y, 0.5),
            uv: Vec2::new(x / 8.0, 0.0),
        };
        draw_triangle(&mut fb, &[uv(0.0, 0.0), uv(8.0, 0.0), uv(8.0, 8.0)], &tex, 1.0);
        draw_triangle(&mut fb, &[uv(0.0, 0.0), uv(8.0, 8.0), uv(0.0, 8.0)], &tex, 1.0);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(fb.pixel(x, y), Some(0xFF00_0000 | x as u32), "pixel ({x}, {y})");
            }
        }
    }
}
