use glam::{Mat4, Vec3};

use crate::camera::OrbitCamera;

/// Clip-space `w` magnitudes below this are not divided.
pub const W_EPSILON: f32 = 1e-4;

/// World to screen mapping for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    view_proj: Mat4,
    width: f32,
    height: f32,
}

impl Projector {
    pub fn new(view: Mat4, proj: Mat4, width: usize, height: usize) -> Self {
        Self {
            view_proj: proj * view,
            width: width as f32,
            height: height as f32,
        }
    }

    /// Matrices for `camera` at the aspect ratio of a `width x height` target.
    pub fn from_camera(camera: &OrbitCamera, width: usize, height: usize) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        Self::new(
            camera.view_matrix(),
            camera.projection_matrix(aspect),
            width,
            height,
        )
    }

    /// View, projection and perspective divide. The result holds NDC x/y and
    /// depth remapped to `[0, 1]` (near = 0, far = 1).
    ///
    /// Returns `None` when `|w|` is too small to divide by.
    pub fn transform(&self, world: Vec3) -> Option<Vec3> {
        let clip = self.view_proj * world.extend(1.0);
        if clip.w.abs() < W_EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(ndc.x, ndc.y, ndc.z * 0.5 + 0.5))
    }

    /// NDC x/y in `[-1, 1]` to pixel coordinates, y growing downward. Depth
    /// passes through unchanged.
    pub fn project(&self, ndc: Vec3) -> Vec3 {
        Vec3::new(
            (ndc.x + 1.0) * 0.5 * self.width,
            (1.0 - ndc.y) * 0.5 * self.height,
            ndc.z,
        )
    }

    /// `transform` followed by `project`.
    pub fn to_screen(&self, world: Vec3) -> Option<Vec3> {
        self.transform(world).map(|ndc| self.project(ndc))
    }
}

/// Whether a transformed depth is drawable.
pub fn depth_visible(z: f32) -> bool {
    (0.0..=1.0).contains(&z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn looking_down_neg_z() -> Projector {
        let view = Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        Projector::new(view, proj, 100, 100)
    }

    #[test]
    fn near_and_far_planes_map_to_unit_depth() {
        let p = looking_down_neg_z();
        let near = p.transform(Vec3::new(0.0, 0.0, -1.0)).unwrap();
        let far = p.transform(Vec3::new(0.0, 0.0, -10.0)).unwrap();
        assert!(near.z.abs() < 1e-5);
        assert!((far.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn depth_increases_with_distance() {
        let p = looking_down_neg_z();
        let a = p.transform(Vec3::new(0.0, 0.0, -2.0)).unwrap();
        let b = p.transform(Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert!(a.z < b.z);
    }

    #[test]
    fn point_on_eye_plane_is_rejected() {
        let p = looking_down_neg_z();
        assert!(p.transform(Vec3::new(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn point_behind_eye_has_out_of_range_depth() {
        let p = looking_down_neg_z();
        let behind = p.transform(Vec3::new(0.0, 0.0, 3.0)).unwrap();
        assert!(!depth_visible(behind.z));
    }

    #[test]
    fn project_flips_y() {
        let p = looking_down_neg_z();
        assert_eq!(p.project(Vec3::new(-1.0, 1.0, 0.5)), Vec3::new(0.0, 0.0, 0.5));
        assert_eq!(p.project(Vec3::new(1.0, -1.0, 0.5)), Vec3::new(100.0, 100.0, 0.5));
        assert_eq!(p.project(Vec3::ZERO), Vec3::new(50.0, 50.0, 0.0));
    }

    #[test]
    fn center_of_view_lands_mid_screen() {
        let p = looking_down_neg_z();
        let s = p.to_screen(Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert!((s.x - 50.0).abs() < 1e-3 && (s.y - 50.0).abs() < 1e-3);
    }
}
