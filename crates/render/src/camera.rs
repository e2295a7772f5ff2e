use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Camera orbiting a pan target at a clamped distance.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Radians around the world Y axis.
    pub yaw: f32,
    /// Radians above the horizontal plane.
    pub pitch: f32,
    pub distance: f32,
    pub target: Vec3,
    config: CameraConfig,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            yaw: config.initial_yaw,
            pitch: config.initial_pitch,
            distance: config.initial_distance,
            target: Vec3::ZERO,
            config,
        };
        camera.clamp();
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Back to the configured initial pose, centred on the origin.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Unit vector from the target towards the eye.
    pub fn direction(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
    }

    pub fn eye(&self) -> Vec3 {
        self.target + self.direction() * self.distance
    }

    /// Rotate by drag deltas.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.config.orbit_sensitivity;
        self.pitch += dy * self.config.orbit_sensitivity;
        self.clamp();
    }

    /// Positive `delta` moves closer, negative moves away.
    pub fn zoom(&mut self, delta: f32) {
        if delta > 0.0 {
            self.distance *= 1.0 - self.config.zoom_step;
        } else if delta < 0.0 {
            self.distance *= 1.0 + self.config.zoom_step;
        }
        self.clamp();
    }

    /// Slide the target across the ground plane, scaled by distance.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let speed = self.distance * self.config.pan_sensitivity;
        let right = Vec3::new((self.yaw + FRAC_PI_2).cos(), 0.0, (self.yaw + FRAC_PI_2).sin());
        let forward = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        self.target += (-right * dx + forward * dy) * speed;
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    /// OpenGL-style projection: clip z in `[-w, w]`.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.config.fov_y_deg.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }

    /// Unvalidated configs may carry reversed or NaN bounds; this never panics.
    fn clamp(&mut self) {
        let limit = self.config.pitch_limit_deg.to_radians();
        self.pitch = clamp_between(self.pitch, -limit, limit);
        self.distance = clamp_between(
            self.distance,
            self.config.min_distance,
            self.config.max_distance,
        );
    }
}

/// Clamp into the range spanned by `a` and `b`, in either order.
fn clamp_between(value: f32, a: f32, b: f32) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    value.max(lo).min(hi)
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.yaw, -0.8);
        assert_eq!(cam.pitch, 0.6);
        assert_eq!(cam.distance, 20.0);
        assert!(((cam.eye() - cam.target).length() - 20.0).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.orbit(0.0, 10_000.0);
        assert!((cam.pitch - 85f32.to_radians()).abs() < 1e-6);
        cam.orbit(0.0, -100_000.0);
        assert!((cam.pitch + 85f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn unvalidated_limits_do_not_panic() {
        let config = CameraConfig {
            pitch_limit_deg: -10.0,
            min_distance: 50.0,
            max_distance: 10.0,
            ..CameraConfig::default()
        };
        let mut cam = OrbitCamera::new(config);
        cam.orbit(0.0, 10_000.0);
        assert!((cam.pitch - 10f32.to_radians()).abs() < 1e-6);
        assert!((10.0..=50.0).contains(&cam.distance));

        let cam = OrbitCamera::new(CameraConfig {
            pitch_limit_deg: f32::NAN,
            ..CameraConfig::default()
        });
        assert!(cam.distance.is_finite());
    }

    #[test]
    fn zoom_respects_limits() {
        let mut cam = OrbitCamera::default();
        for _ in 0..100 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance, 4.0);
        for _ in 0..100 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance, 100.0);
    }

    #[test]
    fn zoom_steps_are_multiplicative() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1.0);
        assert!((cam.distance - 18.0).abs() < 1e-4);
        cam.zoom(0.0);
        assert!((cam.distance - 18.0).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_target_on_ground_plane() {
        let mut cam = OrbitCamera::default();
        cam.pan(100.0, 50.0);
        assert_ne!(cam.target, Vec3::ZERO);
        assert_eq!(cam.target.y, 0.0);
    }

    #[test]
    fn view_maps_target_in_front_of_eye() {
        let cam = OrbitCamera::default();
        let p = cam.view_matrix().transform_point3(cam.target);
        assert!(p.z < 0.0);
        assert!(p.x.abs() < 1e-4 && p.y.abs() < 1e-4);
    }

    #[test]
    fn reset_restores_initial_pose() {
        let mut cam = OrbitCamera::default();
        cam.orbit(30.0, 10.0);
        cam.pan(5.0, 5.0);
        cam.reset();
        assert_eq!(cam, OrbitCamera::default());
    }
}
