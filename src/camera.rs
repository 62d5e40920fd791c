//! Orbit camera: a distance along the view axis plus accumulated yaw and
//! pitch around the origin.
//!
//! Angles are kept as scalar sums in degrees and composed once per frame,
//! so consecutive drags accumulate commutatively. They are deliberately
//! unbounded; trigonometric periodicity makes wraparound unnecessary.

use glam::{Mat4, Vec3};

/// Distance change per scroll event (scene units).
const ZOOM_STEP: f32 = 1.0;

pub struct OrbitCamera {
    /// Distance from the origin along the view axis. Unclamped.
    pub distance: f32,
    /// Accumulated rotation around the vertical axis, degrees.
    pub yaw_deg: f32,
    /// Accumulated rotation around the horizontal axis, degrees.
    pub pitch_deg: f32,

    fovy_deg: f32,
    znear: f32,
    zfar: f32,
}

impl OrbitCamera {
    pub fn new() -> Self {
        Self {
            distance: 40.0,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            fovy_deg: 45.0,
            znear: 1.0,
            zfar: 100.0,
        }
    }

    /// One discrete zoom step. Positive `steps` (scroll up) moves the view
    /// closer, negative moves it away.
    pub fn zoom(&mut self, steps: f32) {
        self.distance -= steps * ZOOM_STEP;
    }

    /// Apply a pointer drag displacement: `dx` degrees of yaw around the
    /// vertical axis, `dy` degrees of pitch around the horizontal axis.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw_deg += dx;
        self.pitch_deg += dy;
    }

    /// View matrix: rotate the scene by the accumulated angles, then pull
    /// it `distance` units down the view axis.
    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.pitch_deg.to_radians())
            * Mat4::from_rotation_y(self.yaw_deg.to_radians())
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fovy_deg.to_radians(), aspect, self.znear, self.zfar);
        proj * self.view()
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_view_distance() {
        let camera = OrbitCamera::new();
        assert_eq!(camera.distance, 40.0);

        // The world origin ends up 40 units down the view axis.
        let eye_space = camera.view().transform_point3(Vec3::ZERO);
        assert!((eye_space - Vec3::new(0.0, 0.0, -40.0)).length() < 1e-5);
    }

    #[test]
    fn test_zoom_accumulates_per_event() {
        let mut camera = OrbitCamera::new();

        camera.zoom(1.0);
        camera.zoom(1.0);
        camera.zoom(1.0);
        assert_eq!(camera.distance, 37.0);

        camera.zoom(-1.0);
        assert_eq!(camera.distance, 38.0);
    }

    #[test]
    fn test_rotation_accumulates_commutatively() {
        let mut a = OrbitCamera::new();
        a.rotate(30.0, 10.0);
        a.rotate(-5.0, 45.0);

        let mut b = OrbitCamera::new();
        b.rotate(-5.0, 45.0);
        b.rotate(30.0, 10.0);

        assert!((a.yaw_deg - b.yaw_deg).abs() < 1e-6);
        assert!((a.pitch_deg - b.pitch_deg).abs() < 1e-6);
        assert!((a.yaw_deg - 25.0).abs() < 1e-6);
        assert!((a.pitch_deg - 55.0).abs() < 1e-6);
    }

    #[test]
    fn test_angles_are_unbounded() {
        let mut camera = OrbitCamera::new();
        camera.rotate(720.0, -1000.0);

        assert_eq!(camera.yaw_deg, 720.0);
        assert_eq!(camera.pitch_deg, -1000.0);

        // Periodicity: a full extra turn yields the same view.
        let mut wrapped = OrbitCamera::new();
        wrapped.rotate(720.0 - 360.0, -1000.0 + 360.0);

        let p = camera.view().transform_point3(Vec3::new(10.0, 0.0, 0.0));
        let q = wrapped.view().transform_point3(Vec3::new(10.0, 0.0, 0.0));
        assert!((p - q).length() < 1e-3);
    }
}
