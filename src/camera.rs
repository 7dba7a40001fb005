use crate::config::{CameraConfig, OrbitConfig};
use nalgebra::{Matrix4, Point3, Vector3};
use std::f32::consts::PI;

/// Keeps the orbit away from the poles so `look_at` never degenerates.
const POLAR_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(cfg: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            fov_degrees: cfg.fov_degrees,
            aspect,
            near: cfg.near,
            far: cfg.far,
            position: Point3::new(0.0, 0.0, cfg.distance),
            target: Point3::origin(),
            projection: Matrix4::identity(),
        };
        camera.update_projection();
        camera
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
        self.update_projection();
    }

    /// Recomputes the cached projection after any field change.
    pub fn update_projection(&mut self) {
        self.projection = Matrix4::new_perspective(self.aspect, self.fov_degrees.to_radians(), self.near, self.far);
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &Vector3::y())
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view()
    }
}

/// Orbit around `camera.target` driven by drag and scroll input.
///
/// Input only accumulates deltas; `update` turns them into motion. With
/// damping on, each update consumes `damping_factor` of the pending delta so
/// the camera glides to a stop over several frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    cfg: OrbitConfig,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    enabled: bool,
}

impl OrbitControls {
    pub fn new(cfg: &OrbitConfig) -> Self {
        Self { cfg: cfg.clone(), theta_delta: 0.0, phi_delta: 0.0, scale: 1.0, enabled: true }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Drag in viewport pixels; a full-height drag turns the camera by 2π.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if !self.enabled || viewport_height <= 0.0 {
            return;
        }
        let k = 2.0 * PI * self.cfg.rotate_speed / viewport_height;
        self.theta_delta -= dx * k;
        self.phi_delta -= dy * k;
    }

    /// Positive scroll moves towards the target.
    pub fn dolly(&mut self, scroll: f32) {
        if !self.enabled || scroll == 0.0 {
            return;
        }
        let step = 0.95f32.powf(self.cfg.zoom_speed * scroll.abs() / 50.0);
        if scroll > 0.0 {
            self.scale *= step;
        } else {
            self.scale /= step;
        }
    }

    /// Applies pending motion to the camera. Returns true when it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - camera.target;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return false;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        let (d_theta, d_phi) = if self.cfg.enable_damping {
            (self.theta_delta * self.cfg.damping_factor, self.phi_delta * self.cfg.damping_factor)
        } else {
            (self.theta_delta, self.phi_delta)
        };
        theta += d_theta;
        phi = (phi + d_phi).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        let (min_distance, max_distance) = self.cfg.distance_range();
        let new_radius = (radius * self.scale).max(min_distance).min(max_distance);

        let sin_phi = phi.sin();
        camera.position = camera.target
            + Vector3::new(new_radius * sin_phi * theta.sin(), new_radius * phi.cos(), new_radius * sin_phi * theta.cos());

        if self.cfg.enable_damping {
            self.theta_delta *= 1.0 - self.cfg.damping_factor;
            self.phi_delta *= 1.0 - self.cfg.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.scale = 1.0;

        d_theta.abs() > 1e-6 || d_phi.abs() > 1e-6 || (new_radius - radius).abs() > 1e-6
    }

    /// Stops reacting to input and drops pending motion.
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(&CameraConfig::default(), 16.0 / 9.0)
    }

    #[test]
    fn starts_ten_units_back_looking_at_origin() {
        let cam = camera();
        assert_relative_eq!(cam.position.z, 10.0);
        let p = cam.view().transform_point(&Point3::origin());
        assert_relative_eq!(p.z, -10.0, epsilon = 1e-5);
    }

    #[test]
    fn set_aspect_updates_projection() {
        let mut cam = camera();
        let before = *cam.projection();
        cam.set_aspect(1.0);
        assert_relative_eq!(cam.aspect, 1.0);
        assert_ne!(before, *cam.projection());
        assert_relative_eq!(cam.projection()[(0, 0)], cam.projection()[(1, 1)], epsilon = 1e-6);
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut cam = camera();
        cam.set_aspect(f32::NAN);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0);
        cam.set_aspect(0.0);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0);
    }

    #[test]
    fn damped_rotation_keeps_distance_and_settles() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&OrbitConfig::default());
        controls.rotate(100.0, 0.0, 800.0);
        assert!(controls.update(&mut cam));
        assert_relative_eq!((cam.position - cam.target).norm(), 10.0, epsilon = 1e-4);
        assert!(cam.position.x.abs() > 0.0);

        for _ in 0..2000 {
            controls.update(&mut cam);
        }
        assert!(!controls.update(&mut cam));
    }

    #[test]
    fn dolly_is_clamped() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&OrbitConfig::default());
        for _ in 0..200 {
            controls.dolly(500.0);
            controls.update(&mut cam);
        }
        assert_relative_eq!((cam.position - cam.target).norm(), OrbitConfig::default().min_distance, epsilon = 1e-4);
    }

    #[test]
    fn inverted_distance_limits_do_not_panic() {
        let cfg = ViewerConfig::from_json(r#"{ "orbit": { "min_distance": 100.0 } }"#).unwrap();
        assert_eq!(cfg.orbit.distance_range(), (60.0, 100.0));

        let mut cam = camera();
        let mut controls = OrbitControls::new(&cfg.orbit);
        assert!(controls.update(&mut cam));
        assert_relative_eq!((cam.position - cam.target).norm(), 60.0, epsilon = 1e-3);
    }

    #[test]
    fn nan_distance_limit_is_ignored() {
        let cfg = OrbitConfig { max_distance: f32::NAN, ..OrbitConfig::default() };
        let mut cam = camera();
        OrbitControls::new(&cfg).update(&mut cam);
        assert!((cam.position - cam.target).norm().is_finite());
    }

    #[test]
    fn disposed_controls_ignore_input() {
        let mut cam = camera();
        let mut controls = OrbitControls::new(&OrbitConfig::default());
        controls.dispose();
        controls.rotate(300.0, 300.0, 600.0);
        controls.dolly(100.0);
        assert!(!controls.update(&mut cam));
        assert_relative_eq!(cam.position.z, 10.0, epsilon = 1e-5);
    }
}
