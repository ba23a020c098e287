use foundation::math::{Vec2, Vec3, spherical_to_cartesian};
use serde::{Deserialize, Serialize};

use crate::picking::Ray;

/// Look direction plus vertical field of view, in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub fov_deg: f64,
}

impl Default for CameraView {
    fn default() -> Self {
        Self {
            lon_deg: 0.0,
            lat_deg: 0.0,
            fov_deg: 75.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraLimits {
    pub min_fov_deg: f64,
    pub max_fov_deg: f64,
    pub lat_limit_deg: f64,
    pub look_sensitivity_deg_per_px: f64,
    pub zoom_step_deg: f64,
    /// Exponential approach rate of `fov_deg` toward the zoom target, per second.
    pub zoom_smoothing: f64,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_fov_deg: 30.0,
            max_fov_deg: 90.0,
            lat_limit_deg: 85.0,
            look_sensitivity_deg_per_px: 0.1,
            zoom_step_deg: 0.05,
            zoom_smoothing: 8.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Drag {
    start_px: Vec2,
    start_lon_deg: f64,
    start_lat_deg: f64,
}

/// Camera at the sphere centre, driven by drag-to-look and wheel zoom.
#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaCamera {
    view: CameraView,
    target_fov_deg: f64,
    limits: CameraLimits,
    viewport: (u32, u32),
    interaction_enabled: bool,
    drag: Option<Drag>,
}

impl PanoramaCamera {
    pub fn new(view: CameraView, limits: CameraLimits, width: u32, height: u32) -> Self {
        let mut cam = Self {
            view,
            target_fov_deg: view.fov_deg,
            limits,
            viewport: (width.max(1), height.max(1)),
            interaction_enabled: true,
            drag: None,
        };
        cam.reset(view);
        cam
    }

    pub fn view(&self) -> CameraView {
        self.view
    }

    pub fn target_fov_deg(&self) -> f64 {
        self.target_fov_deg
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn aspect(&self) -> f64 {
        self.viewport.0 as f64 / self.viewport.1 as f64
    }

    pub fn interaction_enabled(&self) -> bool {
        self.interaction_enabled
    }

    /// Disabling interaction also ends any drag in progress.
    pub fn set_interaction_enabled(&mut self, enabled: bool) {
        self.interaction_enabled = enabled;
        if !enabled {
            self.drag = None;
        }
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    /// Snap to `view` with no easing.
    pub fn reset(&mut self, view: CameraView) {
        let fov = view
            .fov_deg
            .clamp(self.limits.min_fov_deg, self.limits.max_fov_deg);
        self.view = CameraView {
            lon_deg: view.lon_deg,
            lat_deg: self.clamp_lat(view.lat_deg),
            fov_deg: fov,
        };
        self.target_fov_deg = fov;
        self.drag = None;
    }

    pub fn begin_drag(&mut self, px: Vec2) {
        if !self.interaction_enabled {
            return;
        }
        self.drag = Some(Drag {
            start_px: px,
            start_lon_deg: self.view.lon_deg,
            start_lat_deg: self.view.lat_deg,
        });
    }

    pub fn drag_to(&mut self, px: Vec2) {
        let Some(drag) = self.drag else {
            return;
        };
        if !self.interaction_enabled {
            return;
        }
        let s = self.limits.look_sensitivity_deg_per_px;
        self.view.lon_deg = drag.start_lon_deg + (drag.start_px.x - px.x) * s;
        self.view.lat_deg = self.clamp_lat(drag.start_lat_deg + (px.y - drag.start_px.y) * s);
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Wheel zoom; positive `delta` widens the view.
    pub fn zoom(&mut self, delta: f64) {
        if !self.interaction_enabled || !delta.is_finite() {
            return;
        }
        self.target_fov_deg = (self.target_fov_deg + delta * self.limits.zoom_step_deg)
            .clamp(self.limits.min_fov_deg, self.limits.max_fov_deg);
    }

    /// Ease the field of view toward the zoom target.
    pub fn update(&mut self, dt_s: f64) {
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return;
        }
        let diff = self.target_fov_deg - self.view.fov_deg;
        if diff.abs() < 1e-6 {
            self.view.fov_deg = self.target_fov_deg;
            return;
        }
        let k = 1.0 - (-self.limits.zoom_smoothing.max(0.0) * dt_s).exp();
        self.view.fov_deg += diff * k;
    }

    pub fn forward(&self) -> Vec3 {
        spherical_to_cartesian(self.view.lat_deg, self.view.lon_deg, 1.0)
    }

    /// `(right, up, forward)`, orthonormal.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.forward();
        let right = forward
            .cross(Vec3::Y)
            .normalize()
            .unwrap_or(Vec3::Z);
        let up = right.cross(forward);
        (right, up, forward)
    }

    pub fn ndc_from_px(&self, px: Vec2) -> Vec2 {
        let (w, h) = self.viewport;
        Vec2::new(px.x / w as f64 * 2.0 - 1.0, 1.0 - px.y / h as f64 * 2.0)
    }

    pub fn px_from_ndc(&self, ndc: Vec2) -> Vec2 {
        let (w, h) = self.viewport;
        Vec2::new((ndc.x + 1.0) * 0.5 * w as f64, (1.0 - ndc.y) * 0.5 * h as f64)
    }

    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let (right, up, forward) = self.basis();
        let tan = (self.view.fov_deg.to_radians() * 0.5).tan();
        let dir = forward + right * (ndc.x * tan * self.aspect()) + up * (ndc.y * tan);
        Ray::new(Vec3::ZERO, dir.normalize().unwrap_or(forward))
    }

    pub fn ray_from_px(&self, px: Vec2) -> Ray {
        self.ray_from_ndc(self.ndc_from_px(px))
    }

    /// Pixel position of a world point, or `None` when it is behind the camera.
    pub fn screen_from_world(&self, p: Vec3) -> Option<Vec2> {
        let (right, up, forward) = self.basis();
        let z = p.dot(forward);
        if z <= 1e-9 {
            return None;
        }
        let tan = (self.view.fov_deg.to_radians() * 0.5).tan();
        let ndc = Vec2::new(p.dot(right) / (z * tan * self.aspect()), p.dot(up) / (z * tan));
        Some(self.px_from_ndc(ndc))
    }

    fn clamp_lat(&self, lat: f64) -> f64 {
        let limit = self.limits.lat_limit_deg.abs();
        lat.clamp(-limit, limit)
    }
}
