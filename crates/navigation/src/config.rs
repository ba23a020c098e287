use std::fmt;
use std::fs;
use std::path::Path;

use gpu::RenderOptions;
use scene::{CameraLimits, CameraView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Engine tuning. Every field is optional in JSON and falls back to the
/// default below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Crossfade length, seconds.
    pub fade_duration_s: f64,
    /// Framing every node opens with.
    pub default_view: CameraView,
    pub min_fov_deg: f64,
    pub max_fov_deg: f64,
    pub look_sensitivity_deg_per_px: f64,
    pub lat_limit_deg: f64,
    pub panorama_radius: f64,
    /// Per-channel tolerance for mask colour keys.
    pub color_tolerance: u8,
    /// Pointer travel beyond which a press counts as a look gesture.
    pub click_drag_threshold_px: f64,
    /// Field-of-view change per wheel unit, degrees.
    pub zoom_step_deg: f64,
    pub zoom_smoothing: f64,
    pub mask_overlay: bool,
    pub viewport: Viewport,
    /// Most recent engine events kept for `events()`; older ones are dropped.
    pub event_log_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = CameraLimits::default();
        Self {
            fade_duration_s: 0.8,
            default_view: CameraView::default(),
            min_fov_deg: limits.min_fov_deg,
            max_fov_deg: limits.max_fov_deg,
            look_sensitivity_deg_per_px: limits.look_sensitivity_deg_per_px,
            lat_limit_deg: limits.lat_limit_deg,
            panorama_radius: 500.0,
            color_tolerance: scene::mask::DEFAULT_COLOR_TOLERANCE,
            click_drag_threshold_px: 4.0,
            zoom_step_deg: limits.zoom_step_deg,
            zoom_smoothing: limits.zoom_smoothing,
            mask_overlay: true,
            viewport: Viewport::default(),
            event_log_capacity: 256,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "engine config io error: {e}"),
            ConfigError::Parse(e) => write!(f, "engine config parse error: {e}"),
            ConfigError::Invalid(reason) => write!(f, "invalid engine config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let payload = fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(payload).map_err(ConfigError::Parse)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid(reason));
        if !self.fade_duration_s.is_finite() || self.fade_duration_s < 0.0 {
            return invalid(format!("fade_duration_s must be >= 0, got {}", self.fade_duration_s));
        }
        if !(self.min_fov_deg > 0.0 && self.min_fov_deg <= self.max_fov_deg && self.max_fov_deg < 180.0) {
            return invalid(format!(
                "fov range [{}, {}] must satisfy 0 < min <= max < 180",
                self.min_fov_deg, self.max_fov_deg
            ));
        }
        if !(0.0..90.0).contains(&self.lat_limit_deg) {
            return invalid(format!("lat_limit_deg must be in [0, 90), got {}", self.lat_limit_deg));
        }
        if !(self.panorama_radius.is_finite() && self.panorama_radius > 1.0) {
            return invalid(format!("panorama_radius must be > 1, got {}", self.panorama_radius));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return invalid("viewport must be non-empty".to_string());
        }
        if self.event_log_capacity == 0 {
            return invalid("event_log_capacity must be > 0".to_string());
        }
        Ok(())
    }

    pub fn camera_limits(&self) -> CameraLimits {
        CameraLimits {
            min_fov_deg: self.min_fov_deg,
            max_fov_deg: self.max_fov_deg,
            lat_limit_deg: self.lat_limit_deg,
            look_sensitivity_deg_per_px: self.look_sensitivity_deg_per_px,
            zoom_step_deg: self.zoom_step_deg,
            zoom_smoothing: self.zoom_smoothing,
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            panorama_radius: self.panorama_radius,
            mask_overlay: self.mask_overlay,
            ..RenderOptions::default()
        }
    }
}
