use super::{Vec2, Vec3};

/// A point on a viewer-centred sphere, in degrees.
///
/// Conventions shared by the projector, the camera and mask sampling:
/// - `phi = 90° - latitude` is the polar angle from +Y (the zenith).
/// - `theta = longitude` is measured from +X towards +Z.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalCoord {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub radius: f64,
}

impl SphericalCoord {
    pub fn new(lat_deg: f64, lon_deg: f64, radius: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            radius,
        }
    }

    pub fn to_cartesian(self) -> Vec3 {
        spherical_to_cartesian(self.lat_deg, self.lon_deg, self.radius)
    }
}

/// `radius * (sin(phi)cos(theta), cos(phi), sin(phi)sin(theta))`.
pub fn spherical_to_cartesian(lat_deg: f64, lon_deg: f64, radius: f64) -> Vec3 {
    let phi = (90.0 - lat_deg).to_radians();
    let theta = lon_deg.to_radians();
    let sin_phi = phi.sin();
    Vec3::new(
        radius * sin_phi * theta.cos(),
        radius * phi.cos(),
        radius * sin_phi * theta.sin(),
    )
}

/// Texture coordinate of a direction on an inside-out equirectangular sphere.
///
/// `u` wraps longitude onto `[0, 1)`; `v` is 1 at the zenith and 0 at the nadir,
/// so image rows are addressed with `(1 - v) * height`.
pub fn equirect_uv(dir: Vec3) -> Option<Vec2> {
    let dir = dir.normalize()?;
    let mut u = dir.z.atan2(dir.x) / std::f64::consts::TAU;
    if u < 0.0 {
        u += 1.0;
    }
    if u >= 1.0 {
        u = 0.0;
    }
    let v = 1.0 - dir.y.clamp(-1.0, 1.0).acos() / std::f64::consts::PI;
    Some(Vec2::new(u, v))
}
