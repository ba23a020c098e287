use foundation::math::{Quat, SphericalCoord, Vec3};
use tour::{Hotspot, VisualExtent};

/// World-space placement of a hotspot surface.
///
/// The basis is orthonormal: `normal` points from the surface toward the
/// sphere centre, `right` and `up` span the surface after the authored roll.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub normal: Vec3,
    pub orientation: Quat,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Surface-local `(x, y)` of a world point lying on the surface plane.
    pub fn local(&self, p: Vec3) -> (f64, f64) {
        let d = p - self.position;
        (d.dot(self.right), d.dot(self.up))
    }

    pub fn contains_local(&self, x: f64, y: f64) -> bool {
        x.abs() <= self.width * 0.5 && y.abs() <= self.height * 0.5
    }
}

pub fn project(hotspot: &Hotspot) -> Placement {
    project_coord(hotspot.position, hotspot.visual)
}

/// Place a surface at `coord`, facing the origin, rolled by
/// `visual.rotation_deg` about its facing axis.
pub fn project_coord(coord: SphericalCoord, visual: VisualExtent) -> Placement {
    let position = coord.to_cartesian();
    let normal = (-position).normalize().unwrap_or(Vec3::new(-1.0, 0.0, 0.0));

    // At the poles the normal is parallel to +Y; fall back to +Z as the
    // reference so the basis stays defined.
    let base_right = Vec3::Y
        .cross(normal)
        .normalize()
        .or_else(|| Vec3::Z.cross(normal).normalize())
        .unwrap_or(Vec3::new(1.0, 0.0, 0.0));
    let base_up = normal.cross(base_right);

    let roll = visual.rotation_deg.to_radians();
    let (sin, cos) = roll.sin_cos();
    let right = base_right * cos + base_up * sin;
    let up = base_up * cos - base_right * sin;

    Placement {
        position,
        right,
        up,
        normal,
        orientation: Quat::from_basis(right, up, normal),
        width: visual.width(),
        height: visual.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::project_coord;
    use foundation::math::{SphericalCoord, Vec3};
    use tour::VisualExtent;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        assert_close(a.x, b.x, eps);
        assert_close(a.y, b.y, eps);
        assert_close(a.z, b.z, eps);
    }

    #[test]
    fn position_lies_on_the_sphere() {
        let visual = VisualExtent::new(30.0, 15.0, 1.0);
        for lat in [-90.0, -60.0, -12.5, 0.0, 33.0, 89.0, 90.0] {
            for lon in [-180.0, -97.0, 0.0, 45.0, 180.0] {
                for radius in [1.0, 250.0, 499.0] {
                    let p = project_coord(SphericalCoord::new(lat, lon, radius), visual);
                    assert_close(p.position.length(), radius, 1e-9 * radius);
                }
            }
        }
    }

    #[test]
    fn surface_faces_the_origin() {
        let p = project_coord(
            SphericalCoord::new(20.0, 70.0, 400.0),
            VisualExtent::new(10.0, 0.0, 1.0),
        );
        let to_origin = (-p.position).normalize().expect("dir");
        assert_vec_close(p.normal, to_origin, 1e-12);
        // The quaternion maps local +Z onto the facing normal.
        assert_vec_close(p.orientation.rotate(Vec3::Z), p.normal, 1e-9);
    }

    #[test]
    fn basis_is_orthonormal_at_the_poles() {
        for lat in [90.0, -90.0] {
            let p = project_coord(
                SphericalCoord::new(lat, 0.0, 100.0),
                VisualExtent::new(10.0, 30.0, 2.0),
            );
            assert_close(p.right.length(), 1.0, 1e-12);
            assert_close(p.up.length(), 1.0, 1e-12);
            assert_close(p.right.dot(p.up), 0.0, 1e-12);
            assert_close(p.right.dot(p.normal), 0.0, 1e-12);
        }
    }

    #[test]
    fn roll_rotates_the_surface_about_its_normal() {
        let coord = SphericalCoord::new(0.0, 0.0, 400.0);
        let flat = project_coord(coord, VisualExtent::new(10.0, 0.0, 1.0));
        let rolled = project_coord(coord, VisualExtent::new(10.0, 90.0, 1.0));
        assert_vec_close(rolled.right, flat.up, 1e-12);
        assert_vec_close(rolled.up, -flat.right, 1e-12);
        assert_vec_close(rolled.normal, flat.normal, 1e-12);
    }

    #[test]
    fn extent_follows_size_and_aspect() {
        let p = project_coord(
            SphericalCoord::new(0.0, 0.0, 400.0),
            VisualExtent::new(20.0, 0.0, 1.5),
        );
        assert_eq!(p.width, 30.0);
        assert_eq!(p.height, 20.0);
        assert!(p.contains_local(15.0, -10.0));
        assert!(!p.contains_local(15.1, 0.0));
    }
}
