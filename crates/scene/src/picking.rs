use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Vec3, equirect_uv};
use tour::NodeId;

use crate::mask::{self, DEFAULT_COLOR_TOLERANCE};
use crate::slot::SceneSlot;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// What a pointer resolved to.
///
/// `key` identifies the region within its node: the hotspot id for
/// geometric hotspots, the `r,g,b` key for colour regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotRef {
    pub key: String,
    pub target: NodeId,
    pub label: Option<String>,
}

/// Resolves a pointer ray against the hotspots of one displayed node.
pub trait HitTester: Send + Sync {
    fn resolve(&self, ray: Ray, slot: &SceneSlot) -> Option<HotspotRef>;
}

/// Ray against planar hotspot surfaces.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - On equal distance, the hotspot declared first wins.
#[derive(Debug, Copy, Clone, Default)]
pub struct GeometricHitTester;

impl HitTester for GeometricHitTester {
    fn resolve(&self, ray: Ray, slot: &SceneSlot) -> Option<HotspotRef> {
        let dir = ray.dir.normalize()?;
        let ray = Ray::new(ray.origin, dir);

        let mut best: Option<(f64, usize)> = None;
        for (index, visual) in slot.hotspots().iter().enumerate() {
            let Some(t) = ray_quad_hit_t(ray, visual) else {
                continue;
            };
            best = match best {
                None => Some((t, index)),
                Some((bt, bi)) => {
                    let ord = stable_total_cmp_f64(t, bt).then_with(|| index.cmp(&bi));
                    if ord.is_lt() { Some((t, index)) } else { Some((bt, bi)) }
                }
            };
        }

        let (_, index) = best?;
        Some(slot.hotspots()[index].hotspot.clone())
    }
}

fn ray_quad_hit_t(ray: Ray, visual: &crate::slot::HotspotVisual) -> Option<f64> {
    let p = &visual.placement;
    let denom = ray.dir.dot(p.normal);
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = (p.position - ray.origin).dot(p.normal) / denom;
    if t <= 0.0 || !t.is_finite() {
        return None;
    }
    let (x, y) = p.local(ray.at(t));
    p.contains_local(x, y).then_some(t)
}

/// Ray against the panorama sphere, then a colour lookup in the node's mask.
#[derive(Debug, Copy, Clone)]
pub struct MaskHitTester {
    pub sphere_radius: f64,
    pub tolerance: u8,
}

impl Default for MaskHitTester {
    fn default() -> Self {
        Self {
            sphere_radius: 500.0,
            tolerance: DEFAULT_COLOR_TOLERANCE,
        }
    }
}

impl HitTester for MaskHitTester {
    fn resolve(&self, ray: Ray, slot: &SceneSlot) -> Option<HotspotRef> {
        let layer = slot.mask()?;
        let point = ray_sphere_exit(ray, self.sphere_radius)?;
        let uv = equirect_uv(point)?;
        let rgb = mask::sample(&layer.image, uv)?;
        let region = mask::classify(rgb, &layer.regions, self.tolerance)?;
        Some(HotspotRef {
            key: region.color_key.to_string(),
            target: region.target.clone(),
            label: Some(region.label.clone()),
        })
    }
}

/// Far intersection of a ray with an origin-centred sphere. From inside the
/// sphere this is the point the viewer sees.
fn ray_sphere_exit(ray: Ray, radius: f64) -> Option<Vec3> {
    let dir = ray.dir.normalize()?;
    let b = ray.origin.dot(dir);
    let c = ray.origin.dot(ray.origin) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b + disc.sqrt();
    if t <= 0.0 {
        return None;
    }
    Some(ray.origin + dir * t)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{GeometricHitTester, HitTester, HotspotRef, MaskHitTester, Ray};
    use crate::projector::project_coord;
    use crate::slot::{HotspotVisual, MaskLayer, SceneSlot};
    use foundation::math::{SphericalCoord, Vec3, equirect_uv};
    use streaming::Image;
    use tour::{ColorRegion, NodeId, Rgb, VisualExtent};

    fn hotspot(slot: &mut SceneSlot, key: &str, coord: SphericalCoord, size: f64) {
        slot.push_hotspot(HotspotVisual {
            hotspot: HotspotRef {
                key: key.to_string(),
                target: NodeId::from(key),
                label: None,
            },
            placement: project_coord(coord, VisualExtent::new(size, 0.0, 1.0)),
            icon: None,
        });
    }

    fn empty_slot() -> SceneSlot {
        SceneSlot::new(NodeId::from("A"), Arc::new(Image::filled(1, 1, [0, 0, 0, 255])))
    }

    fn ray_toward(coord: SphericalCoord) -> Ray {
        Ray::new(Vec3::ZERO, coord.to_cartesian())
    }

    #[test]
    fn ray_at_projected_centre_hits_that_hotspot() {
        let mut slot = empty_slot();
        let coords = [
            SphericalCoord::new(0.0, 0.0, 400.0),
            SphericalCoord::new(30.0, 120.0, 300.0),
            SphericalCoord::new(-45.0, -90.0, 450.0),
        ];
        for (i, c) in coords.iter().enumerate() {
            hotspot(&mut slot, &format!("h{i}"), *c, 20.0);
        }
        for (i, c) in coords.iter().enumerate() {
            let hit = GeometricHitTester.resolve(ray_toward(*c), &slot).expect("hit");
            assert_eq!(hit.key, format!("h{i}"));
        }
    }

    #[test]
    fn empty_sky_resolves_to_none() {
        let mut slot = empty_slot();
        hotspot(&mut slot, "h", SphericalCoord::new(0.0, 0.0, 400.0), 20.0);
        let sky = ray_toward(SphericalCoord::new(60.0, 90.0, 1.0));
        assert!(GeometricHitTester.resolve(sky, &slot).is_none());
        // Straight behind the hotspot: the plane is hit at t < 0.
        let behind = Ray::new(Vec3::ZERO, Vec3::new(-1.0, 0.0, 0.0));
        assert!(GeometricHitTester.resolve(behind, &slot).is_none());
    }

    #[test]
    fn nearest_surface_wins_then_declaration_order() {
        let mut slot = empty_slot();
        hotspot(&mut slot, "far", SphericalCoord::new(0.0, 0.0, 450.0), 40.0);
        hotspot(&mut slot, "near", SphericalCoord::new(0.0, 0.0, 200.0), 40.0);
        hotspot(&mut slot, "near-dup", SphericalCoord::new(0.0, 0.0, 200.0), 40.0);
        let hit = GeometricHitTester
            .resolve(ray_toward(SphericalCoord::new(0.0, 0.0, 1.0)), &slot)
            .expect("hit");
        assert_eq!(hit.key, "near");
    }

    fn mask_slot(pixel: [u8; 3], dir: Vec3) -> SceneSlot {
        let (w, h) = (64u32, 32u32);
        let mut image = Image::filled(w, h, [0, 0, 0, 255]);
        let uv = equirect_uv(dir).expect("uv");
        let (x, y) = crate::mask::pixel_for_uv(uv, w, h);
        image.set_rgba(x, y, [pixel[0], pixel[1], pixel[2], 255]);

        let mut slot = empty_slot();
        slot.set_mask(MaskLayer {
            image: Arc::new(image),
            regions: vec![ColorRegion {
                color_key: Rgb::new(235, 0, 212),
                target: NodeId::from("B"),
                label: "House 1".to_string(),
            }],
            overlay: None,
        });
        slot
    }

    #[test]
    fn mask_pixel_within_tolerance_resolves_region() {
        let dir = SphericalCoord::new(10.0, 40.0, 1.0).to_cartesian();
        let slot = mask_slot([237, 1, 210], dir);
        let hit = MaskHitTester::default()
            .resolve(Ray::new(Vec3::ZERO, dir), &slot)
            .expect("hit");
        assert_eq!(hit.target.as_str(), "B");
        assert_eq!(hit.key, "235,0,212");
        assert_eq!(hit.label.as_deref(), Some("House 1"));
    }

    #[test]
    fn mask_background_and_missing_mask_resolve_to_none() {
        let dir = SphericalCoord::new(10.0, 40.0, 1.0).to_cartesian();
        let slot = mask_slot([237, 1, 210], dir);
        let elsewhere = SphericalCoord::new(-30.0, -100.0, 1.0).to_cartesian();
        assert!(MaskHitTester::default()
            .resolve(Ray::new(Vec3::ZERO, elsewhere), &slot)
            .is_none());
        assert!(MaskHitTester::default()
            .resolve(Ray::new(Vec3::ZERO, dir), &empty_slot())
            .is_none());
    }
}
