use std::borrow::Borrow;
use std::fmt;

use foundation::math::SphericalCoord;

/// Identity of a panorama node; unique across a tour.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Size and roll of a hotspot's planar surface.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisualExtent {
    pub size_units: f64,
    pub rotation_deg: f64,
    pub aspect_ratio: f64,
}

impl VisualExtent {
    pub fn new(size_units: f64, rotation_deg: f64, aspect_ratio: f64) -> Self {
        Self {
            size_units,
            rotation_deg,
            aspect_ratio,
        }
    }

    pub fn width(&self) -> f64 {
        self.size_units * self.aspect_ratio
    }

    pub fn height(&self) -> f64 {
        self.size_units
    }
}

/// A geometric hotspot: a small billboard on the viewer sphere.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub target: NodeId,
    pub position: SphericalCoord,
    pub visual: VisualExtent,
    /// Texture drawn on the hotspot surface.
    pub icon: Option<String>,
    pub label: Option<String>,
}

/// 8-bit RGB triple as read from a mask bitmap.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r(), self.g(), self.b())
    }
}

/// One entry of a mask node's colour table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRegion {
    pub color_key: Rgb,
    pub target: NodeId,
    pub label: String,
}

/// Mask bitmap plus its colour table, in authoring order.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSource {
    pub image: String,
    pub regions: Vec<ColorRegion>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthoringStyle {
    Geometric,
    Mask,
}

/// How a node declares its navigable regions.
///
/// The two styles resolve pointer input differently, so they stay separate
/// variants rather than one record shape.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotSource {
    Geometric(Vec<Hotspot>),
    Mask(MaskSource),
}

impl HotspotSource {
    /// Style this source commits its tour to; `None` for a node without
    /// any navigable region, which fits either style.
    pub fn style(&self) -> Option<AuthoringStyle> {
        match self {
            HotspotSource::Geometric(hotspots) if hotspots.is_empty() => None,
            HotspotSource::Geometric(_) => Some(AuthoringStyle::Geometric),
            HotspotSource::Mask(_) => Some(AuthoringStyle::Mask),
        }
    }

    pub fn edges(&self) -> Vec<Edge<'_>> {
        match self {
            HotspotSource::Geometric(hotspots) => hotspots
                .iter()
                .map(|h| Edge {
                    key: h.id.clone(),
                    target: &h.target,
                })
                .collect(),
            HotspotSource::Mask(mask) => mask
                .regions
                .iter()
                .map(|r| Edge {
                    key: r.color_key.to_string(),
                    target: &r.target,
                })
                .collect(),
        }
    }

    /// URLs of every resource besides the panorama itself.
    pub fn resource_urls(&self) -> Vec<&str> {
        match self {
            HotspotSource::Geometric(hotspots) => {
                hotspots.iter().filter_map(|h| h.icon.as_deref()).collect()
            }
            HotspotSource::Mask(mask) => vec![mask.image.as_str()],
        }
    }
}

/// Outgoing, directed edge of the navigation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<'a> {
    /// Hotspot id, or the `r,g,b` key of a colour region.
    pub key: String,
    pub target: &'a NodeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanoramaNode {
    pub id: NodeId,
    pub image: String,
    pub hotspots: HotspotSource,
}

impl PanoramaNode {
    pub fn resource_urls(&self) -> Vec<&str> {
        let mut urls = vec![self.image.as_str()];
        urls.extend(self.hotspots.resource_urls());
        urls
    }
}
