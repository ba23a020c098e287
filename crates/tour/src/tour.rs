use std::fs;
use std::path::Path;

use foundation::math::SphericalCoord;

use crate::definition::{HotspotRecord, NodeRecord, TourDefinition};
use crate::error::{ConfigurationError, TourError};
use crate::graph::NavigationGraph;
use crate::model::{
    AuthoringStyle, ColorRegion, Hotspot, HotspotSource, MaskSource, NodeId, PanoramaNode, Rgb,
    VisualExtent,
};

/// A validated tour: read-only input for a navigation session.
#[derive(Debug, Clone)]
pub struct Tour {
    name: Option<String>,
    initial: NodeId,
    style: AuthoringStyle,
    graph: NavigationGraph,
}

impl Tour {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TourError> {
        let payload = fs::read_to_string(path.as_ref()).map_err(TourError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, TourError> {
        let def: TourDefinition = serde_json::from_str(payload).map_err(TourError::Parse)?;
        Self::from_definition(def)
    }

    /// Validate authored records. Every failure here is fatal at load time.
    pub fn from_definition(def: TourDefinition) -> Result<Self, TourError> {
        if def.nodes.is_empty() {
            return Err(ConfigurationError::tour("tour has no nodes").into());
        }

        let mut style: Option<(AuthoringStyle, String)> = None;
        let mut nodes = Vec::with_capacity(def.nodes.len());
        for record in def.nodes {
            let node = convert_node(record)?;
            if let Some(node_style) = node.hotspots.style() {
                if let Some((s, first)) = &style
                    && *s != node_style
                {
                    return Err(ConfigurationError::node(
                        node.id.as_str(),
                        format!("mixes {node_style:?} hotspots into a {s:?} tour (first set by {first:?})"),
                    )
                    .into());
                }
                if style.is_none() {
                    style = Some((node_style, node.id.to_string()));
                }
            }
            nodes.push(node);
        }

        let initial = match def.initial {
            Some(id) => NodeId::from(id),
            None => nodes[0].id.clone(),
        };

        let graph = NavigationGraph::new(nodes)?;
        if !graph.contains(initial.as_str()) {
            return Err(ConfigurationError::tour(format!(
                "initial node {:?} is not part of the tour",
                initial.as_str()
            ))
            .into());
        }

        Ok(Self {
            name: def.name,
            initial,
            style: style.map(|(s, _)| s).unwrap_or(AuthoringStyle::Geometric),
            graph,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn initial(&self) -> &NodeId {
        &self.initial
    }

    pub fn style(&self) -> AuthoringStyle {
        self.style
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    /// Every resource URL in the tour, deduplicated, in authoring order.
    pub fn resource_urls(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for node in self.graph.iter() {
            for url in node.resource_urls() {
                if !out.iter().any(|u| u == url) {
                    out.push(url.to_string());
                }
            }
        }
        out
    }
}

fn convert_node(record: NodeRecord) -> Result<PanoramaNode, ConfigurationError> {
    let id = record.id;
    if id.is_empty() {
        return Err(ConfigurationError::tour("node id must not be empty"));
    }
    if record.image.is_empty() {
        return Err(ConfigurationError::node(&id, "panorama image must not be empty"));
    }

    let hotspots = match record.mask {
        Some(_) if !record.hotspots.is_empty() => {
            return Err(ConfigurationError::node(
                &id,
                "declares both geometric hotspots and a mask",
            ));
        }
        Some(mask) => {
            if mask.image.is_empty() {
                return Err(ConfigurationError::node(&id, "mask image must not be empty"));
            }
            HotspotSource::Mask(MaskSource {
                image: mask.image,
                regions: mask
                    .regions
                    .into_iter()
                    .map(|r| ColorRegion {
                        color_key: Rgb(r.color),
                        target: NodeId::from(r.target),
                        label: r.label,
                    })
                    .collect(),
            })
        }
        None => {
            let mut out: Vec<Hotspot> = Vec::with_capacity(record.hotspots.len());
            for h in record.hotspots {
                if out.iter().any(|o| o.id == h.id) {
                    return Err(ConfigurationError::node(
                        &id,
                        format!("duplicate hotspot id {:?}", h.id),
                    ));
                }
                out.push(convert_hotspot(&id, h)?);
            }
            HotspotSource::Geometric(out)
        }
    };

    Ok(PanoramaNode {
        id: NodeId::from(id),
        image: record.image,
        hotspots,
    })
}

fn convert_hotspot(node_id: &str, h: HotspotRecord) -> Result<Hotspot, ConfigurationError> {
    let fail = |reason: String| ConfigurationError::node(node_id, format!("hotspot {:?}: {reason}", h.id));

    let p = h.position;
    let v = h.visual;
    let numbers = [
        p.lat_deg,
        p.lon_deg,
        p.radius,
        v.size,
        v.rotation_deg,
        v.aspect_ratio,
    ];
    if numbers.iter().any(|n| !n.is_finite()) {
        return Err(fail("non-finite number".to_string()));
    }
    if !(-90.0..=90.0).contains(&p.lat_deg) {
        return Err(fail(format!("latitude {} outside [-90, 90]", p.lat_deg)));
    }
    if !(-180.0..=180.0).contains(&p.lon_deg) {
        return Err(fail(format!("longitude {} outside [-180, 180]", p.lon_deg)));
    }
    if p.radius <= 0.0 {
        return Err(fail(format!("radius must be > 0, got {}", p.radius)));
    }
    if v.size <= 0.0 {
        return Err(fail(format!("size must be > 0, got {}", v.size)));
    }
    if v.aspect_ratio <= 0.0 {
        return Err(fail(format!("aspect ratio must be > 0, got {}", v.aspect_ratio)));
    }

    Ok(Hotspot {
        id: h.id,
        target: NodeId::from(h.target),
        position: SphericalCoord::new(p.lat_deg, p.lon_deg, p.radius),
        visual: VisualExtent::new(v.size, v.rotation_deg, v.aspect_ratio),
        icon: h.icon,
        label: h.label,
    })
}
