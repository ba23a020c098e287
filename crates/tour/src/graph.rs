use std::collections::BTreeMap;

use crate::error::{ConfigurationError, TourError, UnknownNodeError};
use crate::model::{Edge, NodeId, PanoramaNode};

/// Panorama nodes plus their outgoing hotspot edges.
///
/// Nodes carry no back-references, so cycles (A -> B -> A) are ordinary.
/// Construction guarantees every edge target resolves.
#[derive(Debug, Clone)]
pub struct NavigationGraph {
    nodes: Vec<PanoramaNode>,
    index: BTreeMap<NodeId, usize>,
}

impl NavigationGraph {
    pub fn new(nodes: Vec<PanoramaNode>) -> Result<Self, TourError> {
        let mut index = BTreeMap::new();
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(ConfigurationError::node(node.id.as_str(), "duplicate node id").into());
            }
        }

        for node in &nodes {
            for edge in node.hotspots.edges() {
                if !index.contains_key(edge.target) {
                    return Err(UnknownNodeError {
                        node_id: edge.target.to_string(),
                        referenced_by: Some(node.id.to_string()),
                    }
                    .into());
                }
            }
        }

        Ok(Self { nodes, index })
    }

    pub fn get(&self, id: &str) -> Result<&PanoramaNode, UnknownNodeError> {
        self.index
            .get(id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| UnknownNodeError::new(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Outgoing edges of `id` in authoring order.
    pub fn outgoing(&self, id: &str) -> Result<Vec<Edge<'_>>, UnknownNodeError> {
        Ok(self.get(id)?.hotspots.edges())
    }

    /// Nodes in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = &PanoramaNode> + '_ {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
