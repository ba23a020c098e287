use std::fmt;

/// A node id that does not exist in the graph.
///
/// Only a malformed tour definition can produce this; validation runs before
/// the first frame so user input never reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeError {
    pub node_id: String,
    /// Node whose hotspot or region referenced the missing id, if any.
    pub referenced_by: Option<String>,
}

impl UnknownNodeError {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            referenced_by: None,
        }
    }
}

impl fmt::Display for UnknownNodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.referenced_by {
            Some(from) => write!(f, "unknown node {:?} (referenced by {from:?})", self.node_id),
            None => write!(f, "unknown node {:?}", self.node_id),
        }
    }
}

impl std::error::Error for UnknownNodeError {}

/// Authored data that is structurally valid JSON but semantically unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationError {
    pub node_id: Option<String>,
    pub reason: String,
}

impl ConfigurationError {
    pub fn tour(reason: impl Into<String>) -> Self {
        Self {
            node_id: None,
            reason: reason.into(),
        }
    }

    pub fn node(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            node_id: Some(node_id.into()),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node_id {
            Some(id) => write!(f, "invalid node {id:?}: {}", self.reason),
            None => write!(f, "invalid tour: {}", self.reason),
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[derive(Debug)]
pub enum TourError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    UnknownNode(UnknownNodeError),
    Configuration(ConfigurationError),
}

impl fmt::Display for TourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourError::Io(err) => write!(f, "I/O error: {err}"),
            TourError::Parse(err) => write!(f, "tour parse error: {err}"),
            TourError::UnknownNode(err) => write!(f, "{err}"),
            TourError::Configuration(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for TourError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TourError::Io(err) => Some(err),
            TourError::Parse(err) => Some(err),
            TourError::UnknownNode(err) => Some(err),
            TourError::Configuration(err) => Some(err),
        }
    }
}

impl From<UnknownNodeError> for TourError {
    fn from(err: UnknownNodeError) -> Self {
        TourError::UnknownNode(err)
    }
}

impl From<ConfigurationError> for TourError {
    fn from(err: ConfigurationError) -> Self {
        TourError::Configuration(err)
    }
}
