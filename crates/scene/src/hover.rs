use crate::picking::HotspotRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverChange {
    pub previous: Option<HotspotRef>,
    pub current: Option<HotspotRef>,
}

/// Enter/leave detection over successive hover resolutions.
///
/// Resolving to the same hotspot on consecutive moves produces no change.
#[derive(Debug, Clone, Default)]
pub struct HoverTracker {
    current: Option<HotspotRef>,
}

impl HoverTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&HotspotRef> {
        self.current.as_ref()
    }

    pub fn update(&mut self, resolved: Option<HotspotRef>) -> Option<HoverChange> {
        if resolved == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, resolved);
        Some(HoverChange {
            previous,
            current: self.current.clone(),
        })
    }

    /// Forget the hovered hotspot, reporting a leave if there was one.
    pub fn clear(&mut self) -> Option<HoverChange> {
        self.update(None)
    }
}
