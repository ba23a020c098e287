use streaming::ResourceHandle;
use tour::{ColorRegion, NodeId};

use crate::picking::HotspotRef;
use crate::projector::Placement;

/// A built hotspot surface.
#[derive(Debug, Clone)]
pub struct HotspotVisual {
    pub hotspot: HotspotRef,
    pub placement: Placement,
    pub icon: Option<ResourceHandle>,
}

#[derive(Debug, Clone)]
pub struct MaskLayer {
    pub image: ResourceHandle,
    pub regions: Vec<ColorRegion>,
    /// Tinted copy of `image`, drawn over the panorama when enabled.
    pub overlay: Option<ResourceHandle>,
}

/// Everything needed to draw and hit-test one node.
///
/// A slot is only built once every resource it references is ready, so a
/// visible slot never shows a partially loaded scene.
#[derive(Debug, Clone)]
pub struct SceneSlot {
    node: NodeId,
    panorama: ResourceHandle,
    hotspots: Vec<HotspotVisual>,
    mask: Option<MaskLayer>,
    opacity: f64,
}

impl SceneSlot {
    pub fn new(node: NodeId, panorama: ResourceHandle) -> Self {
        Self {
            node,
            panorama,
            hotspots: Vec::new(),
            mask: None,
            opacity: 0.0,
        }
    }

    pub fn push_hotspot(&mut self, visual: HotspotVisual) {
        self.hotspots.push(visual);
    }

    pub fn set_mask(&mut self, mask: MaskLayer) {
        self.mask = Some(mask);
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn panorama(&self) -> &ResourceHandle {
        &self.panorama
    }

    pub fn hotspots(&self) -> &[HotspotVisual] {
        &self.hotspots
    }

    pub fn mask(&self) -> Option<&MaskLayer> {
        self.mask.as_ref()
    }

    /// Opacity applied uniformly to the panorama and every hotspot.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }
}

/// Double-buffered scene slots.
///
/// `front` is what the user sees; `back` is prepared off-screen and only
/// becomes visible through [`SlotPair::set_progress`].
#[derive(Debug, Clone, Default)]
pub struct SlotPair {
    front: Option<SceneSlot>,
    back: Option<SceneSlot>,
}

impl SlotPair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `slot` immediately, replacing anything displayed or staged.
    pub fn show(&mut self, mut slot: SceneSlot) {
        slot.set_opacity(1.0);
        self.front = Some(slot);
        self.back = None;
    }

    /// Place a fully built slot in the invisible back buffer.
    pub fn stage(&mut self, mut slot: SceneSlot) {
        slot.set_opacity(0.0);
        self.back = Some(slot);
    }

    pub fn set_progress(&mut self, progress: f64) {
        let p = progress.clamp(0.0, 1.0);
        if let Some(front) = self.front.as_mut() {
            front.set_opacity(1.0 - p);
        }
        if let Some(back) = self.back.as_mut() {
            back.set_opacity(p);
        }
    }

    /// Promote the staged slot to front at exactly full opacity and return the
    /// outgoing slot. Without a staged slot nothing changes.
    pub fn commit(&mut self) -> Option<SceneSlot> {
        let mut incoming = self.back.take()?;
        incoming.set_opacity(1.0);
        let mut outgoing = self.front.replace(incoming);
        if let Some(out) = outgoing.as_mut() {
            out.set_opacity(0.0);
        }
        outgoing
    }

    /// Drop a staged slot and restore the front to full opacity.
    pub fn discard_staged(&mut self) -> Option<SceneSlot> {
        if let Some(front) = self.front.as_mut() {
            front.set_opacity(1.0);
        }
        self.back.take()
    }

    pub fn front(&self) -> Option<&SceneSlot> {
        self.front.as_ref()
    }

    pub fn staged(&self) -> Option<&SceneSlot> {
        self.back.as_ref()
    }

    /// Slots to draw, back to front: outgoing first, incoming on top.
    pub fn visible(&self) -> impl Iterator<Item = &SceneSlot> + '_ {
        self.front
            .iter()
            .chain(self.back.iter())
            .filter(|s| s.opacity > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{SceneSlot, SlotPair};
    use streaming::Image;
    use tour::NodeId;

    fn slot(id: &str) -> SceneSlot {
        SceneSlot::new(NodeId::from(id), Arc::new(Image::filled(2, 1, [1, 2, 3, 255])))
    }

    #[test]
    fn staged_slot_is_invisible_until_faded() {
        let mut pair = SlotPair::new();
        pair.show(slot("A"));
        pair.stage(slot("B"));
        assert_eq!(pair.staged().map(|s| s.opacity()), Some(0.0));
        assert_eq!(pair.visible().count(), 1);

        pair.set_progress(0.25);
        let opacities: Vec<f64> = pair.visible().map(|s| s.opacity()).collect();
        assert_eq!(opacities, vec![0.75, 0.25]);
    }

    #[test]
    fn commit_snaps_to_exact_opacities() {
        let mut pair = SlotPair::new();
        pair.show(slot("A"));
        pair.stage(slot("B"));
        pair.set_progress(0.999_999_7);

        let outgoing = pair.commit().expect("outgoing");
        assert_eq!(outgoing.node().as_str(), "A");
        assert_eq!(outgoing.opacity(), 0.0);
        let front = pair.front().expect("front");
        assert_eq!(front.node().as_str(), "B");
        assert_eq!(front.opacity(), 1.0);
        assert!(pair.staged().is_none());
    }

    #[test]
    fn discarding_restores_the_front() {
        let mut pair = SlotPair::new();
        pair.show(slot("A"));
        pair.stage(slot("B"));
        pair.set_progress(0.5);
        assert!(pair.discard_staged().is_some());
        assert_eq!(pair.front().map(|s| s.opacity()), Some(1.0));
        assert!(pair.commit().is_none());
        assert_eq!(pair.front().map(|s| s.node().as_str()), Some("A"));
    }
}
