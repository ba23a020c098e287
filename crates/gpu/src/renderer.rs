use scene::{CameraView, PanoramaCamera, Placement, SceneSlot, SlotPair};
use streaming::ResourceHandle;

/// Camera state handed to the surface each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameCamera {
    pub view: CameraView,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl FrameCamera {
    pub const NEAR: f64 = 1.0;
    pub const FAR: f64 = 1100.0;

    pub fn from_camera(camera: &PanoramaCamera) -> Self {
        Self {
            view: camera.view(),
            aspect: camera.aspect(),
            near: Self::NEAR,
            far: Self::FAR,
        }
    }
}

#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Inside-out textured sphere centred on the viewer.
    Sphere {
        texture: ResourceHandle,
        radius: f64,
        opacity: f64,
    },
    /// Planar hotspot surface; untextured surfaces draw as a flat marker.
    Quad {
        placement: Placement,
        texture: Option<ResourceHandle>,
        opacity: f64,
    },
}

impl RenderCommand {
    pub fn opacity(&self) -> f64 {
        match self {
            RenderCommand::Sphere { opacity, .. } | RenderCommand::Quad { opacity, .. } => *opacity,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderOptions {
    pub panorama_radius: f64,
    pub mask_overlay: bool,
    /// Overlay opacity relative to its slot.
    pub overlay_opacity: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            panorama_radius: 500.0,
            mask_overlay: true,
            overlay_opacity: 0.8,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderFrame {
    pub camera: FrameCamera,
    pub commands: Vec<RenderCommand>,
}

pub struct Renderer;

impl Renderer {
    /// Draw list for the visible slots, outgoing slot first.
    pub fn collect(camera: &PanoramaCamera, slots: &SlotPair, opts: RenderOptions) -> RenderFrame {
        let mut frame = RenderFrame {
            camera: FrameCamera::from_camera(camera),
            commands: Vec::new(),
        };
        for slot in slots.visible() {
            Self::collect_slot(slot, opts, &mut frame.commands);
        }
        frame
    }

    fn collect_slot(slot: &SceneSlot, opts: RenderOptions, out: &mut Vec<RenderCommand>) {
        let opacity = slot.opacity();
        out.push(RenderCommand::Sphere {
            texture: slot.panorama().clone(),
            radius: opts.panorama_radius,
            opacity,
        });

        if opts.mask_overlay
            && let Some(overlay) = slot.mask().and_then(|m| m.overlay.as_ref())
        {
            // Just inside the panorama so it never z-fights with it.
            out.push(RenderCommand::Sphere {
                texture: overlay.clone(),
                radius: opts.panorama_radius - 0.5,
                opacity: opacity * opts.overlay_opacity,
            });
        }

        for visual in slot.hotspots() {
            out.push(RenderCommand::Quad {
                placement: visual.placement,
                texture: visual.icon.clone(),
                opacity,
            });
        }
    }
}
