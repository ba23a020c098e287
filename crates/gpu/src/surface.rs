use crate::renderer::RenderFrame;

/// Drawing backend the engine drives once per tick.
///
/// Picking does not go through the surface: the engine casts rays from its
/// own camera model, which matches the frame camera it submits here.
pub trait RenderSurface {
    fn resize(&mut self, width: u32, height: u32);
    fn submit(&mut self, frame: RenderFrame);
}

/// Headless surface that keeps what it was given.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    size: Option<(u32, u32)>,
    frames: Vec<RenderFrame>,
    keep: Option<usize>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the most recent `n` frames.
    pub fn bounded(n: usize) -> Self {
        Self {
            keep: Some(n.max(1)),
            ..Self::default()
        }
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn frames(&self) -> &[RenderFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.frames.last()
    }
}

impl RenderSurface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn submit(&mut self, frame: RenderFrame) {
        self.frames.push(frame);
        if let Some(keep) = self.keep
            && self.frames.len() > keep
        {
            let excess = self.frames.len() - keep;
            self.frames.drain(..excess);
        }
    }
}
