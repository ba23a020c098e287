use foundation::time::Time;

/// Per-tick frame metadata.
///
/// The host drives the engine with whatever delta its display loop produced;
/// animations read `dt_s` so they stay invariant to frame rate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time of this frame (seconds).
    pub dt_s: f64,
    /// Engine time at the end of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn first() -> Self {
        Self {
            index: 0,
            dt_s: 0.0,
            time: Time(0.0),
        }
    }

    /// Advance by `dt_s`. Negative or non-finite deltas count as zero.
    pub fn next(self, dt_s: f64) -> Self {
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        Self {
            index: self.index + 1,
            dt_s,
            time: self.time.advanced(dt_s),
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::first()
    }
}
