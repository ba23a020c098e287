/// Time-based crossfade progress.
///
/// Progress is `elapsed / duration` clamped to `[0, 1]`; it depends only on
/// accumulated time, never on how many frames delivered it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Crossfade {
    duration_s: f64,
    elapsed_s: f64,
}

impl Crossfade {
    pub fn new(duration_s: f64) -> Self {
        let duration_s = if duration_s.is_finite() {
            duration_s.max(0.0)
        } else {
            0.0
        };
        Self {
            duration_s,
            elapsed_s: 0.0,
        }
    }

    /// Advance by `dt_s` and return the new progress.
    pub fn advance(&mut self, dt_s: f64) -> f64 {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.elapsed_s += dt_s;
        }
        self.progress()
    }

    pub fn progress(&self) -> f64 {
        if self.duration_s <= 0.0 {
            return 1.0;
        }
        (self.elapsed_s / self.duration_s).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}
