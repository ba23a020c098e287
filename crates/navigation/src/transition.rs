use std::task::{Context, Poll};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use futures_util::task::noop_waker_ref;
use runtime::fade::Crossfade;
use scene::{SceneSlot, SlotPair};
use streaming::ResourceLoadError;
use tour::NodeId;
use tracing::{debug, info, warn};

/// Why a transition was started; decides what happens to history on commit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionKind {
    /// First node of the session.
    Start,
    Forward,
    Back,
    Home,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionState {
    Idle,
    Active {
        /// `None` only while the first node of the session fades in.
        from: Option<NodeId>,
        to: NodeId,
        progress: f64,
    },
}

impl TransitionState {
    pub fn is_active(&self) -> bool {
        matches!(self, TransitionState::Active { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Committed {
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
    },
    Failed {
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
        error: ResourceLoadError,
    },
}

pub type SlotFuture = BoxFuture<'static, Result<SceneSlot, ResourceLoadError>>;

enum Phase {
    Acquiring(SlotFuture),
    Fading(Crossfade),
}

struct Active {
    from: Option<NodeId>,
    to: NodeId,
    kind: TransitionKind,
    phase: Phase,
}

/// Single-flight crossfade between two scene slots.
///
/// Phases:
/// - `Acquiring`: the target slot is being built off-screen. A failure here
///   is the only abort path and leaves the front slot untouched.
/// - `Fading`: the built slot is staged and opacities follow elapsed time.
///   A fade always runs to completion.
///
/// The acquisition future is polled once per tick with a no-op waker; the
/// tick itself is the only wake-up source.
pub struct TransitionController {
    fade_duration_s: f64,
    active: Option<Active>,
}

impl TransitionController {
    pub fn new(fade_duration_s: f64) -> Self {
        Self {
            fade_duration_s,
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn state(&self) -> TransitionState {
        match &self.active {
            None => TransitionState::Idle,
            Some(a) => TransitionState::Active {
                from: a.from.clone(),
                to: a.to.clone(),
                progress: match &a.phase {
                    Phase::Acquiring(_) => 0.0,
                    Phase::Fading(fade) => fade.progress(),
                },
            },
        }
    }

    /// Returns `false`, changing nothing, if a transition is already in flight.
    pub fn begin(
        &mut self,
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
        acquisition: SlotFuture,
    ) -> bool {
        if self.active.is_some() {
            return false;
        }
        info!(from = ?from.as_ref().map(NodeId::as_str), to = %to, ?kind, "transition started");
        self.active = Some(Active {
            from,
            to,
            kind,
            phase: Phase::Acquiring(acquisition),
        });
        true
    }

    /// Advance by `dt_s`. Returns an outcome on the tick the transition ends.
    pub fn tick(&mut self, dt_s: f64, slots: &mut SlotPair) -> Option<TransitionOutcome> {
        let active = self.active.as_mut()?;

        match &mut active.phase {
            Phase::Acquiring(fut) => {
                let mut cx = Context::from_waker(noop_waker_ref());
                match fut.poll_unpin(&mut cx) {
                    Poll::Pending => None,
                    Poll::Ready(Ok(slot)) => {
                        debug!(to = %active.to, "target staged");
                        slots.stage(slot);
                        slots.set_progress(0.0);
                        active.phase = Phase::Fading(Crossfade::new(self.fade_duration_s));
                        None
                    }
                    Poll::Ready(Err(error)) => {
                        warn!(to = %active.to, %error, "transition aborted");
                        slots.discard_staged();
                        let a = self.active.take()?;
                        Some(TransitionOutcome::Failed {
                            from: a.from,
                            to: a.to,
                            kind: a.kind,
                            error,
                        })
                    }
                }
            }
            Phase::Fading(fade) => {
                let progress = fade.advance(dt_s);
                slots.set_progress(progress);
                if !fade.is_finished() {
                    return None;
                }
                slots.commit();
                let a = self.active.take()?;
                info!(to = %a.to, "transition committed");
                Some(TransitionOutcome::Committed {
                    from: a.from,
                    to: a.to,
                    kind: a.kind,
                })
            }
        }
    }
}

impl std::fmt::Debug for TransitionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionController")
            .field("fade_duration_s", &self.fade_duration_s)
            .field("state", &self.state())
            .finish()
    }
}
