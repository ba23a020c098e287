use foundation::math::Vec2;

/// Raw pointer and window events, in viewport pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    /// Wheel delta in the host's units; positive zooms out.
    Wheel { delta_y: f64 },
    Resize { width: u32, height: u32 },
}

/// What an input event asks the engine to do.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Intent {
    LookStart(Vec2),
    Look(Vec2),
    LookEnd,
    Hover(Vec2),
    Click(Vec2),
    Zoom(f64),
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Press {
    origin: Vec2,
    travel: f64,
}

/// Turns raw events into intents. Knows nothing about transitions; the
/// engine decides what an intent may do at any moment.
///
/// Notes:
/// - Hover intents are produced only while no button is held.
/// - A click whose press travelled further than the drag threshold was a
///   look gesture and yields no intent.
#[derive(Debug, Clone)]
pub struct InputDispatcher {
    drag_threshold_px: f64,
    press: Option<Press>,
    last_travel: f64,
}

impl InputDispatcher {
    pub fn new(drag_threshold_px: f64) -> Self {
        Self {
            drag_threshold_px: drag_threshold_px.max(0.0),
            press: None,
            last_travel: 0.0,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    pub fn dispatch(&mut self, event: InputEvent) -> Option<Intent> {
        match event {
            InputEvent::PointerDown { x, y } => {
                let p = Vec2::new(x, y);
                self.press = Some(Press {
                    origin: p,
                    travel: 0.0,
                });
                Some(Intent::LookStart(p))
            }
            InputEvent::PointerMove { x, y } => {
                let p = Vec2::new(x, y);
                match self.press.as_mut() {
                    Some(press) => {
                        press.travel = press.travel.max((p - press.origin).length());
                        Some(Intent::Look(p))
                    }
                    None => Some(Intent::Hover(p)),
                }
            }
            InputEvent::PointerUp { x, y } => {
                let press = self.press.take()?;
                let travel = press.travel.max((Vec2::new(x, y) - press.origin).length());
                self.last_travel = travel;
                Some(Intent::LookEnd)
            }
            InputEvent::Click { x, y } => {
                let travel = std::mem::take(&mut self.last_travel);
                if travel > self.drag_threshold_px {
                    return None;
                }
                Some(Intent::Click(Vec2::new(x, y)))
            }
            InputEvent::Wheel { delta_y } => delta_y.is_finite().then_some(Intent::Zoom(delta_y)),
            InputEvent::Resize { width, height } => Some(Intent::Resize { width, height }),
        }
    }
}
