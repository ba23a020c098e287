use crate::frame::Frame;

/// An event stamped with the frame it was emitted in.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub frame_index: u64,
    pub payload: E,
}

/// Per-session event log.
///
/// Consumers either inspect `events()` or `drain()` once per frame. A bounded
/// bus drops its oldest events once `max_len` is exceeded.
#[derive(Debug)]
pub struct EventBus<E> {
    events: Vec<Event<E>>,
    max_len: Option<usize>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            max_len: None,
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len),
            ..Self::default()
        }
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub fn emit(&mut self, frame: Frame, payload: E) {
        self.events.push(Event {
            frame_index: frame.index,
            payload,
        });
        if let Some(max_len) = self.max_len {
            let excess = self.events.len().saturating_sub(max_len);
            if excess > 0 {
                self.events.drain(..excess);
            }
        }
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::frame::Frame;

    #[test]
    fn records_events_with_frame_index() {
        let mut bus = EventBus::new();
        let f = Frame::first().next(0.1).next(0.1);
        bus.emit(f, "hello");
        assert_eq!(bus.events().len(), 1);
        assert_eq!(bus.events()[0].frame_index, 2);
        assert_eq!(bus.events()[0].payload, "hello");
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit(Frame::first(), 7u32);
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
    }

    #[test]
    fn bounded_bus_keeps_newest_events() {
        let mut bus = EventBus::bounded(3);
        assert_eq!(bus.max_len(), Some(3));
        let mut frame = Frame::first();
        for i in 0..10u32 {
            bus.emit(frame, i);
            frame = frame.next(0.1);
        }
        let kept: Vec<u32> = bus.events().iter().map(|e| e.payload).collect();
        assert_eq!(kept, vec![7, 8, 9]);
        assert_eq!(bus.events()[0].frame_index, 7);
    }

    #[test]
    fn unbounded_bus_keeps_everything() {
        let mut bus = EventBus::new();
        assert_eq!(bus.max_len(), None);
        for i in 0..100u32 {
            bus.emit(Frame::first(), i);
        }
        assert_eq!(bus.events().len(), 100);
    }
}
