use foundation::math::Vec2;
use futures_util::future::BoxFuture;
use gpu::{RenderSurface, Renderer};
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use scene::{
    GeometricHitTester, HitTester, HotspotRef, HoverChange, HoverTracker, MaskHitTester,
    PanoramaCamera, SlotPair,
};
use streaming::{PreloadReport, ResourceCache, ResourceLoadError};
use tour::{AuthoringStyle, NodeId, PanoramaNode, Tour, UnknownNodeError};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::history::HistoryStack;
use crate::input::{InputDispatcher, InputEvent, Intent};
use crate::staging::{StagingOptions, acquire_slot};
use crate::transition::{TransitionController, TransitionKind, TransitionOutcome, TransitionState};

/// Observable engine events, stamped with the frame they happened in.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    HoverChanged(HoverChange),
    TransitionStarted {
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
    },
    TransitionCommitted {
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
    },
    TransitionFailed {
        from: Option<NodeId>,
        to: NodeId,
        kind: TransitionKind,
        error: ResourceLoadError,
    },
    /// A navigation request arrived while another transition was in flight.
    TransitionIgnored { requested: NodeId },
}

impl EngineEvent {
    fn is_transition(&self) -> bool {
        !matches!(self, EngineEvent::HoverChanged(_))
    }
}

type HoverListener = Box<dyn FnMut(&HoverChange)>;
type TransitionListener = Box<dyn FnMut(&EngineEvent, &TransitionState)>;

/// Session state, owned by the [`Engine`] and lent to each subsystem.
pub struct EngineState {
    pub tour: Tour,
    pub config: EngineConfig,
    pub camera: PanoramaCamera,
    pub slots: SlotPair,
    pub history: HistoryStack,
    pub transition: TransitionController,
    pub hover: HoverTracker,
    pub input: InputDispatcher,
    pub hit_tester: Box<dyn HitTester>,
    pub frame: Frame,
}

impl EngineState {
    pub fn new(tour: Tour, config: EngineConfig) -> Self {
        let camera = PanoramaCamera::new(
            config.default_view,
            config.camera_limits(),
            config.viewport.width,
            config.viewport.height,
        );
        let hit_tester: Box<dyn HitTester> = match tour.style() {
            AuthoringStyle::Geometric => Box::new(GeometricHitTester),
            AuthoringStyle::Mask => Box::new(MaskHitTester {
                sphere_radius: config.panorama_radius,
                tolerance: config.color_tolerance,
            }),
        };
        Self {
            transition: TransitionController::new(config.fade_duration_s),
            input: InputDispatcher::new(config.click_drag_threshold_px),
            camera,
            slots: SlotPair::new(),
            history: HistoryStack::new(),
            hover: HoverTracker::new(),
            hit_tester,
            frame: Frame::first(),
            tour,
            config,
        }
    }

    /// Node currently shown at full opacity, or fading out.
    pub fn current_node(&self) -> Option<&PanoramaNode> {
        let id = self.slots.front()?.node();
        self.tour.graph().get(id.as_str()).ok()
    }

    /// Hotspot under a viewport pixel, resolved against the displayed node.
    pub fn pick(&self, px: Vec2) -> Option<HotspotRef> {
        let slot = self.slots.front()?;
        let ray = self.camera.ray_from_px(px);
        self.hit_tester.resolve(ray, slot)
    }
}

/// Navigation engine: one tour, one surface, ticked by the host.
///
/// Notes:
/// - At most one transition is in flight; requests made meanwhile are
///   dropped and reported as [`EngineEvent::TransitionIgnored`].
/// - Input is accepted at any time; camera drag and zoom are ignored while
///   a transition holds the interaction lock.
pub struct Engine<S: RenderSurface> {
    state: EngineState,
    cache: ResourceCache,
    surface: S,
    events: EventBus<EngineEvent>,
    hover_listeners: Vec<HoverListener>,
    transition_listeners: Vec<TransitionListener>,
}

impl<S: RenderSurface> Engine<S> {
    pub fn new(tour: Tour, config: EngineConfig, cache: ResourceCache, mut surface: S) -> Self {
        surface.resize(config.viewport.width, config.viewport.height);
        let event_log_capacity = config.event_log_capacity;
        Self {
            state: EngineState::new(tour, config),
            cache,
            surface,
            events: EventBus::bounded(event_log_capacity),
            hover_listeners: Vec::new(),
            transition_listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn camera(&self) -> &PanoramaCamera {
        &self.state.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn history(&self) -> &HistoryStack {
        &self.state.history
    }

    pub fn current_node(&self) -> Option<&PanoramaNode> {
        self.state.current_node()
    }

    pub fn transition_state(&self) -> TransitionState {
        self.state.transition.state()
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.transition.is_active()
    }

    pub fn hovered(&self) -> Option<&HotspotRef> {
        self.state.hover.current()
    }

    pub fn can_go_back(&self) -> bool {
        !self.state.history.is_empty()
    }

    pub fn events(&self) -> &[Event<EngineEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<EngineEvent>> {
        self.events.drain()
    }

    pub fn on_hotspot_hover(&mut self, listener: impl FnMut(&HoverChange) + 'static) {
        self.hover_listeners.push(Box::new(listener));
    }

    /// Called with every transition event and the state right after it.
    pub fn on_transition_state_change(
        &mut self,
        listener: impl FnMut(&EngineEvent, &TransitionState) + 'static,
    ) {
        self.transition_listeners.push(Box::new(listener));
    }

    /// Request every resource in the tour. Resolves once all have settled.
    pub fn preload(&self) -> BoxFuture<'static, PreloadReport> {
        self.cache.preload(self.state.tour.resource_urls())
    }

    /// Fade in the tour's initial node. Also retries a failed start.
    pub fn start(&mut self) -> bool {
        if self.state.slots.front().is_some() {
            return false;
        }
        let initial = self.state.tour.initial().clone();
        self.launch(initial, TransitionKind::Start)
    }

    /// Navigate to `target`.
    ///
    /// Returns `Ok(false)` when the request was dropped: a transition is in
    /// flight, or `target` is already displayed.
    pub fn begin_transition(&mut self, target: &str) -> Result<bool, UnknownNodeError> {
        let id = self.state.tour.graph().get(target)?.id.clone();
        Ok(self.launch(id, TransitionKind::Forward))
    }

    /// Return to the previously visited node. History is popped on commit.
    pub fn go_back(&mut self) -> bool {
        let Some(previous) = self.state.history.peek().cloned() else {
            return false;
        };
        self.launch(previous, TransitionKind::Back)
    }

    /// Return to the initial node and clear history on commit.
    pub fn go_home(&mut self) -> bool {
        let home = self.state.tour.initial().clone();
        self.launch(home, TransitionKind::Home)
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        let Some(intent) = self.state.input.dispatch(event) else {
            return;
        };
        let camera = &mut self.state.camera;
        match intent {
            Intent::LookStart(px) => camera.begin_drag(px),
            Intent::Look(px) => camera.drag_to(px),
            Intent::LookEnd => camera.end_drag(),
            Intent::Zoom(delta) => camera.zoom(delta),
            Intent::Resize { width, height } => {
                camera.set_viewport(width, height);
                self.surface.resize(width, height);
            }
            Intent::Hover(px) => {
                let resolved = self.state.pick(px);
                self.update_hover(resolved);
            }
            Intent::Click(px) => {
                let Some(hit) = self.state.pick(px) else {
                    return;
                };
                debug!(hotspot = %hit.key, target = %hit.target, "hotspot clicked");
                self.launch(hit.target, TransitionKind::Forward);
            }
        }
    }

    /// Advance one frame: camera easing, transition progress, then draw.
    pub fn tick(&mut self, dt_s: f64) {
        self.state.frame = self.state.frame.next(dt_s);
        let dt_s = self.state.frame.dt_s;
        self.state.camera.update(dt_s);

        if let Some(outcome) = self.state.transition.tick(dt_s, &mut self.state.slots) {
            self.finish(outcome);
        }

        let frame = Renderer::collect(
            &self.state.camera,
            &self.state.slots,
            self.state.config.render_options(),
        );
        self.surface.submit(frame);
    }

    fn launch(&mut self, to: NodeId, kind: TransitionKind) -> bool {
        if self.state.transition.is_active() {
            debug!(requested = %to, "transition in flight; request dropped");
            self.emit(EngineEvent::TransitionIgnored { requested: to });
            return false;
        }
        let from = self.state.slots.front().map(|s| s.node().clone());
        if from.as_ref() == Some(&to) {
            return false;
        }
        let Ok(node) = self.state.tour.graph().get(to.as_str()) else {
            return false;
        };

        let opts = StagingOptions {
            mask_overlay: self.state.config.mask_overlay,
        };
        let acquisition = acquire_slot(node, &self.cache, opts);
        if !self
            .state
            .transition
            .begin(from.clone(), to.clone(), kind, acquisition)
        {
            return false;
        }

        // Lock and reset: every node opens at the default framing.
        self.state.camera.set_interaction_enabled(false);
        self.state.camera.reset(self.state.config.default_view);
        self.update_hover(None);
        self.emit(EngineEvent::TransitionStarted { from, to, kind });
        true
    }

    fn finish(&mut self, outcome: TransitionOutcome) {
        self.state.camera.set_interaction_enabled(true);
        match outcome {
            TransitionOutcome::Committed { from, to, kind } => {
                let history = &mut self.state.history;
                match kind {
                    TransitionKind::Start => {}
                    TransitionKind::Forward => {
                        if let Some(from) = from.clone() {
                            history.push(from);
                        }
                    }
                    TransitionKind::Back => {
                        history.pop();
                    }
                    TransitionKind::Home => history.clear(),
                }
                info!(node = %to, history = history.len(), "now showing");
                // Hotspots of the outgoing node are gone.
                self.update_hover(None);
                self.emit(EngineEvent::TransitionCommitted { from, to, kind });
            }
            TransitionOutcome::Failed {
                from,
                to,
                kind,
                error,
            } => {
                self.emit(EngineEvent::TransitionFailed {
                    from,
                    to,
                    kind,
                    error,
                });
            }
        }
    }

    fn update_hover(&mut self, resolved: Option<HotspotRef>) {
        if let Some(change) = self.state.hover.update(resolved) {
            self.emit(EngineEvent::HoverChanged(change));
        }
    }

    fn emit(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::HoverChanged(change) => {
                for listener in &mut self.hover_listeners {
                    listener(change);
                }
            }
            e if e.is_transition() => {
                let state = self.state.transition.state();
                for listener in &mut self.transition_listeners {
                    listener(e, &state);
                }
            }
            _ => {}
        }
        self.events.emit(self.state.frame, event);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use std::sync::Arc;

    use super::{Engine, EngineEvent};
    use crate::config::EngineConfig;
    use crate::input::InputEvent;
    use crate::transition::TransitionState;
    use foundation::math::{SphericalCoord, Vec2, equirect_uv};
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use gpu::{RecordingSurface, RenderCommand};
    use parking_lot::Mutex;
    use scene::mask::pixel_for_uv;
    use streaming::{Image, MemoryLoader, ResourceCache, ResourceLoadError, ResourceLoader};
    use tokio::sync::oneshot;
    use tour::Tour;

    const DT: f64 = 1.0 / 60.0;

    const GEOMETRIC: &str = r#"{ "nodes": [
        { "id": "A", "image": "a.jpg", "hotspots": [{
            "id": "to-b", "target": "B", "label": "Hall",
            "position": { "lat_deg": 0, "lon_deg": 0, "radius": 400 },
            "visual": { "size": 40, "rotation_deg": 0, "aspect_ratio": 1 } }] },
        { "id": "B", "image": "b.jpg", "hotspots": [{
            "id": "to-c", "target": "C",
            "position": { "lat_deg": 0, "lon_deg": 0, "radius": 400 },
            "visual": { "size": 40, "rotation_deg": 0, "aspect_ratio": 1 } }] },
        { "id": "C", "image": "c.jpg" }
    ] }"#;

    fn pano() -> Image {
        Image::filled(4, 2, [90, 90, 90, 255])
    }

    fn memory_cache() -> ResourceCache {
        ResourceCache::new(Arc::new(
            MemoryLoader::new()
                .with_image("a.jpg", pano())
                .with_image("b.jpg", pano())
                .with_image("c.jpg", pano()),
        ))
    }

    fn engine(tour: &str, cache: ResourceCache) -> Engine<RecordingSurface> {
        let tour = Tour::from_json_str(tour).expect("tour");
        Engine::new(tour, EngineConfig::default(), cache, RecordingSurface::bounded(4))
    }

    fn run_until_idle(engine: &mut Engine<RecordingSurface>) {
        for _ in 0..600 {
            engine.tick(DT);
            if !engine.is_transitioning() {
                return;
            }
        }
        panic!("transition did not settle");
    }

    fn current(engine: &Engine<RecordingSurface>) -> String {
        engine
            .current_node()
            .map(|n| n.id.to_string())
            .unwrap_or_default()
    }

    fn started(tour: &str) -> Engine<RecordingSurface> {
        let mut e = engine(tour, memory_cache());
        assert!(e.start());
        run_until_idle(&mut e);
        e
    }

    fn centre() -> InputEvent {
        InputEvent::Click { x: 640.0, y: 360.0 }
    }

    #[test]
    fn clicking_a_hotspot_moves_forward_and_back_returns() {
        let mut e = started(GEOMETRIC);
        assert_eq!(current(&e), "A");
        assert!(!e.can_go_back());

        let hotspot = e.current_node().expect("node").hotspots.edges()[0].key.clone();
        assert_eq!(hotspot, "to-b");
        let target_px = e
            .camera()
            .screen_from_world(SphericalCoord::new(0.0, 0.0, 400.0).to_cartesian())
            .expect("on screen");
        e.handle_input(InputEvent::Click {
            x: target_px.x,
            y: target_px.y,
        });
        assert!(e.is_transitioning());
        run_until_idle(&mut e);

        assert_eq!(current(&e), "B");
        assert_eq!(e.history().peek().map(|n| n.as_str()), Some("A"));
        assert!(e.can_go_back());

        assert!(e.go_back());
        run_until_idle(&mut e);
        assert_eq!(current(&e), "A");
        assert!(e.history().is_empty());
        assert!(!e.can_go_back());
    }

    #[test]
    fn double_begin_commits_exactly_once() {
        let mut e = started(GEOMETRIC);
        e.drain_events();

        assert_eq!(e.begin_transition("B"), Ok(true));
        assert_eq!(e.begin_transition("C"), Ok(false));
        run_until_idle(&mut e);

        let committed: Vec<_> = e
            .events()
            .iter()
            .filter(|ev| matches!(ev.payload, EngineEvent::TransitionCommitted { .. }))
            .collect();
        assert_eq!(committed.len(), 1);
        assert_eq!(current(&e), "B");
        assert!(e.events().iter().any(|ev| matches!(
            &ev.payload,
            EngineEvent::TransitionIgnored { requested } if requested.as_str() == "C"
        )));
    }

    #[test]
    fn back_during_transition_is_dropped() {
        let mut e = started(GEOMETRIC);
        e.begin_transition("B").expect("known");
        run_until_idle(&mut e);
        e.begin_transition("C").expect("known");
        assert!(!e.go_back());
        run_until_idle(&mut e);
        assert_eq!(current(&e), "C");
        let history: Vec<&str> = e.history().iter().map(|n| n.as_str()).collect();
        assert_eq!(history, vec!["A", "B"]);
    }

    #[test]
    fn unknown_and_current_targets() {
        let mut e = started(GEOMETRIC);
        assert_eq!(e.begin_transition("Z").expect_err("unknown").node_id, "Z");
        assert_eq!(e.begin_transition("A"), Ok(false));
        assert!(!e.is_transitioning());
    }

    #[test]
    fn crossfade_opacities_are_complementary_and_exact_at_commit() {
        let mut e = started(GEOMETRIC);
        e.begin_transition("B").expect("known");
        e.tick(DT); // acquisition resolves, target staged at 0
        for _ in 0..10 {
            e.tick(DT);
        }
        let frame = e.surface().last_frame().expect("frame");
        let spheres: Vec<f64> = frame
            .commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::Sphere { opacity, .. } => Some(*opacity),
                _ => None,
            })
            .collect();
        assert_eq!(spheres.len(), 2);
        assert!((spheres[0] + spheres[1] - 1.0).abs() < 1e-12);
        assert!(spheres[1] > 0.0 && spheres[1] < 1.0);

        run_until_idle(&mut e);
        let frame = e.surface().last_frame().expect("frame");
        assert!(frame.commands.iter().all(|c| c.opacity() == 1.0));
    }

    #[test]
    fn transition_resets_camera_and_locks_interaction() {
        let mut e = started(GEOMETRIC);
        e.handle_input(InputEvent::PointerDown { x: 100.0, y: 100.0 });
        e.handle_input(InputEvent::PointerMove { x: 0.0, y: 100.0 });
        e.handle_input(InputEvent::PointerUp { x: 0.0, y: 100.0 });
        assert!((e.camera().view().lon_deg - 10.0).abs() < 1e-9);

        e.begin_transition("B").expect("known");
        assert_eq!(e.camera().view(), EngineConfig::default().default_view);
        assert!(!e.camera().interaction_enabled());

        e.handle_input(InputEvent::Wheel { delta_y: 300.0 });
        assert_eq!(e.camera().target_fov_deg(), 75.0);

        run_until_idle(&mut e);
        assert!(e.camera().interaction_enabled());
        e.handle_input(InputEvent::Wheel { delta_y: 100.0 });
        assert_eq!(e.camera().target_fov_deg(), 80.0);
    }

    #[test]
    fn hover_reports_enter_and_leave_once() {
        let mut e = started(GEOMETRIC);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        e.on_hotspot_hover(move |change| {
            sink.borrow_mut()
                .push(change.current.as_ref().map(|h| h.key.clone()));
        });

        for _ in 0..3 {
            e.handle_input(InputEvent::PointerMove { x: 640.0, y: 360.0 });
        }
        e.handle_input(InputEvent::PointerMove { x: 10.0, y: 10.0 });
        e.handle_input(InputEvent::PointerMove { x: 12.0, y: 10.0 });

        assert_eq!(*seen.borrow(), vec![Some("to-b".to_string()), None]);
    }

    #[test]
    fn commit_clears_hover_of_the_outgoing_node() {
        let mut e = started(GEOMETRIC);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        e.on_hotspot_hover(move |change| {
            sink.borrow_mut().push((
                change.previous.as_ref().map(|h| h.key.clone()),
                change.current.as_ref().map(|h| h.key.clone()),
            ));
        });

        e.begin_transition("B").expect("known");
        e.tick(DT);
        assert!(e.is_transitioning());
        // Hover still resolves against the outgoing node mid-fade.
        e.handle_input(InputEvent::PointerMove { x: 640.0, y: 360.0 });
        assert_eq!(e.hovered().map(|h| h.key.as_str()), Some("to-b"));

        run_until_idle(&mut e);
        assert_eq!(current(&e), "B");
        assert!(e.hovered().is_none());
        assert_eq!(
            seen.borrow().last(),
            Some(&(Some("to-b".to_string()), None))
        );
    }

    #[test]
    fn event_log_stays_within_capacity() {
        let mut e = started(GEOMETRIC);
        let capacity = EngineConfig::default().event_log_capacity;
        let calls = Rc::new(RefCell::new(0usize));
        let sink = calls.clone();
        e.on_hotspot_hover(move |_| *sink.borrow_mut() += 1);

        for _ in 0..5000 {
            e.handle_input(InputEvent::PointerMove { x: 640.0, y: 360.0 });
            e.handle_input(InputEvent::PointerMove { x: 10.0, y: 10.0 });
            e.tick(DT);
        }

        assert_eq!(*calls.borrow(), 10_000);
        assert_eq!(e.events().len(), capacity);
        assert!(matches!(
            e.events().last().map(|ev| &ev.payload),
            Some(EngineEvent::HoverChanged(change)) if change.current.is_none()
        ));
    }

    #[test]
    fn go_home_clears_history() {
        let mut e = started(GEOMETRIC);
        e.handle_input(centre());
        run_until_idle(&mut e);
        e.handle_input(centre());
        run_until_idle(&mut e);
        assert_eq!(current(&e), "C");
        assert_eq!(e.history().len(), 2);

        assert!(e.go_home());
        run_until_idle(&mut e);
        assert_eq!(current(&e), "A");
        assert!(e.history().is_empty());
        assert!(!e.go_home());
    }

    /// Loader that holds selected URLs in flight until released.
    #[derive(Default)]
    struct GatedLoader {
        images: BTreeMap<String, Image>,
        gates: Mutex<BTreeMap<String, oneshot::Sender<Result<Image, ResourceLoadError>>>>,
    }

    impl GatedLoader {
        fn release(&self, url: &str, result: Result<Image, ResourceLoadError>) {
            let tx = self.gates.lock().remove(url).expect("gated");
            let _ = tx.send(result);
        }
    }

    impl ResourceLoader for GatedLoader {
        fn load(&self, url: &str) -> BoxFuture<'static, Result<Image, ResourceLoadError>> {
            if let Some(img) = self.images.get(url) {
                return futures_util::future::ready(Ok(img.clone())).boxed();
            }
            let (tx, rx) = oneshot::channel();
            self.gates.lock().insert(url.to_string(), tx);
            let url = url.to_string();
            async move {
                rx.await
                    .unwrap_or_else(|_| Err(ResourceLoadError::new(url, "dropped")))
            }
            .boxed()
        }
    }

    #[test]
    fn failed_target_load_keeps_current_node() {
        let mut images = BTreeMap::new();
        images.insert("a.jpg".to_string(), pano());
        let loader = Arc::new(GatedLoader {
            images,
            ..GatedLoader::default()
        });
        let mut e = engine(GEOMETRIC, ResourceCache::new(loader.clone()));
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = states.clone();
        e.on_transition_state_change(move |event, state| {
            sink.borrow_mut().push((event.clone(), state.clone()));
        });
        e.start();
        run_until_idle(&mut e);

        e.begin_transition("B").expect("known");
        for _ in 0..30 {
            e.tick(DT);
        }
        assert!(e.is_transitioning());
        assert!(!e.camera().interaction_enabled());

        loader.release("b.jpg", Err(ResourceLoadError::new("b.jpg", "503")));
        e.tick(DT);

        assert!(!e.is_transitioning());
        assert!(e.camera().interaction_enabled());
        assert_eq!(current(&e), "A");
        assert!(!e.can_go_back());
        let last = states.borrow().last().cloned().expect("event");
        match last {
            (EngineEvent::TransitionFailed { to, error, .. }, TransitionState::Idle) => {
                assert_eq!(to.as_str(), "B");
                assert_eq!(error.url, "b.jpg");
            }
            other => panic!("unexpected: {other:?}"),
        }

        // Retrying is an explicit new request.
        assert!(e.begin_transition("B").expect("known"));
        loader.release("b.jpg", Ok(pano()));
        run_until_idle(&mut e);
        assert_eq!(current(&e), "B");
    }

    #[test]
    fn hotspots_appear_only_with_their_node() {
        let mut images = BTreeMap::new();
        images.insert("a.jpg".to_string(), pano());
        images.insert("b.jpg".to_string(), pano());
        let loader = Arc::new(GatedLoader {
            images,
            ..GatedLoader::default()
        });
        let tour = GEOMETRIC.replacen(
            "\"target\": \"C\",",
            "\"target\": \"C\", \"icon\": \"arrow.png\",",
            1,
        );
        let mut e = engine(&tour, ResourceCache::new(loader.clone()));
        e.start();
        run_until_idle(&mut e);
        e.begin_transition("B").expect("known");
        for _ in 0..5 {
            e.tick(DT);
        }
        // B's panorama is ready but its icon is not: nothing of B is drawn yet.
        let frame = e.surface().last_frame().expect("frame");
        assert_eq!(
            frame
                .commands
                .iter()
                .filter(|c| matches!(c, RenderCommand::Sphere { .. }))
                .count(),
            1
        );
        loader.release("arrow.png", Ok(pano()));
        e.tick(DT);
        e.tick(DT);
        let frame = e.surface().last_frame().expect("frame");
        assert_eq!(
            frame
                .commands
                .iter()
                .filter(|c| matches!(c, RenderCommand::Sphere { .. }))
                .count(),
            2
        );
        run_until_idle(&mut e);
        assert_eq!(current(&e), "B");
    }

    #[test]
    fn preload_settles_with_one_failure() {
        let cache = ResourceCache::new(Arc::new(
            MemoryLoader::new()
                .with_image("a.jpg", pano())
                .with_image("b.jpg", pano())
                .with_failure("c.jpg", "missing"),
        ));
        let e = engine(GEOMETRIC, cache);
        let report = e.preload().now_or_never().expect("settled");
        assert_eq!(report.ready.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, "c.jpg");
    }

    const MASK: &str = r#"{ "nodes": [
        { "id": "A", "image": "a.jpg", "mask": { "image": "a_mask.png", "regions": [
            { "color": [235, 0, 212], "target": "B", "label": "House 1" } ] } },
        { "id": "B", "image": "b.jpg" }
    ] }"#;

    #[test]
    fn mask_click_within_tolerance_navigates() {
        let mut cfg_engine = {
            let tour = Tour::from_json_str(MASK).expect("tour");
            let config = EngineConfig::default();
            let cam = scene::PanoramaCamera::new(
                config.default_view,
                config.camera_limits(),
                config.viewport.width,
                config.viewport.height,
            );

            // Paint the pixel seen through the viewport point (900, 200).
            let (w, h) = (256u32, 128u32);
            let mut mask = Image::filled(w, h, [0, 0, 0, 255]);
            let dir = cam.ray_from_px(Vec2::new(900.0, 200.0)).dir;
            let (x, y) = pixel_for_uv(equirect_uv(dir).expect("uv"), w, h);
            mask.set_rgba(x, y, [237, 1, 210, 255]);

            let cache = ResourceCache::new(Arc::new(
                MemoryLoader::new()
                    .with_image("a.jpg", pano())
                    .with_image("b.jpg", pano())
                    .with_image("a_mask.png", mask),
            ));
            Engine::new(tour, config, cache, RecordingSurface::bounded(2))
        };
        let e = &mut cfg_engine;
        e.start();
        run_until_idle(e);

        // Background pixel: nothing happens.
        e.handle_input(InputEvent::Click { x: 300.0, y: 500.0 });
        assert!(!e.is_transitioning());
        assert_eq!(current(e), "A");

        e.handle_input(InputEvent::Click { x: 900.0, y: 200.0 });
        assert!(e.is_transitioning());
        run_until_idle(e);
        assert_eq!(current(e), "B");
        assert_eq!(e.history().peek().map(|n| n.as_str()), Some("A"));
    }
}
