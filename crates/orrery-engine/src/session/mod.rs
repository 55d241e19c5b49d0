//! Rendering-session lifecycle manager.
//!
//! A [`Session`] brings one visualization from "configured" to "running":
//! it resolves the container, builds scene + camera + drawing surface in a
//! fixed order, registers the resize listener, fires the visualization's
//! ready hook once, then drives the frame loop until it is destroyed.
//!
//! Sessions are driven cooperatively by their host: the driver calls
//! [`Session::pump`] when document readiness changes, [`Session::on_frame`]
//! for every granted frame callback and [`Session::on_resize`] for resize
//! events. Every callback entry checks the monotonic `destroyed` flag, so a
//! callback queued before teardown can never observe a partially-torn-down
//! session.

use anyhow::Context;

use crate::camera::PerspectiveCamera;
use crate::config::{ContainerRef, SessionConfig};
use crate::controls::OrbitControls;
use crate::error::SessionError;
use crate::host::{ContainerId, Extent, FrameHandle, Host, ListenerId, ReadyState, SurfaceSpec};
use crate::scene::{add_axes_helper, Scene};
use crate::surface::DrawSurface;
use crate::time::FrameTime;

/// Device-pixel-ratio cap applied to the drawing buffer, bounding GPU
/// memory and bandwidth on high-density displays.
const MAX_PIXEL_RATIO: f64 = 2.0;

const AXES_HELPER_SIZE: f32 = 5.0;

/// Lifecycle phase of a session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// Constructed; waiting for the host document to finish loading.
    Pending,
    /// Scene/camera/surface exist; waiting for a non-zero container layout
    /// box, retried once per granted frame callback.
    Sizing,
    /// Ready hook has fired; frame loop not yet started.
    Ready,
    /// Frame loop running.
    Running,
    /// Torn down. Terminal.
    Destroyed,
}

/// Extension contract every concrete visualization supplies.
pub trait Visualization {
    /// Invoked exactly once, after scene/camera/surface/controls exist and
    /// before the frame loop starts. Populate scene content here; no frame
    /// has been drawn yet.
    fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()>;

    /// Invoked once per frame, before the controller update and the draw.
    /// Runs on the shared frame-loop thread of control and must not block.
    fn on_render(&mut self, ctx: &mut FrameCtx<'_>) -> anyhow::Result<()>;
}

/// Scene access handed to the one-time ready hook.
pub struct SceneCtx<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub controls: Option<&'a mut OrbitControls>,
}

/// Per-frame context handed to the render hook.
pub struct FrameCtx<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut PerspectiveCamera,
    pub controls: Option<&'a mut OrbitControls>,
    pub time: FrameTime,
}

/// Live object set owned by a running session. All-or-nothing: present
/// between successful init and teardown, absent otherwise.
struct LiveState {
    scene: Scene,
    camera: PerspectiveCamera,
    surface: Box<dyn DrawSurface>,
    controls: Option<OrbitControls>,
}

/// Rendering-session lifecycle manager. See the module docs.
pub struct Session {
    config: SessionConfig,
    container: ContainerId,
    phase: Phase,
    state: Option<LiveState>,
    viz: Box<dyn Visualization>,
    resize_listener: Option<ListenerId>,
    frame_handle: Option<FrameHandle>,
    destroyed: bool,
}

impl Session {
    /// Constructs a session and starts it if the host document is ready.
    ///
    /// The container is resolved synchronously before any GPU resource is
    /// touched. Construction either fully succeeds (possibly still waiting
    /// for document readiness or layout) or fails with everything already
    /// torn down — no half-alive session escapes.
    pub fn new(
        config: SessionConfig,
        viz: Box<dyn Visualization>,
        host: &mut dyn Host,
    ) -> Result<Self, SessionError> {
        let container = resolve_container(&config.container, host)?;
        let mut session = Self {
            config,
            container,
            phase: Phase::Pending,
            state: None,
            viz,
            resize_listener: None,
            frame_handle: None,
            destroyed: false,
        };
        session.pump(host)?;
        Ok(session)
    }

    /// Advances the initialization state machine.
    ///
    /// Drivers call this after construction and whenever the host's ready
    /// state changes; sizing retries advance through `on_frame` on their
    /// own. A no-op once running or destroyed.
    pub fn pump(&mut self, host: &mut dyn Host) -> Result<(), SessionError> {
        if self.destroyed {
            return Ok(());
        }
        let step = match self.phase {
            Phase::Pending => {
                if host.ready_state() == ReadyState::Loading {
                    return Ok(());
                }
                self.build(host)
            }
            Phase::Sizing => self.retry_sizing(host),
            _ => return Ok(()),
        };
        if let Err(err) = step {
            self.teardown(host);
            return Err(SessionError::Init(err));
        }
        Ok(())
    }

    /// One frame-loop tick; the driver calls this when a granted frame
    /// callback fires.
    ///
    /// Order within a tick is fixed: render hook, controller update, draw.
    /// The next frame is requested only once the tick has completed, so a
    /// failing hook (or draw) stops the loop without further scheduling.
    pub fn on_frame(&mut self, host: &mut dyn Host, time: FrameTime) -> Result<(), SessionError> {
        if self.destroyed {
            // Sole cancellation path besides explicit teardown: bail without
            // re-registering.
            return Ok(());
        }
        self.frame_handle = None;

        if self.phase == Phase::Sizing {
            return self.pump(host);
        }
        if self.phase != Phase::Running {
            return Ok(());
        }
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        {
            let mut ctx = FrameCtx {
                scene: &mut state.scene,
                camera: &mut state.camera,
                controls: state.controls.as_mut(),
                time,
            };
            self.viz.on_render(&mut ctx).map_err(SessionError::Render)?;
        }

        if let Some(controls) = state.controls.as_mut() {
            controls.update(time.dt, &mut state.camera);
        }

        state
            .surface
            .draw(&mut state.scene, &state.camera)
            .map_err(SessionError::Render)?;

        self.frame_handle = Some(host.request_frame());
        Ok(())
    }

    /// Resize adaptation: recomputes the camera projection and the drawing
    /// buffer from the container's current layout box. No-op when the
    /// session is destroyed, not yet running, or the layout box is empty.
    pub fn on_resize(&mut self, host: &mut dyn Host) {
        if self.destroyed || self.phase != Phase::Running {
            return;
        }
        let size = host.layout_size(self.container);
        if size.is_zero() {
            return;
        }
        let ratio = host.device_pixel_ratio().min(MAX_PIXEL_RATIO);
        let Some(state) = self.state.as_mut() else {
            return;
        };
        state.camera.set_aspect(size.aspect());
        state.surface.resize_buffer(size.scaled(ratio));
    }

    /// Manual resize resync, for callers that changed the container's
    /// layout outside the resize-event path.
    pub fn force_resize(&mut self, host: &mut dyn Host) {
        self.on_resize(host);
    }

    /// Idempotent teardown.
    ///
    /// Listeners and the frame loop are cancelled before any resource is
    /// freed, so no late callback can observe a partially-torn-down state.
    pub fn destroy(&mut self, host: &mut dyn Host) {
        if self.destroyed {
            return;
        }
        self.teardown(host);
    }

    /// True until the session has been destroyed.
    pub fn is_active(&self) -> bool {
        !self.destroyed
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── accessor layer ────────────────────────────────────────────────────

    pub fn scene(&self) -> Result<&Scene, SessionError> {
        self.state
            .as_ref()
            .map(|s| &s.scene)
            .ok_or(SessionError::NotInitialized("scene"))
    }

    pub fn scene_mut(&mut self) -> Result<&mut Scene, SessionError> {
        self.state
            .as_mut()
            .map(|s| &mut s.scene)
            .ok_or(SessionError::NotInitialized("scene"))
    }

    pub fn camera(&self) -> Result<&PerspectiveCamera, SessionError> {
        self.state
            .as_ref()
            .map(|s| &s.camera)
            .ok_or(SessionError::NotInitialized("camera"))
    }

    pub fn camera_mut(&mut self) -> Result<&mut PerspectiveCamera, SessionError> {
        self.state
            .as_mut()
            .map(|s| &mut s.camera)
            .ok_or(SessionError::NotInitialized("camera"))
    }

    pub fn surface(&self) -> Result<&dyn DrawSurface, SessionError> {
        self.state
            .as_ref()
            .map(|s| s.surface.as_ref())
            .ok_or(SessionError::NotInitialized("drawing surface"))
    }

    pub fn surface_mut(&mut self) -> Result<&mut dyn DrawSurface, SessionError> {
        match self.state.as_mut() {
            Some(s) => Ok(s.surface.as_mut()),
            None => Err(SessionError::NotInitialized("drawing surface")),
        }
    }

    /// The interactive camera controller. `None` when controls are
    /// disabled by configuration (a valid outcome, not an error) or while
    /// no live state exists.
    pub fn controls(&self) -> Option<&OrbitControls> {
        self.state.as_ref().and_then(|s| s.controls.as_ref())
    }

    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.state.as_mut().and_then(|s| s.controls.as_mut())
    }

    // ── construction internals ────────────────────────────────────────────

    /// Builds scene, camera and drawing surface, then finishes startup or
    /// parks in [`Phase::Sizing`] when the container has no layout yet.
    fn build(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        let mut scene = Scene::new();
        scene.set_background(self.config.background);

        let effective = self.effective_size(host);
        let camera = PerspectiveCamera::new(if effective.is_zero() {
            1.0
        } else {
            effective.aspect()
        });

        let ratio = host.device_pixel_ratio().min(MAX_PIXEL_RATIO);
        let spec = SurfaceSpec {
            buffer: effective.scaled(ratio),
            fill_container: true,
        };
        let surface = host
            .create_surface(self.container, &spec)
            .context("failed to create drawing surface")?;

        self.state = Some(LiveState {
            scene,
            camera,
            surface,
            controls: None,
        });

        if effective.is_zero() {
            // Inserted but not laid out yet; retry on the next refresh.
            self.phase = Phase::Sizing;
            self.frame_handle = Some(host.request_frame());
            return Ok(());
        }
        self.finish_startup(host)
    }

    /// Sizing retry: waits for a non-zero layout box, then applies the real
    /// size and finishes startup.
    fn retry_sizing(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        let effective = self.effective_size(host);
        if effective.is_zero() {
            self.frame_handle = Some(host.request_frame());
            return Ok(());
        }
        let ratio = host.device_pixel_ratio().min(MAX_PIXEL_RATIO);
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };
        state.camera.set_aspect(effective.aspect());
        state.surface.resize_buffer(effective.scaled(ratio));
        self.finish_startup(host)
    }

    /// Helpers, controls, resize listener, ready hook, loop start.
    fn finish_startup(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        let Some(state) = self.state.as_mut() else {
            return Ok(());
        };

        if self.config.axes_helper {
            let root = state.scene.root();
            add_axes_helper(&mut state.scene, root, AXES_HELPER_SIZE);
        }
        if self.config.camera_controls {
            state.controls = Some(OrbitControls::new(&state.camera));
        }

        self.resize_listener = Some(host.listen_resize());

        {
            let mut ctx = SceneCtx {
                scene: &mut state.scene,
                camera: &mut state.camera,
                controls: state.controls.as_mut(),
            };
            self.viz.on_ready(&mut ctx).context("ready hook failed")?;
        }
        self.phase = Phase::Ready;

        self.frame_handle = Some(host.request_frame());
        self.phase = Phase::Running;
        log::debug!(
            "session running ({}x{} buffer)",
            state.surface.buffer_size().width,
            state.surface.buffer_size().height,
        );
        Ok(())
    }

    /// Effective drawing size: explicit configuration, else the container's
    /// live layout box.
    fn effective_size(&self, host: &dyn Host) -> Extent {
        let layout = host.layout_size(self.container);
        Extent::new(
            self.config.width.unwrap_or(layout.width),
            self.config.height.unwrap_or(layout.height),
        )
    }

    /// Ordered teardown. Used both by `destroy()` and by failed
    /// construction.
    fn teardown(&mut self, host: &mut dyn Host) {
        if let Some(listener) = self.resize_listener.take() {
            host.unlisten_resize(listener);
        }
        if let Some(handle) = self.frame_handle.take() {
            host.cancel_frame(handle);
        }
        if let Some(mut state) = self.state.take() {
            state.controls = None;
            state.surface.dispose();
            state.scene.dispose_content();
        }
        self.phase = Phase::Destroyed;
        self.destroyed = true;
    }
}

fn resolve_container(
    container: &ContainerRef,
    host: &dyn Host,
) -> Result<ContainerId, SessionError> {
    match container {
        ContainerRef::Selector(selector) => host
            .resolve(selector)
            .ok_or_else(|| SessionError::ContainerNotFound(selector.clone())),
        ContainerRef::Element(id) => {
            if host.contains(*id) {
                Ok(*id)
            } else {
                Err(SessionError::ContainerNotFound(format!("element #{}", id.0)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::*;
    use crate::scene::{Color, Geometry, Material, Node};

    const DT: f32 = 1.0 / 60.0;

    // ── deterministic in-memory host ──────────────────────────────────────

    #[derive(Default)]
    struct SurfaceLog {
        draws: u64,
        resizes: Vec<Extent>,
        disposals: u32,
    }

    struct StubSurface {
        buffer: Extent,
        canvas_children: Rc<Cell<u32>>,
        log: Rc<RefCell<SurfaceLog>>,
        disposed: bool,
    }

    impl DrawSurface for StubSurface {
        fn buffer_size(&self) -> Extent {
            self.buffer
        }

        fn resize_buffer(&mut self, size: Extent) {
            self.buffer = size;
            self.log.borrow_mut().resizes.push(size);
        }

        fn draw(&mut self, _scene: &mut Scene, _camera: &PerspectiveCamera) -> anyhow::Result<()> {
            self.log.borrow_mut().draws += 1;
            Ok(())
        }

        fn dispose(&mut self) {
            if self.disposed {
                return;
            }
            self.disposed = true;
            self.canvas_children.set(self.canvas_children.get() - 1);
            self.log.borrow_mut().disposals += 1;
        }
    }

    struct TestHost {
        ready: ReadyState,
        dpr: f64,
        selectors: HashMap<&'static str, ContainerId>,
        sizes: HashMap<ContainerId, Extent>,
        canvas_children: HashMap<ContainerId, Rc<Cell<u32>>>,
        listeners: Vec<ListenerId>,
        pending: Vec<FrameHandle>,
        next_id: u64,
        frames_fired: u64,
        log: Rc<RefCell<SurfaceLog>>,
    }

    const STAGE: &str = "#stage";

    impl TestHost {
        fn new() -> Self {
            Self::with_size(Extent::new(800, 600))
        }

        fn with_size(size: Extent) -> Self {
            let stage = ContainerId(1);
            Self {
                ready: ReadyState::Ready,
                dpr: 1.0,
                selectors: HashMap::from([(STAGE, stage)]),
                sizes: HashMap::from([(stage, size)]),
                canvas_children: HashMap::from([(stage, Rc::new(Cell::new(0)))]),
                listeners: Vec::new(),
                pending: Vec::new(),
                next_id: 10,
                frames_fired: 0,
                log: Rc::new(RefCell::new(SurfaceLog::default())),
            }
        }

        fn stage(&self) -> ContainerId {
            self.selectors[STAGE]
        }

        fn set_stage_size(&mut self, width: u32, height: u32) {
            let stage = self.stage();
            self.sizes.insert(stage, Extent::new(width, height));
        }

        fn stage_canvas_count(&self) -> u32 {
            self.canvas_children[&self.stage()].get()
        }

        /// Fires every pending frame callback once, in grant order.
        fn fire_frames(&mut self, session: &mut Session) -> Result<(), SessionError> {
            let handles = std::mem::take(&mut self.pending);
            for _ in handles {
                let index = self.frames_fired;
                self.frames_fired += 1;
                session.on_frame(self, FrameTime::fixed(DT, index))?;
            }
            Ok(())
        }
    }

    impl Host for TestHost {
        fn resolve(&self, selector: &str) -> Option<ContainerId> {
            self.selectors.get(selector).copied()
        }

        fn contains(&self, id: ContainerId) -> bool {
            self.sizes.contains_key(&id)
        }

        fn ready_state(&self) -> ReadyState {
            self.ready
        }

        fn layout_size(&self, id: ContainerId) -> Extent {
            self.sizes.get(&id).copied().unwrap_or(Extent::ZERO)
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.dpr
        }

        fn listen_resize(&mut self) -> ListenerId {
            self.next_id += 1;
            let id = ListenerId(self.next_id);
            self.listeners.push(id);
            id
        }

        fn unlisten_resize(&mut self, id: ListenerId) {
            self.listeners.retain(|l| *l != id);
        }

        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            let handle = FrameHandle(self.next_id);
            self.pending.push(handle);
            handle
        }

        fn cancel_frame(&mut self, handle: FrameHandle) {
            self.pending.retain(|h| *h != handle);
        }

        fn create_surface(
            &mut self,
            container: ContainerId,
            spec: &SurfaceSpec,
        ) -> anyhow::Result<Box<dyn DrawSurface>> {
            let children = self.canvas_children[&container].clone();
            children.set(children.get() + 1);
            Ok(Box::new(StubSurface {
                buffer: spec.buffer,
                canvas_children: children,
                log: self.log.clone(),
                disposed: false,
            }))
        }
    }

    // ── recording visualization stub ──────────────────────────────────────

    #[derive(Default)]
    struct Probe {
        ready_calls: u32,
        render_calls: u32,
    }

    struct StubViz {
        probe: Rc<RefCell<Probe>>,
        fail_ready: bool,
        fail_on_render_call: Option<u32>,
    }

    impl StubViz {
        fn new(probe: &Rc<RefCell<Probe>>) -> Box<Self> {
            Box::new(Self {
                probe: probe.clone(),
                fail_ready: false,
                fail_on_render_call: None,
            })
        }
    }

    impl Visualization for StubViz {
        fn on_ready(&mut self, _ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
            self.probe.borrow_mut().ready_calls += 1;
            if self.fail_ready {
                anyhow::bail!("ready hook exploded");
            }
            Ok(())
        }

        fn on_render(&mut self, _ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
            let calls = {
                let mut probe = self.probe.borrow_mut();
                probe.render_calls += 1;
                probe.render_calls
            };
            if self.fail_on_render_call == Some(calls) {
                anyhow::bail!("render hook exploded on call {calls}");
            }
            Ok(())
        }
    }

    fn new_session(host: &mut TestHost, config: SessionConfig) -> (Session, Rc<RefCell<Probe>>) {
        let probe = Rc::new(RefCell::new(Probe::default()));
        let session = Session::new(config, StubViz::new(&probe), host).expect("session starts");
        (session, probe)
    }

    // ── lifecycle properties ──────────────────────────────────────────────

    #[test]
    fn exactly_one_canvas_while_alive_none_after_destroy() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));
        assert_eq!(host.stage_canvas_count(), 1);

        session.destroy(&mut host);
        assert_eq!(host.stage_canvas_count(), 0);
    }

    #[test]
    fn destroy_twice_is_a_noop() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));

        session.destroy(&mut host);
        let disposals = host.log.borrow().disposals;
        session.destroy(&mut host);

        assert_eq!(host.log.borrow().disposals, disposals);
        assert!(!session.is_active());
        assert_eq!(host.stage_canvas_count(), 0);
    }

    #[test]
    fn accessors_fail_before_init_and_after_destroy() {
        let mut host = TestHost::new();
        host.ready = ReadyState::Loading;
        let (mut session, probe) = new_session(&mut host, SessionConfig::new(STAGE));

        assert_eq!(session.phase(), Phase::Pending);
        assert_eq!(probe.borrow().ready_calls, 0);
        assert!(matches!(session.scene(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(session.camera(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(session.surface(), Err(SessionError::NotInitialized(_))));

        host.ready = ReadyState::Ready;
        session.pump(&mut host).unwrap();
        assert_eq!(session.phase(), Phase::Running);
        assert!(session.scene().is_ok());
        assert_eq!(probe.borrow().ready_calls, 1);

        session.destroy(&mut host);
        assert!(matches!(session.scene(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(session.camera(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(session.surface(), Err(SessionError::NotInitialized(_))));
    }

    #[test]
    fn mutable_accessors_follow_the_same_window() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));

        session.scene_mut().unwrap();
        session.camera_mut().unwrap();
        let surface = session.surface_mut().unwrap();
        surface.resize_buffer(Extent::new(640, 480));
        assert_eq!(session.surface().unwrap().buffer_size(), Extent::new(640, 480));

        session.destroy(&mut host);
        assert!(matches!(session.scene_mut(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(session.camera_mut(), Err(SessionError::NotInitialized(_))));
        assert!(matches!(
            session.surface_mut(),
            Err(SessionError::NotInitialized(_))
        ));
    }

    #[test]
    fn resize_after_destroy_mutates_nothing() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));
        session.destroy(&mut host);
        assert!(host.listeners.is_empty());

        let resizes = host.log.borrow().resizes.len();
        host.set_stage_size(1024, 768);
        session.on_resize(&mut host);
        assert_eq!(host.log.borrow().resizes.len(), resizes);
    }

    #[test]
    fn aspect_tracks_layout_exactly() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));

        host.set_stage_size(1024, 512);
        session.on_resize(&mut host);
        assert!((session.camera().unwrap().aspect() - 2.0).abs() < 1e-6);

        host.set_stage_size(333, 777);
        session.force_resize(&mut host);
        let expected = 333.0 / 777.0;
        assert!((session.camera().unwrap().aspect() - expected).abs() < 1e-6);
    }

    #[test]
    fn bare_session_has_no_helper_and_no_controls() {
        // Scenario: axes helper and camera controls disabled on a laid-out
        // 800x600 container.
        let mut host = TestHost::new();
        let config = SessionConfig::new(STAGE)
            .without_axes_helper()
            .without_camera_controls();
        let (session, _) = new_session(&mut host, config);

        assert_eq!(session.phase(), Phase::Running);
        assert!(session.controls().is_none());
        let scene = session.scene().unwrap();
        assert!(scene.children(scene.root()).is_empty());
        assert_eq!(session.surface().unwrap().buffer_size(), Extent::new(800, 600));
    }

    #[test]
    fn default_session_gets_helper_and_controls() {
        let mut host = TestHost::new();
        let (session, _) = new_session(&mut host, SessionConfig::new(STAGE));
        assert!(session.controls().is_some());
        let scene = session.scene().unwrap();
        assert_eq!(scene.children(scene.root()).len(), 1);
    }

    #[test]
    fn unresolvable_selector_fails_before_any_canvas_exists() {
        let mut host = TestHost::new();
        let probe = Rc::new(RefCell::new(Probe::default()));
        let result = Session::new(
            SessionConfig::new("#missing"),
            StubViz::new(&probe),
            &mut host,
        );
        assert!(matches!(result, Err(SessionError::ContainerNotFound(_))));
        assert_eq!(host.stage_canvas_count(), 0);
    }

    #[test]
    fn stale_element_handle_is_rejected() {
        let mut host = TestHost::new();
        let probe = Rc::new(RefCell::new(Probe::default()));
        let result = Session::new(
            SessionConfig::new(ContainerId(999)),
            StubViz::new(&probe),
            &mut host,
        );
        assert!(matches!(result, Err(SessionError::ContainerNotFound(_))));
    }

    #[test]
    fn zero_sized_container_retries_until_laid_out() {
        // Scenario: container starts 0x0 and is laid out to 400x300 later.
        let mut host = TestHost::with_size(Extent::ZERO);
        let (mut session, probe) = new_session(&mut host, SessionConfig::new(STAGE));

        assert_eq!(session.phase(), Phase::Sizing);
        assert_eq!(host.stage_canvas_count(), 1);
        assert_eq!(probe.borrow().ready_calls, 0);

        // Still zero: another retry tick, no startup.
        host.fire_frames(&mut session).unwrap();
        assert_eq!(session.phase(), Phase::Sizing);

        host.set_stage_size(400, 300);
        host.fire_frames(&mut session).unwrap();
        assert_eq!(session.phase(), Phase::Running);
        assert_eq!(probe.borrow().ready_calls, 1);
        assert_eq!(session.surface().unwrap().buffer_size(), Extent::new(400, 300));
        assert!((session.camera().unwrap().aspect() - 400.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn destroy_with_pending_frame_leaves_late_callback_inert() {
        // Scenario: destroy() lands while a frame callback is pending.
        let mut host = TestHost::new();
        let (mut session, probe) = new_session(&mut host, SessionConfig::new(STAGE));
        host.fire_frames(&mut session).unwrap();
        assert_eq!(host.log.borrow().draws, 1);
        assert!(!host.pending.is_empty());

        session.destroy(&mut host);
        // The pending handle was cancelled; simulate a stale callback that
        // slipped through anyway.
        session
            .on_frame(&mut host, FrameTime::fixed(DT, 99))
            .unwrap();

        assert!(host.pending.is_empty());
        assert_eq!(host.log.borrow().draws, 1);
        assert_eq!(probe.borrow().render_calls, 1);
    }

    #[test]
    fn failing_render_hook_stops_scheduling() {
        // Scenario: render hook raises on its third call.
        let mut host = TestHost::new();
        let probe = Rc::new(RefCell::new(Probe::default()));
        let mut viz = StubViz::new(&probe);
        viz.fail_on_render_call = Some(3);
        let mut session = Session::new(SessionConfig::new(STAGE), viz, &mut host).unwrap();

        host.fire_frames(&mut session).unwrap();
        host.fire_frames(&mut session).unwrap();
        assert_eq!(host.log.borrow().draws, 2);

        let result = host.fire_frames(&mut session);
        assert!(matches!(result, Err(SessionError::Render(_))));
        assert_eq!(host.log.borrow().draws, 2);
        assert!(host.pending.is_empty(), "no further tick was scheduled");
        // Policy: the failed session is halted but not destroyed.
        assert!(session.is_active());
    }

    #[test]
    fn render_hook_runs_before_controller_and_draw_each_tick() {
        let mut host = TestHost::new();
        let (mut session, probe) = new_session(&mut host, SessionConfig::new(STAGE));

        for tick in 1..=5u64 {
            host.fire_frames(&mut session).unwrap();
            assert_eq!(probe.borrow().render_calls, tick as u32);
            assert_eq!(host.log.borrow().draws, tick);
        }
    }

    #[test]
    fn pixel_ratio_is_clamped_to_two() {
        let mut host = TestHost::new();
        host.dpr = 3.0;
        let (session, _) = new_session(&mut host, SessionConfig::new(STAGE));
        assert_eq!(
            session.surface().unwrap().buffer_size(),
            Extent::new(1600, 1200)
        );
    }

    #[test]
    fn explicit_size_overrides_layout() {
        let mut host = TestHost::new();
        let config = SessionConfig::new(STAGE).with_size(320, 240);
        let (session, _) = new_session(&mut host, config);
        assert_eq!(session.surface().unwrap().buffer_size(), Extent::new(320, 240));
        assert!((session.camera().unwrap().aspect() - 320.0 / 240.0).abs() < 1e-6);
    }

    #[test]
    fn failed_ready_hook_tears_everything_down() {
        let mut host = TestHost::new();
        let probe = Rc::new(RefCell::new(Probe::default()));
        let mut viz = StubViz::new(&probe);
        viz.fail_ready = true;

        let result = Session::new(SessionConfig::new(STAGE), viz, &mut host);
        assert!(matches!(result, Err(SessionError::Init(_))));
        assert_eq!(host.stage_canvas_count(), 0);
        assert_eq!(host.log.borrow().disposals, 1);
        assert!(host.listeners.is_empty());
        assert!(host.pending.is_empty());
    }

    #[test]
    fn destroy_disposes_scene_content_added_by_hooks() {
        struct Populating;
        impl Visualization for Populating {
            fn on_ready(&mut self, ctx: &mut SceneCtx<'_>) -> anyhow::Result<()> {
                ctx.scene.add_to_root(Node::mesh(
                    Geometry::cuboid(1.0, 1.0, 1.0),
                    vec![
                        Material::lambert(Color::WHITE),
                        Material::lambert(Color::BLACK),
                    ],
                ));
                Ok(())
            }
            fn on_render(&mut self, _ctx: &mut FrameCtx<'_>) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let mut host = TestHost::new();
        let mut session =
            Session::new(SessionConfig::new(STAGE), Box::new(Populating), &mut host).unwrap();
        host.fire_frames(&mut session).unwrap();
        session.destroy(&mut host);

        // The surface (and the canvas with it) is gone; the content walk ran
        // before references were dropped.
        assert_eq!(host.stage_canvas_count(), 0);
        assert_eq!(host.log.borrow().disposals, 1);
        assert_eq!(session.phase(), Phase::Destroyed);
    }

    #[test]
    fn controller_damping_consumes_dt() {
        let mut host = TestHost::new();
        let (mut session, _) = new_session(&mut host, SessionConfig::new(STAGE));

        session.controls_mut().unwrap().rotate(0.4, 0.0);
        let before = session.camera().unwrap().position();
        host.fire_frames(&mut session).unwrap();
        let after = session.camera().unwrap().position();
        assert!(before.distance(after) > 1e-4);
    }
}
