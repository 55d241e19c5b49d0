//! Winit runtime.
//!
//! Owns the window and the event loop, exposes the window to the session as
//! a [`Host`] implementation, and translates window events into session
//! lifecycle calls: frame callbacks, resize adaptation and teardown.
//! Pointer and wheel input is routed into the session's orbit controller.

use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::config::SessionConfig;
use crate::device::WgpuSurface;
use crate::host::{ContainerId, Extent, FrameHandle, Host, ListenerId, ReadyState, SurfaceSpec};
use crate::session::{Session, Visualization};
use crate::surface::DrawSurface;
use crate::time::FrameClock;

/// Selector resolving to the runtime's single window surface.
pub const WINDOW_SELECTOR: &str = "main";

const WINDOW_CONTAINER: ContainerId = ContainerId(1);

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "orrery".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// [`Host`] backed by a winit window.
///
/// The whole window acts as the one container, resolvable through
/// [`WINDOW_SELECTOR`]. Frame requests map onto `request_redraw`; granted
/// handles are drained when `RedrawRequested` arrives.
pub struct WindowHost {
    window: Arc<Window>,
    listeners: Vec<ListenerId>,
    pending: Vec<FrameHandle>,
    next_id: u64,
}

impl WindowHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            listeners: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
        }
    }

    fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    fn has_pending_frames(&self) -> bool {
        !self.pending.is_empty()
    }

    fn take_pending(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }
}

impl Host for WindowHost {
    fn resolve(&self, selector: &str) -> Option<ContainerId> {
        (selector == WINDOW_SELECTOR).then_some(WINDOW_CONTAINER)
    }

    fn contains(&self, id: ContainerId) -> bool {
        id == WINDOW_CONTAINER
    }

    fn ready_state(&self) -> ReadyState {
        // The window exists by the time the host does.
        ReadyState::Ready
    }

    fn layout_size(&self, _id: ContainerId) -> Extent {
        let size: LogicalSize<f64> = self
            .window
            .inner_size()
            .to_logical(self.window.scale_factor());
        Extent::new(size.width.round() as u32, size.height.round() as u32)
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
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
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.pending.retain(|h| *h != handle);
    }

    fn create_surface(
        &mut self,
        _container: ContainerId,
        spec: &SurfaceSpec,
    ) -> Result<Box<dyn DrawSurface>> {
        let surface = pollster::block_on(WgpuSurface::new(self.window.clone(), spec.buffer))?;
        Ok(Box::new(surface))
    }
}

/// Entry point for running one visualization in a window.
pub struct Runtime;

impl Runtime {
    pub fn run(
        runtime_config: RuntimeConfig,
        session_config: SessionConfig,
        viz: Box<dyn Visualization>,
    ) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut driver = Driver {
            runtime_config,
            session_config: Some(session_config),
            viz: Some(viz),
            host: None,
            session: None,
            clock: FrameClock::new(),
            pointer: PointerState::default(),
            exit_requested: false,
        };
        event_loop
            .run_app(&mut driver)
            .context("winit event loop terminated with error")?;
        Ok(())
    }
}

#[derive(Default)]
struct PointerState {
    position: Option<(f64, f64)>,
    left_down: bool,
    right_down: bool,
}

struct Driver {
    runtime_config: RuntimeConfig,
    session_config: Option<SessionConfig>,
    viz: Option<Box<dyn Visualization>>,

    host: Option<WindowHost>,
    session: Option<Session>,
    clock: FrameClock,
    pointer: PointerState,
    exit_requested: bool,
}

impl Driver {
    fn shut_down(&mut self, event_loop: &ActiveEventLoop) {
        if let (Some(session), Some(host)) = (self.session.as_mut(), self.host.as_mut()) {
            session.destroy(host);
        }
        self.exit_requested = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for Driver {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            self.clock.reset();
            return;
        }
        let (Some(config), Some(viz)) = (self.session_config.take(), self.viz.take()) else {
            return;
        };

        let attrs = Window::default_attributes()
            .with_title(self.runtime_config.title.clone())
            .with_inner_size(self.runtime_config.initial_size);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e:#}");
                self.shut_down(event_loop);
                return;
            }
        };

        let mut host = WindowHost::new(window);
        match Session::new(config, viz, &mut host) {
            Ok(session) => {
                self.session = Some(session);
                self.host = Some(host);
                self.clock.reset();
            }
            Err(e) => {
                log::error!("failed to start session: {e:#}");
                self.shut_down(event_loop);
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        event_loop.set_control_flow(ControlFlow::Wait);
        if let Some(host) = self.host.as_ref() {
            if host.has_pending_frames() {
                host.window.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        let (Some(session), Some(host)) = (self.session.as_mut(), self.host.as_mut()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.shut_down(event_loop);
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                if host.has_listeners() {
                    session.on_resize(host);
                }
            }

            WindowEvent::RedrawRequested => {
                let fired = host.take_pending();
                if fired.is_empty() {
                    return;
                }
                let time = self.clock.tick();
                for _ in fired {
                    if let Err(e) = session.on_frame(host, time) {
                        log::error!("session failed: {e:#}");
                        self.shut_down(event_loop);
                        return;
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x, position.y);
                if let Some((px, py)) = self.pointer.position {
                    let (dx, dy) = ((x - px) as f32, (y - py) as f32);
                    if let Some(controls) = session.controls_mut() {
                        if self.pointer.left_down {
                            controls.rotate(dx * 0.005, dy * 0.005);
                        } else if self.pointer.right_down {
                            controls.pan(dx, dy);
                        }
                    }
                }
                self.pointer.position = Some((x, y));
            }

            WindowEvent::CursorLeft { .. } => {
                self.pointer.position = None;
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let down = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.pointer.left_down = down,
                    MouseButton::Right | MouseButton::Middle => self.pointer.right_down = down,
                    _ => {}
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
                };
                if let Some(controls) = session.controls_mut() {
                    controls.zoom(amount);
                }
            }

            _ => {}
        }
    }
}
