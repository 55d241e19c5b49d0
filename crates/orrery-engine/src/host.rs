//! Host platform abstraction.
//!
//! The session lifecycle consumes a handful of platform primitives: document
//! readiness, element layout boxes, the device pixel ratio, resize listeners,
//! per-refresh frame callbacks and GPU surface creation. They are gathered
//! behind the [`Host`] trait so the same session code runs under the winit
//! runtime ([`crate::runtime::WindowHost`]) and under a deterministic
//! in-memory host in tests.
//!
//! Driver contract: a host grants one [`FrameHandle`] per `request_frame`
//! call and later fires the session's `on_frame` once for each granted
//! handle, on the single event-processing thread. Resize events are
//! delivered only while a listener from `listen_resize` is registered.

use anyhow::Result;

use crate::surface::DrawSurface;

/// Host document readiness.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ReadyState {
    /// Layout is not available yet; sessions stay pending.
    Loading,
    /// The host has finished loading; initialization may proceed.
    Ready,
}

/// Opaque handle to a live layout element owned by the host.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ContainerId(pub u64);

/// Handle for a granted-but-not-yet-fired frame callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameHandle(pub u64);

/// Handle for a registered resize listener.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ListenerId(pub u64);

/// Size in whole pixels.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const ZERO: Extent = Extent::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero (not laid out yet, or collapsed).
    pub fn is_zero(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width-over-height ratio. Callers must reject zero extents first.
    pub fn aspect(self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Scales both dimensions by `ratio`, rounding to whole pixels.
    pub fn scaled(self, ratio: f64) -> Extent {
        Extent::new(
            (self.width as f64 * ratio).round() as u32,
            (self.height as f64 * ratio).round() as u32,
        )
    }
}

/// Parameters for creating a drawing surface bound to a new canvas element.
#[derive(Debug, Clone)]
pub struct SurfaceSpec {
    /// Drawing-buffer size in physical pixels (layout size scaled by the
    /// clamped device pixel ratio).
    pub buffer: Extent,
    /// Stretch the canvas's displayed size to fill its container, leaving
    /// the buffer size independent of it.
    pub fill_container: bool,
}

/// Platform primitives consumed by the session lifecycle.
///
/// All methods are called from the single event-processing thread that owns
/// the session; implementations do not need any synchronization.
pub trait Host {
    /// Resolves a selector to a live element, if one matches.
    fn resolve(&self, selector: &str) -> Option<ContainerId>;

    /// Whether `id` still refers to a live element.
    fn contains(&self, id: ContainerId) -> bool;

    /// Document readiness. Construction defers until this reports
    /// [`ReadyState::Ready`].
    fn ready_state(&self) -> ReadyState;

    /// Current layout box of an element, in logical pixels. May be zero if
    /// layout has not run yet.
    fn layout_size(&self, id: ContainerId) -> Extent;

    /// Ratio of physical to logical pixels.
    fn device_pixel_ratio(&self) -> f64;

    /// Registers interest in window resize events.
    fn listen_resize(&mut self) -> ListenerId;

    /// Removes a previously registered resize listener.
    fn unlisten_resize(&mut self, id: ListenerId);

    /// Requests one frame callback at the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a granted frame callback that has not fired yet.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Creates a GPU-backed drawing surface bound to a new canvas element
    /// appended as a child of `container`. The canvas stays a child of that
    /// container until the surface is disposed.
    fn create_surface(
        &mut self,
        container: ContainerId,
        spec: &SurfaceSpec,
    ) -> Result<Box<dyn DrawSurface>>;
}
